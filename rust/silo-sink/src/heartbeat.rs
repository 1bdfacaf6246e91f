//! Background liveness heartbeat for the stage-out copy.

use std::{
    sync::{
        Arc,
        mpsc::{self, RecvTimeoutError},
    },
    thread,
    time::Duration,
};

use silo_common::{Progress, Result, error::Error};

/// Invokes the liveness callback immediately and then once per interval on a
/// background thread, until stopped.
///
/// The heartbeat covers phases that perform no record-level work (the bulk
/// copy of the finished index), during which the job framework would
/// otherwise consider the task hung. Cancellation is a one-shot signal;
/// [`stop`](Heartbeat::stop) sends it and joins the thread, so no callback
/// fires after `stop` returns. Dropping a running heartbeat stops it too.
pub struct Heartbeat {
    stop_tx: mpsc::Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Heartbeat {
    /// Spawns the heartbeat thread.
    pub fn start(progress: Arc<dyn Progress>, interval: Duration) -> Result<Heartbeat> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("silo-sink-heartbeat".to_string())
            .spawn(move || {
                loop {
                    progress.keep_alive();
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        // Stop signal, or the owner vanished.
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|e| Error::io("spawn heartbeat thread", e))?;
        Ok(Heartbeat {
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Signals the heartbeat to stop and waits for the thread to exit.
    ///
    /// After `stop` returns, the liveness callback is guaranteed not to be
    /// invoked again by this heartbeat.
    pub fn stop(mut self) {
        self.signal_and_join();
    }

    fn signal_and_join(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.signal_and_join();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    };

    use silo_common::Progress;

    use super::Heartbeat;

    struct CountingProgress(AtomicUsize);

    impl Progress for CountingProgress {
        fn keep_alive(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_heartbeat_fires_and_stops() {
        let progress = Arc::new(CountingProgress(AtomicUsize::new(0)));
        let heartbeat =
            Heartbeat::start(progress.clone(), Duration::from_millis(20)).unwrap();
        thread::sleep(Duration::from_millis(110));
        heartbeat.stop();

        let after_stop = progress.0.load(Ordering::SeqCst);
        // Fired immediately plus at least a few intervals.
        assert!(after_stop >= 3, "only {after_stop} beats observed");

        thread::sleep(Duration::from_millis(80));
        assert_eq!(progress.0.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_heartbeat_stops_on_drop() {
        let progress = Arc::new(CountingProgress(AtomicUsize::new(0)));
        {
            let _heartbeat =
                Heartbeat::start(progress.clone(), Duration::from_millis(20)).unwrap();
            thread::sleep(Duration::from_millis(30));
        }
        let after_drop = progress.0.load(Ordering::SeqCst);
        assert!(after_drop >= 1);
        thread::sleep(Duration::from_millis(60));
        assert_eq!(progress.0.load(Ordering::SeqCst), after_drop);
    }
}
