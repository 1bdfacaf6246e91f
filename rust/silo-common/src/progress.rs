//! Liveness callback contract between the job framework and the output stage.

/// A hook through which a long-running task tells the surrounding job
/// framework that it is still making progress, even when no record-level
/// work item is being processed.
///
/// Implementations must tolerate concurrent invocation: the staged output
/// writer calls `keep_alive` both from the record-write path and from a
/// background heartbeat thread during the stage-out copy.
pub trait Progress: Send + Sync {
    /// Signals the job framework that the task is alive.
    fn keep_alive(&self);
}

/// A `Progress` implementation that does nothing. Useful for standalone
/// runs and tests that do not observe liveness.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl Progress for NoopProgress {
    fn keep_alive(&self) {}
}
