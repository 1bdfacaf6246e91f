//! The staged output writer: the per-task stage-in / build / stage-out
//! lifecycle.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use silo_common::{Progress, Result, error::Error};
use silo_index::{
    IndexWriter, Record,
    writer::{IndexWriterParams, SealedIndex},
};
use silo_objectstore::{SharedStore, checksum::is_sidecar_name, path::StorePath};

use crate::{
    config::{
        DATA_DIR_PROPERTY_KEY, DEFAULT_DATA_DIR_PROPERTY, DEFAULT_HEARTBEAT_INTERVAL_MS,
        DEFAULT_MAX_SEGMENTS, HEARTBEAT_INTERVAL_MS_KEY, JsonSinkFieldsCodec, MAX_SEGMENTS_KEY,
        OUTPUT_PATH_KEY, SINK_FIELDS_KEY, SinkFieldsCodec, TEMPLATE_PATH_KEY, TaskConfig,
    },
    heartbeat::Heartbeat,
};

/// Suffix appended to the task output path to form the index location.
const OUTPUT_SUFFIX: &str = "index";

/// Subdirectory of the staged template that becomes the build data
/// directory.
const DATA_DIR_NAME: &str = "data";

/// One record writer per task: stages an index template in from shared
/// storage, forwards records to a local [`IndexWriter`], and on close
/// finalizes the build and relocates it to the task's output location.
///
/// The writer moves through `Writing -> Closed`; `write` after `close` and a
/// second `close` are rejected as invalid operations. If the writer is
/// dropped without `close`, the unfinished local build and the staging
/// workspace are discarded and nothing reaches shared storage.
pub struct StagedIndexWriter {
    store: Arc<dyn SharedStore>,
    progress: Arc<dyn Progress>,
    task_name: String,
    /// Local staging workspace; removed on drop, and eagerly after a
    /// successful stage-out.
    staging: Option<tempfile::TempDir>,
    /// The local index build. `None` once the writer has been closed.
    index_writer: Option<IndexWriter>,
    output_path: StorePath,
    heartbeat_interval: Duration,
}

impl StagedIndexWriter {
    /// Constructs the writer for one task, performing stage-in, using the
    /// default sink-fields codec.
    pub fn new(
        store: Arc<dyn SharedStore>,
        config: &TaskConfig,
        task_name: &str,
        progress: Arc<dyn Progress>,
    ) -> Result<StagedIndexWriter> {
        Self::with_codec(store, config, task_name, progress, &JsonSinkFieldsCodec)
    }

    /// Constructs the writer for one task, performing stage-in.
    ///
    /// Copies the template tree to a uniquely named local staging workspace,
    /// resolves the output location as `<output base>/<task name>/index`,
    /// decodes the sink fields through `codec` and constructs the index
    /// writer over `<staged template>/data`. Any failure aborts construction
    /// before records are accepted; the partially created workspace is
    /// removed.
    pub fn with_codec(
        store: Arc<dyn SharedStore>,
        config: &TaskConfig,
        task_name: &str,
        progress: Arc<dyn Progress>,
        codec: &dyn SinkFieldsCodec,
    ) -> Result<StagedIndexWriter> {
        let template_path = StorePath::new(config.get_required(TEMPLATE_PATH_KEY)?)?;

        // Unique per construction, so concurrently running tasks and retried
        // attempts on the same host never share a workspace.
        let staging = tempfile::Builder::new()
            .prefix("silo-sink-")
            .tempdir()
            .map_err(|e| Error::io("create staging workspace", e))?;
        let local_template = staging.path().join(template_path.name());
        store.copy_to_local(&template_path, &local_template)?;

        let output_base = StorePath::new(config.get_required(OUTPUT_PATH_KEY)?)?;
        let output_path = output_base.join(task_name)?.join(OUTPUT_SUFFIX)?;

        let sink_fields = codec.decode(config.get_required(SINK_FIELDS_KEY)?)?;
        let max_segments = config.get_parsed(MAX_SEGMENTS_KEY, DEFAULT_MAX_SEGMENTS)?;
        let data_dir_property_name = config
            .get(DATA_DIR_PROPERTY_KEY)
            .unwrap_or(DEFAULT_DATA_DIR_PROPERTY)
            .to_string();
        let heartbeat_ms =
            config.get_parsed(HEARTBEAT_INTERVAL_MS_KEY, DEFAULT_HEARTBEAT_INTERVAL_MS)?;

        let index_writer = IndexWriter::new(IndexWriterParams {
            progress: progress.clone(),
            sink_fields,
            data_dir_property_name,
            data_dir: local_template.join(DATA_DIR_NAME),
            template_dir: local_template.clone(),
            max_segments,
        })?;

        log::debug!(
            "task '{task_name}': staged template '{template_path}' into {}",
            local_template.display()
        );

        Ok(StagedIndexWriter {
            store,
            progress,
            task_name: task_name.to_string(),
            staging: Some(staging),
            index_writer: Some(index_writer),
            output_path,
            heartbeat_interval: Duration::from_millis(heartbeat_ms),
        })
    }

    /// The shared-storage location the finished index will be committed to.
    pub fn output_path(&self) -> &StorePath {
        &self.output_path
    }

    /// Forwards one record to the index build.
    ///
    /// `key` is accepted for interface symmetry with the job framework's
    /// key/value record pairing and carries no information consumed here.
    /// Errors from the build propagate and fail the task.
    pub fn write(&mut self, _key: &Record, value: &Record) -> Result<()> {
        let writer = self
            .index_writer
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("write on a closed staged index writer"))?;
        writer.add(value)
    }

    /// Finalizes the build and relocates the finished index to the output
    /// location. Called exactly once, after all records have been written.
    ///
    /// Sealing and the bulk copy can take long with no records flowing; a
    /// background heartbeat keeps the liveness callback firing for the
    /// duration of the copy and is stopped (and joined) before this method
    /// returns, whatever the copy outcome.
    pub fn close(&mut self) -> Result<()> {
        let writer = self
            .index_writer
            .take()
            .ok_or_else(|| Error::invalid_operation("close on a closed staged index writer"))?;

        // Full segment merge; may take substantial wall-clock time.
        let sealed = writer.seal()?;

        // Local checksum sidecars left over from stage-in would collide with
        // the checksums the store computes on ingest.
        remove_checksum_sidecars(&sealed.index_dir)?;

        let heartbeat = Heartbeat::start(self.progress.clone(), self.heartbeat_interval)?;
        let staged = self.stage_out(&sealed);
        heartbeat.stop();
        staged?;

        if let Some(staging) = self.staging.take() {
            let staging_path = staging.path().to_path_buf();
            if let Err(e) = staging.close() {
                log::warn!(
                    "task '{}': failed to remove staging workspace {}: {e}",
                    self.task_name,
                    staging_path.display()
                );
            }
        }
        Ok(())
    }

    /// Copies the finished local index into shared storage with move
    /// semantics, committing it atomically via a temporary sibling.
    fn stage_out(&self, sealed: &SealedIndex) -> Result<()> {
        let index_size = dir_size(&sealed.index_dir)?;
        log::info!(
            "task '{}': copying {index_size} bytes of index ({} records, {} segments) from {} to '{}'",
            self.task_name,
            sealed.record_count,
            sealed.segment_count,
            sealed.index_dir.display(),
            self.output_path
        );

        let staged_name = format!("{}.tmp-{:016x}", self.output_path.name(), fastrand::u64(..));
        let staged_path = self.output_path.sibling(&staged_name)?;
        self.store
            .copy_from_local(&sealed.index_dir, &staged_path, true)?;
        self.store.rename(&staged_path, &self.output_path)
    }
}

impl Drop for StagedIndexWriter {
    fn drop(&mut self) {
        // Safety net for abandoned writers: discard the unfinished build and
        // let the workspace TempDir reclaim local disk. Never uploads, never
        // panics.
        if self.index_writer.take().is_some() {
            log::warn!(
                "task '{}': staged index writer dropped without close; discarding local build",
                self.task_name
            );
        }
    }
}

/// Deletes every checksum sidecar one level deep in `dir`.
fn remove_checksum_sidecars(dir: &Path) -> Result<()> {
    let entries =
        fs::read_dir(dir).map_err(|e| Error::io(format!("list index dir {}", dir.display()), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(format!("list index dir {}", dir.display()), e))?;
        let path = entry.path();
        let is_sidecar = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_sidecar_name);
        if path.is_file() && is_sidecar {
            fs::remove_file(&path)
                .map_err(|e| Error::io(format!("delete sidecar {}", path.display()), e))?;
            log::debug!("purged local checksum sidecar {}", path.display());
        }
    }
    Ok(())
}

/// Computes the total size in bytes of all files under `dir`.
fn dir_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    let entries =
        fs::read_dir(dir).map_err(|e| Error::io(format!("measure {}", dir.display()), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(format!("measure {}", dir.display()), e))?;
        let path = entry.path();
        if path.is_dir() {
            total += dir_size(&path)?;
        } else {
            let metadata = fs::metadata(&path)
                .map_err(|e| Error::io(format!("measure {}", path.display()), e))?;
            total += metadata.len();
        }
    }
    Ok(total)
}
