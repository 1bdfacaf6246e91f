//! Staged search-index output stage for distributed batch jobs.
//!
//! One [`StagedIndexWriter`] is constructed per task. It stages a pre-built
//! index template from shared storage to a local workspace, streams the
//! task's records into a local index build, and on close relocates the
//! finished index to its final shared-storage location. A background
//! heartbeat keeps the job framework convinced the task is alive during the
//! long, silent finalize-and-copy phase.
//!
//! # Lifecycle
//!
//! ```text
//! construct (stage-in) -> write* -> close (seal, purge, heartbeat, stage-out)
//! ```
//!
//! The output location is written exactly once: the finished index is copied
//! to a temporary sibling path and renamed into place, so an external reader
//! never observes a partial index. Construction, write and close failures
//! all fail the task as a whole; the staging workspace is reclaimed on every
//! exit path.

pub mod config;
pub mod heartbeat;
pub mod writer;

pub use config::{JsonSinkFieldsCodec, SinkFieldsCodec, TaskConfig};
pub use writer::StagedIndexWriter;
