//! *Shared Store* abstraction: a client for a distributed, path-addressed
//! storage service, capable of staging whole object trees between the store
//! and the local filesystem.
//!
//! The operations exposed here are exactly the ones the staged output stage
//! consumes: existence checks, recursive download (`copy_to_local`),
//! recursive ingest with optional source deletion (`copy_from_local`), and
//! an atomic `rename` used to commit a finished tree in a single step.
//!
//! # Checksum sidecars
//!
//! The store maintains an internal checksum object (`<object>.crc`, see
//! [`checksum`]) for every ingested data object and verifies downloads
//! against it. Downloads additionally leave a matching `.crc` sidecar file
//! next to every downloaded local file. Because the store derives checksum
//! object names itself during ingest, a local source tree that still carries
//! `.crc` sidecar files cannot be ingested: the sidecar would collide with
//! the store's own checksum object, and `copy_from_local` rejects it.
//! Callers staging out locally built data must purge sidecars first.

pub mod checksum;
pub mod local_store;
pub mod path;

use std::path::Path;

use silo_common::Result;

use crate::path::StorePath;

/// The `SharedStore` trait represents a distributed storage service used to
/// stage data in and out of batch tasks.
pub trait SharedStore: Send + Sync + 'static {
    /// Returns `true` if an object or container exists at the given path.
    fn exists(&self, path: &StorePath) -> Result<bool>;

    /// Recursively copies the object tree at `src` to the local path `dst`.
    ///
    /// Every downloaded file is verified against the store's checksum object
    /// (when one is recorded) and receives a local `.crc` sidecar next to it.
    ///
    /// Returns the number of data bytes copied.
    fn copy_to_local(&self, src: &StorePath, dst: &Path) -> Result<u64>;

    /// Recursively copies the local file or directory tree at `src` into the
    /// store at `dst`, recording a checksum object per ingested file.
    ///
    /// Fails with a checksum error if the source tree contains `.crc`
    /// sidecar files (see the module documentation). When `delete_source` is
    /// `true`, the local source tree is removed after a fully successful
    /// copy ("move" semantics).
    ///
    /// Returns the number of data bytes copied.
    fn copy_from_local(&self, src: &Path, dst: &StorePath, delete_source: bool) -> Result<u64>;

    /// Atomically renames the object tree at `src` to `dst`.
    ///
    /// Readers observe either the old or the new path, never a partially
    /// moved tree. Used to commit staged output in one step.
    fn rename(&self, src: &StorePath, dst: &StorePath) -> Result<()>;
}
