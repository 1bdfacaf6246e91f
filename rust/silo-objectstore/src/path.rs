//! Path addressing for shared-store objects.
//!
//! All store operations are addressed by clean relative paths. The functions
//! in this module require paths to be valid, sanitized and canonical, and
//! return an error if these conditions are not met. Specifically:
//! - paths must be non-empty and relative (no leading `/`),
//! - paths must not contain empty, `.` or `..` segments,
//! - paths use `/` as the separator regardless of the host platform.

use std::fmt;

use silo_common::{Result, error::Error};

/// A relative path within a shared store, verified according to the store
/// addressing rules. A verified path is deemed "trusted" for further
/// manipulation (joining, sibling derivation).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath(String);

impl StorePath {
    /// Parses and verifies a store path.
    ///
    /// Returns an error if the path is empty, absolute, or contains
    /// traversal or empty segments.
    pub fn new(path: impl Into<String>) -> Result<StorePath> {
        let path = path.into();
        verify_store_path(&path)?;
        Ok(StorePath(path))
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends a single verified segment, producing a child path.
    pub fn join(&self, segment: &str) -> Result<StorePath> {
        verify_segment(segment)?;
        Ok(StorePath(format!("{}/{}", self.0, segment)))
    }

    /// Returns the last segment of the path (the object or container name).
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the parent container path, or `None` for a top-level path.
    pub fn parent(&self) -> Option<StorePath> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| StorePath(parent.to_string()))
    }

    /// Produces a path with the given name in the same parent container.
    ///
    /// Used to derive temporary sibling locations that can later be renamed
    /// onto this path.
    pub fn sibling(&self, name: &str) -> Result<StorePath> {
        verify_segment(name)?;
        match self.parent() {
            Some(parent) => parent.join(name),
            None => StorePath::new(name),
        }
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn verify_store_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::invalid_arg("path", "store path must not be empty"));
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err(Error::invalid_arg(
            "path",
            format!("store path '{path}' must be relative without a trailing slash"),
        ));
    }
    for segment in path.split('/') {
        verify_segment(segment)?;
    }
    Ok(())
}

fn verify_segment(segment: &str) -> Result<()> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains(['/', '\\']) {
        return Err(Error::invalid_arg(
            "segment",
            format!("invalid store path segment '{segment}'"),
        ));
    }
    Ok(())
}
