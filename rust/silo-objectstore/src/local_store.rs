//! A `SharedStore` implementation backed by a local filesystem directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use silo_common::{Result, error::Error};

use crate::{
    SharedStore,
    checksum::{content_checksum, encode_checksum, is_sidecar_name, sidecar_name},
    path::StorePath,
};

/// A `SharedStore` that manages objects under a single local container
/// directory. Store paths are resolved relative to the container root.
///
/// This implementation serves local runs and tests; it preserves the
/// contract of a remote store, including per-object checksum objects and
/// the sidecar-collision rejection on ingest.
pub struct LocalFsSharedStore {
    /// The top-level directory holding all objects of this store.
    container_path: PathBuf,
}

impl LocalFsSharedStore {
    /// Creates a store rooted at the given container directory.
    ///
    /// The container directory is created if it does not exist.
    pub fn new(container_path: &Path) -> Result<LocalFsSharedStore> {
        fs::create_dir_all(container_path).map_err(|e| {
            Error::io(
                format!("create store container {}", container_path.display()),
                e,
            )
        })?;
        Ok(LocalFsSharedStore {
            container_path: container_path.to_path_buf(),
        })
    }

    /// Returns the file system path of the store's top-level container.
    pub fn container_path(&self) -> &Path {
        &self.container_path
    }

    /// Converts a [`StorePath`] to the backing local filesystem path.
    pub fn resolve(&self, path: &StorePath) -> PathBuf {
        self.container_path.join(path.as_str())
    }
}

impl SharedStore for LocalFsSharedStore {
    fn exists(&self, path: &StorePath) -> Result<bool> {
        Ok(self.resolve(path).exists())
    }

    fn copy_to_local(&self, src: &StorePath, dst: &Path) -> Result<u64> {
        let src_path = self.resolve(src);
        if !src_path.exists() {
            return Err(Error::invalid_arg(
                "src",
                format!("store path '{src}' does not exist"),
            ));
        }
        download_tree(&src_path, dst)
    }

    fn copy_from_local(&self, src: &Path, dst: &StorePath, delete_source: bool) -> Result<u64> {
        if !src.exists() {
            return Err(Error::invalid_arg(
                "src",
                format!("local path '{}' does not exist", src.display()),
            ));
        }
        let dst_path = self.resolve(dst);
        let bytes = ingest_tree(src, &dst_path)?;
        if delete_source {
            remove_local(src)?;
        }
        Ok(bytes)
    }

    fn rename(&self, src: &StorePath, dst: &StorePath) -> Result<()> {
        let src_path = self.resolve(src);
        let dst_path = self.resolve(dst);
        if let Some(parent) = dst_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::io(format!("create parent of '{dst}'"), e))?;
        }
        fs::rename(&src_path, &dst_path)
            .map_err(|e| Error::io(format!("rename '{src}' to '{dst}'"), e))
    }
}

/// Downloads a store-side file or directory tree to `dst`, verifying data
/// against checksum objects and writing local sidecars.
fn download_tree(src: &Path, dst: &Path) -> Result<u64> {
    if src.is_dir() {
        fs::create_dir_all(dst)
            .map_err(|e| Error::io(format!("create local dir {}", dst.display()), e))?;
        let mut bytes = 0;
        for entry in read_dir_sorted(src)? {
            let name = file_name(&entry)?;
            // Checksum objects are store metadata, they are not materialized
            // as data files on the local side.
            if entry.is_file() && is_sidecar_name(&name) {
                continue;
            }
            bytes += download_tree(&entry, &dst.join(&name))?;
        }
        Ok(bytes)
    } else {
        let data =
            fs::read(src).map_err(|e| Error::io(format!("read object {}", src.display()), e))?;
        let checksum = content_checksum(&data);
        verify_stored_checksum(src, checksum)?;
        fs::write(dst, &data)
            .map_err(|e| Error::io(format!("write local file {}", dst.display()), e))?;
        let sidecar = sidecar_path(dst);
        fs::write(&sidecar, encode_checksum(checksum))
            .map_err(|e| Error::io(format!("write sidecar {}", sidecar.display()), e))?;
        Ok(data.len() as u64)
    }
}

/// Ingests a local file or directory tree into the store at `dst`, recording
/// a checksum object per data file.
fn ingest_tree(src: &Path, dst: &Path) -> Result<u64> {
    if src.is_dir() {
        fs::create_dir_all(dst)
            .map_err(|e| Error::io(format!("create store dir {}", dst.display()), e))?;
        let mut bytes = 0;
        for entry in read_dir_sorted(src)? {
            let name = file_name(&entry)?;
            bytes += ingest_tree(&entry, &dst.join(&name))?;
        }
        Ok(bytes)
    } else {
        let name = file_name(src)?;
        if is_sidecar_name(&name) {
            // The store derives its own checksum object under this exact
            // name; ingesting the local sidecar would collide with it.
            return Err(Error::checksum_mismatch(format!(
                "local sidecar '{}' collides with the store checksum object",
                src.display()
            )));
        }
        let data =
            fs::read(src).map_err(|e| Error::io(format!("read local file {}", src.display()), e))?;
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::io(format!("create store dir {}", parent.display()), e))?;
        }
        fs::write(dst, &data)
            .map_err(|e| Error::io(format!("write object {}", dst.display()), e))?;
        let checksum_object = sidecar_path(dst);
        fs::write(&checksum_object, encode_checksum(content_checksum(&data))).map_err(|e| {
            Error::io(
                format!("write checksum object {}", checksum_object.display()),
                e,
            )
        })?;
        Ok(data.len() as u64)
    }
}

/// Verifies object content against the store's checksum object, when one
/// is recorded next to the object.
fn verify_stored_checksum(object: &Path, checksum: u64) -> Result<()> {
    let checksum_object = sidecar_path(object);
    if !checksum_object.exists() {
        return Ok(());
    }
    let recorded = fs::read_to_string(&checksum_object)
        .map_err(|e| Error::io(format!("read checksum {}", checksum_object.display()), e))?;
    if recorded.trim() != encode_checksum(checksum) {
        return Err(Error::checksum_mismatch(object.display().to_string()));
    }
    Ok(())
}

fn sidecar_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(sidecar_name(&name))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::invalid_arg("path", format!("invalid file name in {}", path.display())))
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| Error::io(format!("list {}", dir.display()), e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::io(format!("list {}", dir.display()), e))?;
    entries.sort();
    Ok(entries)
}

fn remove_local(path: &Path) -> Result<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| Error::io(format!("delete local source {}", path.display()), e))
}
