//! The index manifest: the commit point of a finished local build.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use silo_common::{Result, error::Error};

/// File name of the manifest within an index directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Describes a finished index directory: which segment files belong to the
/// index and how their terms were produced. Files not named here (template
/// skeletons, foreign artifacts) are ignored by readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    /// On-disk format version.
    pub format_version: u32,
    /// Total number of records in the index.
    pub record_count: u64,
    /// Name of the tokenizer the index was built with.
    pub tokenizer: String,
    /// Segment file names, in merge order.
    pub segments: Vec<String>,
}

impl IndexManifest {
    /// Current on-disk format version.
    pub const FORMAT_VERSION: u32 = 1;

    /// Writes the manifest into an index directory.
    pub fn store(&self, index_dir: &Path) -> Result<()> {
        let path = index_dir.join(MANIFEST_FILE_NAME);
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| Error::index_build("encode manifest", e.to_string()))?;
        fs::write(&path, text)
            .map_err(|e| Error::io(format!("write manifest {}", path.display()), e))
    }

    /// Loads the manifest from an index directory.
    pub fn load(index_dir: &Path) -> Result<IndexManifest> {
        let path = index_dir.join(MANIFEST_FILE_NAME);
        let text = fs::read_to_string(&path)
            .map_err(|e| Error::io(format!("read manifest {}", path.display()), e))?;
        let manifest: IndexManifest = serde_json::from_str(&text).map_err(|e| {
            Error::index_build("decode manifest", format!("malformed {}: {e}", path.display()))
        })?;
        if manifest.format_version != Self::FORMAT_VERSION {
            return Err(Error::index_build(
                "decode manifest",
                format!(
                    "unsupported format version {} in {}",
                    manifest.format_version,
                    path.display()
                ),
            ));
        }
        Ok(manifest)
    }
}
