//! Index settings staged in from the template directory.

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use silo_common::{Result, error::Error};

/// Location of the settings document within a template directory.
pub const SETTINGS_RELATIVE_PATH: &str = "conf/index-settings.json";

/// Build settings decoded from the template's `conf/index-settings.json`.
///
/// The template carries the schema-like configuration of the index (which
/// tokenizer to use, when to spill segments) plus a free-form property bag.
/// The build-time data directory is not part of the template: the caller
/// injects it into the property bag under a configured property name, and
/// the engine resolves its build area back through that same property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Name of the tokenizer used to break field values into terms.
    #[serde(default = "default_tokenizer")]
    pub tokenizer: String,

    /// Number of records accumulated in memory before the current segment
    /// is spilled to disk.
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: usize,

    /// Free-form string properties referenced by the engine and its callers.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_tokenizer() -> String {
    "word".to_string()
}

fn default_flush_threshold() -> usize {
    1024
}

impl Default for IndexSettings {
    fn default() -> IndexSettings {
        IndexSettings {
            tokenizer: default_tokenizer(),
            flush_threshold: default_flush_threshold(),
            properties: BTreeMap::new(),
        }
    }
}

impl IndexSettings {
    /// Loads the settings document from a staged template directory.
    pub fn load(template_dir: &Path) -> Result<IndexSettings> {
        let path = template_dir.join(SETTINGS_RELATIVE_PATH);
        let text = fs::read_to_string(&path)
            .map_err(|e| Error::io(format!("read index settings {}", path.display()), e))?;
        serde_json::from_str(&text).map_err(|e| {
            Error::index_build(
                "index settings",
                format!("malformed {}: {e}", path.display()),
            )
        })
    }

    /// Writes the settings document into a template directory, creating the
    /// `conf/` subdirectory when needed. Used when authoring templates.
    pub fn store(&self, template_dir: &Path) -> Result<()> {
        let path = template_dir.join(SETTINGS_RELATIVE_PATH);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::io(format!("create {}", parent.display()), e))?;
        }
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| Error::index_build("index settings", e.to_string()))?;
        fs::write(&path, text)
            .map_err(|e| Error::io(format!("write index settings {}", path.display()), e))
    }

    /// Sets a property value.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Returns a property value, if set.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::IndexSettings;

    #[test]
    fn test_settings_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut settings = IndexSettings::default();
        settings.tokenizer = "trivial".to_string();
        settings.flush_threshold = 4;
        settings.set_property("data.dir", "/tmp/build");
        settings.store(dir.path()).unwrap();

        let loaded = IndexSettings::load(dir.path()).unwrap();
        assert_eq!(loaded.tokenizer, "trivial");
        assert_eq!(loaded.flush_threshold, 4);
        assert_eq!(loaded.property("data.dir"), Some("/tmp/build"));
    }

    #[test]
    fn test_settings_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("conf")).unwrap();
        std::fs::write(dir.path().join("conf/index-settings.json"), "{}").unwrap();

        let loaded = IndexSettings::load(dir.path()).unwrap();
        assert_eq!(loaded.tokenizer, "word");
        assert_eq!(loaded.flush_threshold, 1024);
        assert!(loaded.properties.is_empty());
    }

    #[test]
    fn test_settings_missing_template() {
        let dir = TempDir::new().unwrap();
        assert!(IndexSettings::load(dir.path()).is_err());
    }
}
