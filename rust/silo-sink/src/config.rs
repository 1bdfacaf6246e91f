//! Task configuration consumed by the staged output writer.

use std::{collections::BTreeMap, str::FromStr};

use silo_common::{Result, error::Error};

/// Shared-storage path of the index template to stage in. Required.
pub const TEMPLATE_PATH_KEY: &str = "silo.sink.template.path";

/// Serialized descriptor of the record fields to index. Required; decoded
/// through a [`SinkFieldsCodec`].
pub const SINK_FIELDS_KEY: &str = "silo.sink.fields";

/// Shared-storage base path under which per-task output lands. Required.
pub const OUTPUT_PATH_KEY: &str = "silo.sink.output.path";

/// Maximum number of index segments after finalize.
pub const MAX_SEGMENTS_KEY: &str = "silo.sink.max.segments";

/// Name of the index-settings property designating the local data directory.
pub const DATA_DIR_PROPERTY_KEY: &str = "silo.sink.data.dir.property";

/// Interval of the stage-out liveness heartbeat, in milliseconds.
pub const HEARTBEAT_INTERVAL_MS_KEY: &str = "silo.sink.heartbeat.interval.ms";

pub const DEFAULT_MAX_SEGMENTS: usize = 10;
pub const DEFAULT_DATA_DIR_PROPERTY: &str = "data.dir";
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 10_000;

/// An immutable key/value configuration supplied once per task by the job
/// framework. Read-only to the output stage.
#[derive(Debug, Default, Clone)]
pub struct TaskConfig {
    entries: BTreeMap<String, String>,
}

impl TaskConfig {
    /// Builds a configuration from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> TaskConfig
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        TaskConfig {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the value of a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the value of a key that must be present.
    pub fn get_required(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| Error::config(key, "required key is missing"))
    }

    /// Parses the value of a key, falling back to `default` when unset.
    pub fn get_parsed<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|e| Error::config(key, format!("cannot parse '{raw}': {e}"))),
        }
    }
}

/// Decodes the opaque sink-fields descriptor carried in the task
/// configuration. The encoding of the descriptor is owned by the job
/// framework; the output stage only sees the decoded field names.
pub trait SinkFieldsCodec {
    /// Decodes the serialized descriptor into the list of fields to index.
    fn decode(&self, raw: &str) -> Result<Vec<String>>;
}

/// The default codec: a JSON array of field names.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSinkFieldsCodec;

impl SinkFieldsCodec for JsonSinkFieldsCodec {
    fn decode(&self, raw: &str) -> Result<Vec<String>> {
        let fields: Vec<String> = serde_json::from_str(raw)
            .map_err(|e| Error::config(SINK_FIELDS_KEY, format!("malformed descriptor: {e}")))?;
        if fields.is_empty() {
            return Err(Error::config(SINK_FIELDS_KEY, "descriptor names no fields"));
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_and_parsed_keys() {
        let config = TaskConfig::from_pairs([
            (TEMPLATE_PATH_KEY, "templates/core"),
            (MAX_SEGMENTS_KEY, "4"),
        ]);
        assert_eq!(config.get_required(TEMPLATE_PATH_KEY).unwrap(), "templates/core");
        assert!(config.get_required(OUTPUT_PATH_KEY).is_err());
        assert_eq!(
            config.get_parsed(MAX_SEGMENTS_KEY, DEFAULT_MAX_SEGMENTS).unwrap(),
            4
        );
        assert_eq!(
            config
                .get_parsed(HEARTBEAT_INTERVAL_MS_KEY, DEFAULT_HEARTBEAT_INTERVAL_MS)
                .unwrap(),
            10_000
        );

        let bad = TaskConfig::from_pairs([(MAX_SEGMENTS_KEY, "many")]);
        assert!(bad.get_parsed(MAX_SEGMENTS_KEY, DEFAULT_MAX_SEGMENTS).is_err());
    }

    #[test]
    fn test_json_sink_fields_codec() {
        let codec = JsonSinkFieldsCodec;
        assert_eq!(
            codec.decode(r#"["title","body"]"#).unwrap(),
            vec!["title".to_string(), "body".to_string()]
        );
        assert!(codec.decode("[]").is_err());
        assert!(codec.decode("not json").is_err());
    }
}
