//! The record type fed into the index build.

use std::collections::BTreeMap;

/// A single record handed to the output stage by the job framework: an
/// ordered mapping of field names to textual values.
///
/// Which of the fields actually get indexed is decided by the sink-fields
/// descriptor of the task configuration, not by the record itself.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Record {
        Record::default()
    }

    /// Creates a record from field/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Record
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Record {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Sets a field value, replacing any previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) -> &mut Record {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Returns the value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Iterates over the record's field/value pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of fields carried by this record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record carries no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Record;

    #[test]
    fn test_record_fields() {
        let mut record = Record::new();
        record.set("title", "Staged Output").set("body", "records");
        assert_eq!(record.get("title"), Some("Staged Output"));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.len(), 2);

        let same = Record::from_pairs([("title", "Staged Output"), ("body", "records")]);
        assert_eq!(record, same);
    }
}
