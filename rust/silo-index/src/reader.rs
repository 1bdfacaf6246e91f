//! Read access to a finished index directory.

use std::path::Path;

use silo_common::{Result, error::Error};

use crate::{
    manifest::IndexManifest,
    segment::Segment,
    tokenizer::{Tokenizer, create_tokenizer},
};

/// Opens a finished index directory for field-scoped term lookups.
///
/// The reader is driven entirely by the manifest: segment files are loaded
/// by name and any other files in the directory (template skeletons, foreign
/// artifacts) are ignored. Queries are tokenized with the same tokenizer the
/// index was built with.
pub struct IndexReader {
    manifest: IndexManifest,
    tokenizer: Box<dyn Tokenizer>,
    segments: Vec<Segment>,
}

impl IndexReader {
    /// Opens the index at `index_dir`.
    pub fn open(index_dir: &Path) -> Result<IndexReader> {
        let manifest = IndexManifest::load(index_dir)?;
        let tokenizer = create_tokenizer(&manifest.tokenizer)?;
        let segments = manifest
            .segments
            .iter()
            .map(|name| Segment::read_from_file(&index_dir.join(name)))
            .collect::<Result<Vec<_>>>()?;
        Ok(IndexReader {
            manifest,
            tokenizer,
            segments,
        })
    }

    /// Total number of records in the index.
    pub fn record_count(&self) -> u64 {
        self.manifest.record_count
    }

    /// Number of segments backing the index.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Looks up the record ids matching a term within a field.
    ///
    /// The query value goes through the index tokenizer; the first extracted
    /// token is matched. Returns an empty list when the value yields no
    /// token or the term is absent.
    pub fn search(&self, field: &str, value: &str) -> Vec<u32> {
        let Some(token) = self.tokenizer.tokenize(value).into_iter().next() else {
            return Vec::new();
        };
        let term = format!("{field}:{token}");
        let mut ids: Vec<u32> = self
            .segments
            .iter()
            .filter_map(|segment| segment.postings.get(&term))
            .flatten()
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use silo_common::progress::NoopProgress;
    use tempfile::TempDir;

    use super::IndexReader;
    use crate::{
        document::Record,
        settings::IndexSettings,
        writer::{IndexWriter, IndexWriterParams},
    };

    #[test]
    fn test_build_and_search_roundtrip() {
        let template = TempDir::new().unwrap();
        IndexSettings {
            flush_threshold: 2,
            ..IndexSettings::default()
        }
        .store(template.path())
        .unwrap();
        let data = TempDir::new().unwrap();

        let mut writer = IndexWriter::new(IndexWriterParams {
            progress: Arc::new(NoopProgress),
            sink_fields: vec!["title".to_string(), "body".to_string()],
            data_dir_property_name: "data.dir".to_string(),
            data_dir: data.path().to_path_buf(),
            template_dir: template.path().to_path_buf(),
            max_segments: 10,
        })
        .unwrap();

        writer
            .add(&Record::from_pairs([
                ("title", "Staged Output"),
                ("body", "first record body"),
            ]))
            .unwrap();
        writer
            .add(&Record::from_pairs([
                ("title", "Second"),
                ("body", "another record"),
            ]))
            .unwrap();
        writer
            .add(&Record::from_pairs([
                ("title", "Third"),
                ("body", "record three staged"),
                ("ignored", "not a sink field"),
            ]))
            .unwrap();

        let sealed = writer.seal().unwrap();
        let reader = IndexReader::open(&sealed.index_dir).unwrap();

        assert_eq!(reader.record_count(), 3);
        assert_eq!(reader.search("body", "record"), vec![0, 1, 2]);
        assert_eq!(reader.search("body", "staged"), vec![2]);
        assert_eq!(reader.search("title", "Staged"), vec![0]);
        // Field scoping: "staged" in the title of record 0 only.
        assert_eq!(reader.search("title", "second"), vec![1]);
        // Non-sink fields are not indexed.
        assert!(reader.search("ignored", "sink").is_empty());
        assert!(reader.search("body", "absent").is_empty());
    }

    #[test]
    fn test_open_ignores_foreign_files() {
        let template = TempDir::new().unwrap();
        IndexSettings::default().store(template.path()).unwrap();
        let data = TempDir::new().unwrap();

        let writer = IndexWriter::new(IndexWriterParams {
            progress: Arc::new(NoopProgress),
            sink_fields: vec!["body".to_string()],
            data_dir_property_name: "data.dir".to_string(),
            data_dir: data.path().to_path_buf(),
            template_dir: template.path().to_path_buf(),
            max_segments: 10,
        })
        .unwrap();
        let sealed = writer.seal().unwrap();

        std::fs::write(sealed.index_dir.join("placeholder.txt"), b"skeleton").unwrap();
        let reader = IndexReader::open(&sealed.index_dir).unwrap();
        assert_eq!(reader.record_count(), 0);
        assert_eq!(reader.segment_count(), 0);
    }

    #[test]
    fn test_open_missing_manifest() {
        let dir = TempDir::new().unwrap();
        assert!(IndexReader::open(dir.path()).is_err());
    }
}
