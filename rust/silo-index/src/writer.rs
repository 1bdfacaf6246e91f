//! The index writer: record-by-record local index construction.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use silo_common::{Progress, Result, error::Error};

use crate::{
    document::Record,
    manifest::IndexManifest,
    segment::{Segment, segment_file_name},
    settings::IndexSettings,
    tokenizer::{Tokenizer, create_tokenizer},
};

/// Construction parameters of an [`IndexWriter`].
pub struct IndexWriterParams {
    /// Liveness hook invoked on segment flushes and merge passes, so the
    /// surrounding job framework does not consider a long build hung.
    pub progress: Arc<dyn Progress>,
    /// Names of the record fields to index.
    pub sink_fields: Vec<String>,
    /// Name of the settings property through which the engine resolves its
    /// build-time data directory.
    pub data_dir_property_name: String,
    /// The local data directory; injected into the settings property bag
    /// under `data_dir_property_name`.
    pub data_dir: PathBuf,
    /// The staged template directory holding `conf/index-settings.json`.
    pub template_dir: PathBuf,
    /// Maximum number of segment files after finalize.
    pub max_segments: usize,
}

/// Summary of a finished build, returned by [`IndexWriter::seal`].
#[derive(Debug)]
pub struct SealedIndex {
    /// Directory containing the finished index (manifest plus segments).
    pub index_dir: PathBuf,
    /// Total number of records indexed.
    pub record_count: u64,
    /// Number of segment files after compaction.
    pub segment_count: usize,
}

/// Builds an inverted term index on local disk, one record at a time.
///
/// The writer keeps the current segment in memory and spills it to the index
/// directory whenever the settings' flush threshold is reached. [`seal`]
/// (which consumes the writer) flushes the tail segment, compacts the build
/// down to at most `max_segments` files and writes the manifest; until then
/// the directory holds no manifest and is not a readable index.
///
/// [`seal`]: IndexWriter::seal
pub struct IndexWriter {
    progress: Arc<dyn Progress>,
    sink_fields: Vec<String>,
    tokenizer: Box<dyn Tokenizer>,
    index_dir: PathBuf,
    flush_threshold: usize,
    max_segments: usize,
    current: Segment,
    segment_files: Vec<PathBuf>,
    next_segment_seq: u64,
    next_record_id: u32,
}

impl IndexWriter {
    /// Creates a writer bound to a staged template and a local data
    /// directory.
    ///
    /// Loads the template settings, injects the data directory under the
    /// configured property name, and prepares the build area at
    /// `<data dir>/index`.
    pub fn new(params: IndexWriterParams) -> Result<IndexWriter> {
        if params.max_segments == 0 {
            return Err(Error::invalid_arg(
                "max_segments",
                "must be at least 1",
            ));
        }
        if params.sink_fields.is_empty() {
            return Err(Error::invalid_arg("sink_fields", "must not be empty"));
        }

        let mut settings = IndexSettings::load(&params.template_dir)?;
        settings.set_property(
            &params.data_dir_property_name,
            params.data_dir.display().to_string(),
        );
        let data_dir = settings
            .property(&params.data_dir_property_name)
            .map(PathBuf::from)
            .ok_or_else(|| {
                Error::index_build(
                    "resolve data directory",
                    format!("property '{}' is unset", params.data_dir_property_name),
                )
            })?;

        let index_dir = data_dir.join("index");
        fs::create_dir_all(&index_dir)
            .map_err(|e| Error::io(format!("create index dir {}", index_dir.display()), e))?;

        let tokenizer = create_tokenizer(&settings.tokenizer)?;

        Ok(IndexWriter {
            progress: params.progress,
            sink_fields: params.sink_fields,
            tokenizer,
            index_dir,
            flush_threshold: settings.flush_threshold.max(1),
            max_segments: params.max_segments,
            current: Segment::default(),
            segment_files: Vec::new(),
            next_segment_seq: 0,
            next_record_id: 0,
        })
    }

    /// Directory where segments materialize and the manifest is written.
    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    /// Appends one record's sink-field values to the build.
    ///
    /// Errors propagate immediately; a failed `add` aborts the task.
    pub fn add(&mut self, record: &Record) -> Result<()> {
        let record_id = self.next_record_id;
        self.next_record_id = self.next_record_id.checked_add(1).ok_or_else(|| {
            Error::index_build("add record", "record id space exhausted".to_string())
        })?;

        for field in &self.sink_fields {
            if let Some(value) = record.get(field) {
                for token in self.tokenizer.tokenize(value) {
                    self.current.add_term(format!("{field}:{token}"), record_id);
                }
            }
        }
        self.current.record_count += 1;

        if self.current.record_count as usize >= self.flush_threshold {
            self.flush()?;
            self.progress.keep_alive();
        }
        Ok(())
    }

    /// Finalizes the build: flushes the tail segment, compacts down to at
    /// most the configured segment count and writes the manifest.
    ///
    /// Consumes the writer; a sealed build cannot be modified or re-sealed.
    pub fn seal(mut self) -> Result<SealedIndex> {
        self.flush()?;
        self.compact()?;

        let manifest = IndexManifest {
            format_version: IndexManifest::FORMAT_VERSION,
            record_count: self.next_record_id as u64,
            tokenizer: self.tokenizer.name().to_string(),
            segments: self
                .segment_files
                .iter()
                .map(|path| {
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default()
                })
                .collect(),
        };
        manifest.store(&self.index_dir)?;

        Ok(SealedIndex {
            record_count: self.next_record_id as u64,
            segment_count: self.segment_files.len(),
            index_dir: self.index_dir,
        })
    }

    /// Spills the current in-memory segment to disk, if it covers records.
    fn flush(&mut self) -> Result<()> {
        if self.current.is_empty() {
            return Ok(());
        }
        let segment = std::mem::take(&mut self.current);
        let path = self.index_dir.join(segment_file_name(self.next_segment_seq));
        self.next_segment_seq += 1;
        segment.write_to_file(&path)?;
        self.segment_files.push(path);
        Ok(())
    }

    /// Merges segment files until at most `max_segments` remain.
    fn compact(&mut self) -> Result<()> {
        if self.segment_files.len() <= self.max_segments {
            return Ok(());
        }
        let group_size = self.segment_files.len().div_ceil(self.max_segments);
        let files = std::mem::take(&mut self.segment_files);
        for group in files.chunks(group_size) {
            if group.len() == 1 {
                self.segment_files.push(group[0].clone());
                continue;
            }
            let parts = group
                .iter()
                .map(|path| Segment::read_from_file(path))
                .collect::<Result<Vec<_>>>()?;
            let merged = Segment::merge(parts);
            let path = self.index_dir.join(segment_file_name(self.next_segment_seq));
            self.next_segment_seq += 1;
            merged.write_to_file(&path)?;
            for old in group {
                fs::remove_file(old)
                    .map_err(|e| Error::io(format!("delete segment {}", old.display()), e))?;
            }
            self.segment_files.push(path);
            // Merge passes can be long; report liveness between them.
            self.progress.keep_alive();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use silo_common::progress::NoopProgress;
    use tempfile::TempDir;

    use super::{IndexWriter, IndexWriterParams};
    use crate::{document::Record, settings::IndexSettings};

    fn make_template(flush_threshold: usize) -> TempDir {
        let dir = TempDir::new().unwrap();
        let settings = IndexSettings {
            flush_threshold,
            ..IndexSettings::default()
        };
        settings.store(dir.path()).unwrap();
        dir
    }

    fn make_writer(template: &TempDir, data_dir: &TempDir, max_segments: usize) -> IndexWriter {
        IndexWriter::new(IndexWriterParams {
            progress: Arc::new(NoopProgress),
            sink_fields: vec!["body".to_string()],
            data_dir_property_name: "data.dir".to_string(),
            data_dir: data_dir.path().to_path_buf(),
            template_dir: template.path().to_path_buf(),
            max_segments,
        })
        .unwrap()
    }

    #[test]
    fn test_flush_produces_segments() {
        let template = make_template(2);
        let data = TempDir::new().unwrap();
        let mut writer = make_writer(&template, &data, 10);

        for i in 0..5 {
            let record = Record::from_pairs([("body", format!("record {i}"))]);
            writer.add(&record).unwrap();
        }
        let sealed = writer.seal().unwrap();
        assert_eq!(sealed.record_count, 5);
        // 5 records at threshold 2: two full segments plus the tail.
        assert_eq!(sealed.segment_count, 3);
        assert!(sealed.index_dir.join("manifest.json").is_file());
    }

    #[test]
    fn test_compaction_bounds_segment_count() {
        let template = make_template(1);
        let data = TempDir::new().unwrap();
        let mut writer = make_writer(&template, &data, 2);

        for i in 0..9 {
            let record = Record::from_pairs([("body", format!("token{i} shared"))]);
            writer.add(&record).unwrap();
        }
        let sealed = writer.seal().unwrap();
        assert_eq!(sealed.record_count, 9);
        assert!(sealed.segment_count <= 2);

        let seg_files: Vec<_> = std::fs::read_dir(&sealed.index_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".seg"))
            .collect();
        assert_eq!(seg_files.len(), sealed.segment_count);
    }

    #[test]
    fn test_seal_without_records() {
        let template = make_template(1024);
        let data = TempDir::new().unwrap();
        let writer = make_writer(&template, &data, 10);
        let sealed = writer.seal().unwrap();
        assert_eq!(sealed.record_count, 0);
        assert_eq!(sealed.segment_count, 0);
        assert!(sealed.index_dir.join("manifest.json").is_file());
    }

    #[test]
    fn test_rejects_empty_sink_fields() {
        let template = make_template(16);
        let data = TempDir::new().unwrap();
        let result = IndexWriter::new(IndexWriterParams {
            progress: Arc::new(NoopProgress),
            sink_fields: Vec::new(),
            data_dir_property_name: "data.dir".to_string(),
            data_dir: data.path().to_path_buf(),
            template_dir: template.path().to_path_buf(),
            max_segments: 10,
        });
        assert!(result.is_err());
    }
}
