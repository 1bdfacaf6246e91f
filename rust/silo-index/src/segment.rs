//! On-disk index segments.
//!
//! A segment is a self-contained postings map covering a contiguous range of
//! record ids. Segments accumulate in memory and are spilled to
//! `segment-<seq>.seg` files; finalize merges them down to a bounded count.

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use silo_common::{Result, error::Error};

/// File extension of segment files.
pub const SEGMENT_EXTENSION: &str = "seg";

/// Produces the file name of a segment from its sequence number.
pub fn segment_file_name(seq: u64) -> String {
    format!("segment-{seq:010}.{SEGMENT_EXTENSION}")
}

/// A single index segment: a map of terms to sorted record-id postings.
///
/// Terms are stored as `field:token` so that lookups are field-scoped.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Number of records covered by this segment.
    pub record_count: u64,
    /// Term postings; record ids are ascending and unique per term.
    pub postings: BTreeMap<String, Vec<u32>>,
}

impl Segment {
    /// Appends a record id to a term's postings.
    ///
    /// Record ids are assigned monotonically by the writer, so appending
    /// keeps the postings sorted; consecutive duplicates (a term occurring
    /// several times in one record) collapse to a single entry.
    pub fn add_term(&mut self, term: String, record_id: u32) {
        let postings = self.postings.entry(term).or_default();
        if postings.last() != Some(&record_id) {
            postings.push(record_id);
        }
    }

    /// Returns `true` if the segment covers no records.
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// Merges several segments into one, unioning their postings.
    pub fn merge(parts: Vec<Segment>) -> Segment {
        let mut merged = Segment::default();
        for part in parts {
            merged.record_count += part.record_count;
            for (term, ids) in part.postings {
                let postings = merged.postings.entry(term).or_default();
                postings.extend(ids);
            }
        }
        for postings in merged.postings.values_mut() {
            postings.sort_unstable();
            postings.dedup();
        }
        merged
    }

    /// Serializes the segment to a file, returning the encoded size in bytes.
    pub fn write_to_file(&self, path: &Path) -> Result<u64> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| Error::index_build("encode segment", e.to_string()))?;
        fs::write(path, &bytes)
            .map_err(|e| Error::io(format!("write segment {}", path.display()), e))?;
        Ok(bytes.len() as u64)
    }

    /// Reads a segment back from a file.
    pub fn read_from_file(path: &Path) -> Result<Segment> {
        let bytes = fs::read(path)
            .map_err(|e| Error::io(format!("read segment {}", path.display()), e))?;
        let (segment, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|e| {
            Error::index_build(
                "decode segment",
                format!("malformed {}: {e}", path.display()),
            )
        })?;
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::{Segment, segment_file_name};

    #[test]
    fn test_segment_file_naming() {
        assert_eq!(segment_file_name(7), "segment-0000000007.seg");
    }

    #[test]
    fn test_add_term_keeps_postings_sorted_unique() {
        let mut segment = Segment::default();
        segment.add_term("body:alpha".to_string(), 1);
        segment.add_term("body:alpha".to_string(), 1);
        segment.add_term("body:alpha".to_string(), 4);
        assert_eq!(segment.postings["body:alpha"], vec![1, 4]);
    }

    #[test]
    fn test_merge_unions_postings() {
        let mut a = Segment::default();
        a.record_count = 2;
        a.add_term("body:alpha".to_string(), 0);
        a.add_term("body:beta".to_string(), 1);

        let mut b = Segment::default();
        b.record_count = 1;
        b.add_term("body:alpha".to_string(), 2);

        let merged = Segment::merge(vec![a, b]);
        assert_eq!(merged.record_count, 3);
        assert_eq!(merged.postings["body:alpha"], vec![0, 2]);
        assert_eq!(merged.postings["body:beta"], vec![1]);
    }

    #[test]
    fn test_segment_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut segment = Segment::default();
        segment.record_count = 1;
        segment.add_term("title:silo".to_string(), 0);

        let path = dir.path().join(segment_file_name(0));
        let size = segment.write_to_file(&path).unwrap();
        assert!(size > 0);

        let loaded = Segment::read_from_file(&path).unwrap();
        assert_eq!(loaded.record_count, 1);
        assert_eq!(loaded.postings["title:silo"], vec![0]);
    }
}
