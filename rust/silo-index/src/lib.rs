//! Inverted term index build engine.
//!
//! This crate owns the local on-disk index build that a batch task performs:
//! it accepts one record at a time, accumulates tokenized terms in memory,
//! spills full segments to disk, and on finalize compacts the build down to
//! a bounded number of segments.
//!
//! # Build flow
//!
//! 1. A pre-built *template* directory (staged from shared storage) supplies
//!    the index settings under `conf/index-settings.json`.
//! 2. [`IndexWriter::new`] binds the settings to a local data directory via
//!    the configured data-directory property and prepares the build area at
//!    `<data dir>/index`.
//! 3. [`IndexWriter::add`] tokenizes the sink fields of each record into the
//!    current in-memory segment, flushing it to disk at the configured
//!    threshold.
//! 4. [`IndexWriter::seal`] flushes the tail, merges segments down to the
//!    maximum segment count, and writes the index manifest. Sealing consumes
//!    the writer, so a build cannot be finalized twice.
//!
//! [`IndexReader`] opens a finished index directory for term lookups; it is
//! primarily used to validate staged-out indexes.

pub mod document;
pub mod manifest;
pub mod reader;
pub mod segment;
pub mod settings;
pub mod tokenizer;
pub mod writer;

pub use document::Record;
pub use manifest::IndexManifest;
pub use reader::IndexReader;
pub use settings::IndexSettings;
pub use tokenizer::{Tokenizer, create_tokenizer};
pub use writer::{IndexWriter, IndexWriterParams, SealedIndex};
