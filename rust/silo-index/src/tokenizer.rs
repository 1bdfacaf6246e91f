//! Tokenizers for extracting terms from field values.
//!
//! The same tokenizer must be used when building an index and when probing
//! it, so the tokenizer name is recorded in the index manifest.

use silo_common::{Result, error::Error};

/// Maximum length of a single term in bytes; longer tokens are dropped.
pub const MAX_TERM_LENGTH: usize = 128;

/// A tokenizer extracts terms from a raw field value.
pub trait Tokenizer: Send + Sync {
    /// Extracts the terms of `input`, normalized for index storage.
    fn tokenize(&self, input: &str) -> Vec<String>;

    /// Stable name of the tokenizer, recorded in the index manifest.
    fn name(&self) -> &'static str;
}

/// Extracts the longest runs of alphanumeric characters, lowercased.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, input: &str) -> Vec<String> {
        input
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty() && token.len() <= MAX_TERM_LENGTH)
            .map(|token| token.to_lowercase())
            .collect()
    }

    fn name(&self) -> &'static str {
        "word"
    }
}

/// Emits the trimmed input as a single term; useful for exact-match fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrivialTokenizer;

impl Tokenizer for TrivialTokenizer {
    fn tokenize(&self, input: &str) -> Vec<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_TERM_LENGTH {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        }
    }

    fn name(&self) -> &'static str {
        "trivial"
    }
}

/// Creates a tokenizer by its stable name.
pub fn create_tokenizer(name: &str) -> Result<Box<dyn Tokenizer>> {
    match name {
        "word" => Ok(Box::new(WordTokenizer)),
        "trivial" => Ok(Box::new(TrivialTokenizer)),
        other => Err(Error::invalid_arg(
            "tokenizer",
            format!("unknown tokenizer '{other}'"),
        )),
    }
}
