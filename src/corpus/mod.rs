// Corpus types and collaborator seams.
//
// The pipeline never talks to a dataset backend directly: it consumes a
// CorpusSource (records with a text field and optional label field), a
// tokenizer closure, and a DuplicateDetector. Each is passed at construction
// so tests can substitute their own.

pub mod dedup;
pub mod source;
pub mod tokenize;

pub use dedup::{DuplicateDetector, DuplicateStats, ExactDuplicateDetector};
pub use source::{CorpusSource, JsonlSource, Record};
pub use tokenize::{default_tokenizer, Tokenizer};

use serde::{Deserialize, Serialize};

/// Identifies the exact slice of data a cache directory describes.
///
/// Two runs with the same identity share artifacts; changing any field
/// (including the text field) addresses a fresh cache subdirectory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetIdentity {
    /// Dataset name (e.g. a file stem or registry name)
    pub dataset: String,
    /// Dataset configuration name
    pub config: String,
    /// Split under analysis (e.g. "train")
    pub split: String,
    /// Which field of each record carries the text
    pub text_field: String,
}

impl DatasetIdentity {
    pub fn new(dataset: &str, config: &str, split: &str, text_field: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            config: config.to_string(),
            split: split.to_string(),
            text_field: text_field.to_string(),
        }
    }

    /// Directory name for this identity under the cache root.
    pub fn dir_name(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            sanitize(&self.dataset),
            sanitize(&self.config),
            sanitize(&self.split),
            sanitize(&self.text_field)
        )
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c == '/' || c == '\\' || c.is_whitespace() { '-' } else { c })
        .collect()
}

/// An ordered sequence of tokenized documents.
///
/// Immutable once produced; everything downstream (vocabulary, lengths,
/// co-occurrence) reads it by reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenizedCorpus {
    docs: Vec<Vec<String>>,
}

impl TokenizedCorpus {
    pub fn new(docs: Vec<Vec<String>>) -> Self {
        Self { docs }
    }

    pub fn docs(&self) -> &[Vec<String>] {
        &self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Token count per document, in corpus order.
    pub fn lengths(&self) -> Vec<usize> {
        self.docs.iter().map(|d| d.len()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_name_joins_identity_parts() {
        let id = DatasetIdentity::new("c4", "en", "train", "text");
        assert_eq!(id.dir_name(), "c4_en_train_text");
    }

    #[test]
    fn dir_name_sanitizes_separators() {
        let id = DatasetIdentity::new("allenai/c4", "en", "train", "text");
        assert_eq!(id.dir_name(), "allenai-c4_en_train_text");
    }
}
