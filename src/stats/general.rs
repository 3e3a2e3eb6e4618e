// General corpus statistics: vocabulary sizes, missing texts, duplication.

use serde::{Deserialize, Serialize};

use crate::config::TOP_VOCAB_N;
use crate::vocab::{VocabEntry, Vocabulary};

/// Headline numbers shown at the top of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralStats {
    /// Distinct words in the full vocabulary.
    #[serde(rename = "total words")]
    pub total_words: usize,
    /// Distinct words after closed-class filtering.
    #[serde(rename = "total open words")]
    pub total_open_words: usize,
    /// Records whose text field was missing or null (not empty strings).
    #[serde(rename = "text nan count")]
    pub text_nan_count: usize,
    /// Fraction of documents that duplicate an earlier document.
    #[serde(rename = "duplicate fraction")]
    pub duplicate_fraction: f64,
}

impl GeneralStats {
    pub fn new(
        vocab: &Vocabulary,
        filtered: &Vocabulary,
        text_nan_count: usize,
        duplicate_fraction: f64,
    ) -> Self {
        Self {
            total_words: vocab.len(),
            total_open_words: filtered.len(),
            text_nan_count,
            duplicate_fraction,
        }
    }
}

/// The most frequent open-class words, for display. Proportions are the
/// filtered vocabulary's, so they do not sum to 1 over this subset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TopVocab {
    pub rows: Vec<(String, VocabEntry)>,
}

impl TopVocab {
    pub fn from_filtered(filtered: &Vocabulary) -> Self {
        Self {
            rows: filtered.top_n(TOP_VOCAB_N),
        }
    }
}
