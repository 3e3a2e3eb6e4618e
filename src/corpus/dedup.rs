// Duplicate detection seam.
//
// The general statistics only need the duplicate fraction; the full
// per-string counts are optional and skipped when the caller doesn't want
// them. ExactDuplicateDetector is the stock implementation: exact string
// equality after trimming.

use std::collections::HashMap;

use crate::error::Result;

/// Result of a duplicate scan over the extracted texts.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateStats {
    /// Fraction of documents that are repeats of an earlier document.
    pub fraction: f64,
    /// Duplicated string -> total occurrence count. Only populated when the
    /// caller asked for the listing.
    pub counts: Option<HashMap<String, usize>>,
}

/// Anything that can measure duplication over a list of texts.
pub trait DuplicateDetector {
    fn detect(&self, texts: &[String], list_duplicates: bool) -> Result<DuplicateStats>;
}

/// Counts exact repeats of whole documents.
#[derive(Debug, Default)]
pub struct ExactDuplicateDetector;

impl DuplicateDetector for ExactDuplicateDetector {
    fn detect(&self, texts: &[String], list_duplicates: bool) -> Result<DuplicateStats> {
        if texts.is_empty() {
            return Ok(DuplicateStats {
                fraction: 0.0,
                counts: list_duplicates.then(HashMap::new),
            });
        }

        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        for text in texts {
            *occurrences.entry(text.trim()).or_insert(0) += 1;
        }

        // Every copy beyond the first counts as a duplicate document.
        let duplicate_docs: usize = occurrences.values().map(|&n| n - 1).sum();
        let fraction = duplicate_docs as f64 / texts.len() as f64;

        let counts = list_duplicates.then(|| {
            occurrences
                .into_iter()
                .filter(|(_, n)| *n > 1)
                .map(|(s, n)| (s.to_string(), n))
                .collect()
        });

        Ok(DuplicateStats { fraction, counts })
    }
}
