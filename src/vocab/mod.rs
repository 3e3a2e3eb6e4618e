// Vocabulary counting and proportions.
//
// Counting runs over bounded-size document batches so peak memory tracks the
// batch size, not the corpus size. The batch merge is pure accumulation, so
// the result is independent of the batch size chosen.

pub mod closed_class;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::VOCAB_BATCH_SIZE;
use crate::corpus::TokenizedCorpus;
use crate::error::{Error, Result};

/// Per-word statistics: raw occurrence count and proportion of the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VocabEntry {
    pub count: u64,
    pub proportion: f64,
}

/// Word -> count/proportion mapping. Proportions sum to 1.0 across the map.
///
/// Insertion order is irrelevant; display-oriented consumers use
/// [`Vocabulary::sorted_by_count`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vocabulary {
    entries: HashMap<String, VocabEntry>,
}

impl Vocabulary {
    pub fn from_entries(entries: HashMap<String, VocabEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, word: &str) -> Option<&VocabEntry> {
        self.entries.get(word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VocabEntry)> {
        self.entries.iter()
    }

    pub fn total_count(&self) -> u64 {
        self.entries.values().map(|e| e.count).sum()
    }

    /// Canonical display order: count descending, then word ascending so
    /// ties are stable across runs.
    pub fn sorted_by_count(&self) -> Vec<(&str, &VocabEntry)> {
        let mut rows: Vec<(&str, &VocabEntry)> = self
            .entries
            .iter()
            .map(|(w, e)| (w.as_str(), e))
            .collect();
        rows.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(b.0)));
        rows
    }

    /// The `n` most frequent words in canonical order.
    pub fn top_n(&self, n: usize) -> Vec<(String, VocabEntry)> {
        self.sorted_by_count()
            .into_iter()
            .take(n)
            .map(|(w, e)| (w.to_string(), *e))
            .collect()
    }
}

/// Count every token occurrence across every document.
///
/// Documents are processed in batches of [`VOCAB_BATCH_SIZE`]; each batch
/// accumulates its own map which then merges into the running total.
pub fn count_frequencies(corpus: &TokenizedCorpus) -> HashMap<String, u64> {
    count_frequencies_batched(corpus, VOCAB_BATCH_SIZE)
}

/// Batch-size-parameterized variant, exposed for the batch-independence test.
pub fn count_frequencies_batched(
    corpus: &TokenizedCorpus,
    batch_size: usize,
) -> HashMap<String, u64> {
    let batch_size = batch_size.max(1);
    let mut totals: HashMap<String, u64> = HashMap::new();
    for (i, batch) in corpus.docs().chunks(batch_size).enumerate() {
        let mut batch_counts: HashMap<&str, u64> = HashMap::new();
        for doc in batch {
            for token in doc {
                *batch_counts.entry(token.as_str()).or_insert(0) += 1;
            }
        }
        for (word, count) in batch_counts {
            *totals.entry(word.to_string()).or_insert(0) += count;
        }
        debug!(batch = i, words = totals.len(), "Merged vocabulary batch");
    }
    totals
}

/// Attach proportions (`count / total`) to raw counts.
///
/// Fails with a degenerate-input error when the corpus has no tokens at all,
/// rather than producing a vocabulary full of NaN proportions.
pub fn with_proportions(counts: HashMap<String, u64>) -> Result<Vocabulary> {
    let total: u64 = counts.values().sum();
    if total == 0 {
        return Err(Error::DegenerateInput(
            "total word count is zero; cannot compute proportions".to_string(),
        ));
    }
    let entries = counts
        .into_iter()
        .map(|(word, count)| {
            (
                word,
                VocabEntry {
                    count,
                    proportion: count as f64 / total as f64,
                },
            )
        })
        .collect();
    Ok(Vocabulary::from_entries(entries))
}

/// Remove closed-class words and renormalize proportions over what remains.
///
/// Removal is exact-string and case-sensitive. Stopwords absent from the
/// vocabulary are ignored silently.
pub fn filter_closed_class(
    vocab: &Vocabulary,
    closed_class: &HashSet<String>,
) -> Result<Vocabulary> {
    let kept: HashMap<String, u64> = vocab
        .iter()
        .filter(|(word, _)| !closed_class.contains(*word))
        .map(|(word, entry)| (word.clone(), entry.count))
        .collect();
    if kept.is_empty() {
        return Err(Error::DegenerateInput(
            "no open-class words remain after closed-class filtering".to_string(),
        ));
    }
    with_proportions(kept)
}
