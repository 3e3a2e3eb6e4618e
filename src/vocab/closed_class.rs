// The fixed closed-class word set.
//
// English stopwords from the stop-words crate, plus contraction fragments
// the tokenizer strands when it splits on word boundaries ("didn't" ->
// "didn", "t"), plus small number words-as-digits. Matches what the cached
// filtered vocabularies were built with, so changing it invalidates caches.

use std::collections::HashSet;

use stop_words::{get, LANGUAGE};

/// Fragments left behind by word-boundary tokenization of contractions,
/// plus a few high-frequency near-stopwords.
const EXTRA_CLOSED_CLASS: &[&str] = &[
    "t", "n", "ll", "d", "wasn", "weren", "won", "aren", "wouldn", "shouldn",
    "didn", "don", "hasn", "ain", "couldn", "doesn", "hadn", "haven", "isn",
    "mightn", "mustn", "needn", "shan", "would", "could", "dont", "u",
];

/// Build the full closed-class set.
pub fn closed_class_words() -> HashSet<String> {
    let mut words: HashSet<String> = get(LANGUAGE::English).into_iter().collect();
    words.extend(EXTRA_CLOSED_CLASS.iter().map(|w| w.to_string()));
    words.extend((0..=20).map(|i: u32| i.to_string()));
    words
}
