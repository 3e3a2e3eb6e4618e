// Pluggable tokenization.
//
// Tokenizer internals are not this crate's concern; the orchestrator just
// holds a closure. The default matches word characters and lowercases,
// which keeps cached vocabularies stable across runs.

use std::sync::Arc;

use regex_lite::Regex;

/// A tokenizer is any pure function from text to an ordered token sequence.
pub type Tokenizer = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Word-boundary tokenizer: lowercased runs of word characters.
pub fn default_tokenizer() -> Tokenizer {
    let word = Regex::new(r"\b\w+\b").unwrap();
    Arc::new(move |text: &str| {
        word.find_iter(&text.to_lowercase())
            .map(|m| m.as_str().to_string())
            .collect()
    })
}
