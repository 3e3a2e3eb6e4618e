// Text length statistics over the tokenized corpus.

use serde::{Deserialize, Serialize};

use crate::corpus::TokenizedCorpus;
use crate::error::{Error, Result};

/// Summary of per-document token counts. Mean and standard deviation are
/// rounded to one decimal, matching the persisted artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthStats {
    #[serde(rename = "avg length")]
    pub avg_length: f64,
    #[serde(rename = "std length")]
    pub std_length: f64,
    #[serde(rename = "num lengths")]
    pub num_uniq_lengths: usize,
}

/// Compute length statistics. Errors on an empty corpus rather than
/// reporting a mean of NaN.
pub fn compute(corpus: &TokenizedCorpus) -> Result<LengthStats> {
    let lengths = corpus.lengths();
    if lengths.is_empty() {
        return Err(Error::DegenerateInput(
            "cannot compute length statistics over an empty corpus".to_string(),
        ));
    }

    let n = lengths.len() as f64;
    let mean = lengths.iter().map(|&l| l as f64).sum::<f64>() / n;

    // Sample standard deviation; a single document has no spread.
    let std = if lengths.len() < 2 {
        0.0
    } else {
        let var = lengths
            .iter()
            .map(|&l| (l as f64 - mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        var.sqrt()
    };

    let mut uniq: Vec<usize> = lengths.clone();
    uniq.sort_unstable();
    uniq.dedup();

    Ok(LengthStats {
        avg_length: round1(mean),
        std_length: round1(std),
        num_uniq_lengths: uniq.len(),
    })
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_mean_std_and_unique_lengths() {
        let corpus = TokenizedCorpus::new(vec![
            vec!["a".into(), "b".into(), "c".into()],
            vec!["a".into(), "b".into(), "c".into()],
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
        ]);
        let stats = compute(&corpus).unwrap();
        // lengths 3, 3, 4: mean 3.333 -> 3.3, sample std 0.577 -> 0.6
        assert_eq!(stats.avg_length, 3.3);
        assert_eq!(stats.std_length, 0.6);
        assert_eq!(stats.num_uniq_lengths, 2);
    }

    #[test]
    fn single_document_has_zero_spread() {
        let corpus = TokenizedCorpus::new(vec![vec!["a".into(), "b".into()]]);
        let stats = compute(&corpus).unwrap();
        assert_eq!(stats.avg_length, 2.0);
        assert_eq!(stats.std_length, 0.0);
        assert_eq!(stats.num_uniq_lengths, 1);
    }

    #[test]
    fn empty_corpus_is_degenerate() {
        let err = compute(&TokenizedCorpus::new(vec![])).unwrap_err();
        assert!(matches!(err, Error::DegenerateInput(_)));
    }
}
