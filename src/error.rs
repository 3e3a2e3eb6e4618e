// Error taxonomy for the measurement pipeline.
//
// Three classes matter to callers: configuration errors (rejected before any
// computation starts), degenerate-input errors (fatal for the operation that
// hit them), and cache corruption (raised only after the defensive column
// re-normalization in the decoders has given up). Nothing here is retried.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A bias computation was requested for an identity term that is not in
    /// the available-terms set (absent from the vocabulary, or below the
    /// minimum count). Checked up front, never discovered mid-computation.
    #[error(
        "subgroup `{term}` is not available: it must appear in the vocabulary \
         at least {min_count} times"
    )]
    UnavailableSubgroup { term: String, min_count: u64 },

    /// The corpus cannot support the requested statistic (empty corpus,
    /// zero total word count).
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// A persisted artifact failed to parse even after re-deriving the
    /// canonical index and column names from its legacy layout.
    #[error("cached artifact `{artifact}` is corrupt: {reason}")]
    CacheCorruption { artifact: String, reason: String },

    /// An internal prerequisite slot was empty after preparation. This is an
    /// invariant breach, not the load-only "absent" case (which is `Ok(None)`).
    #[error("artifact `{0}` was not prepared")]
    MissingArtifact(&'static str),

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corpus source error: {0}")]
    Source(String),
}

impl Error {
    /// Wrap a decode failure with the artifact name it came from.
    pub fn corrupt(artifact: &str, reason: impl std::fmt::Display) -> Self {
        Error::CacheCorruption {
            artifact: artifact.to_string(),
            reason: reason.to_string(),
        }
    }
}
