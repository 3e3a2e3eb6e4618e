use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// The minimum number of times an identity term must occur in the vocabulary
/// to be offered for bias comparisons.
pub const MIN_VOCAB_COUNT: u64 = 10;

/// How many documents a single vocabulary-counting batch covers.
pub const VOCAB_BATCH_SIZE: usize = 2000;

/// How many top open-class words the general statistics keep for display.
pub const TOP_VOCAB_N: usize = 100;

/// The fixed identity-term list offered for subgroup comparisons.
///
/// Term lists are deliberately not user-extensible; changing this set changes
/// the cache contents, so it lives here rather than in the environment.
pub const IDENTITY_TERMS: &[&str] = &[
    "man",
    "woman",
    "non-binary",
    "gay",
    "lesbian",
    "queer",
    "trans",
    "straight",
    "cis",
    "she",
    "her",
    "hers",
    "he",
    "him",
    "his",
    "they",
    "them",
    "their",
    "theirs",
    "himself",
    "herself",
];

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Everything
/// has a default, so `loupe status` works out of the box.
pub struct Config {
    /// Root directory holding one cache subdirectory per dataset identity.
    pub cache_root: PathBuf,
    /// Load cached artifacts when they exist instead of recomputing.
    pub use_cache: bool,
    /// Persist freshly computed artifacts.
    pub save: bool,
    /// Minimum vocabulary count for an identity term to be "available".
    pub min_vocab_count: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let cache_root = env::var("LOUPE_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_cache_root());

        let use_cache = env_flag("LOUPE_USE_CACHE", true);
        let save = env_flag("LOUPE_SAVE", true);

        let min_vocab_count = match env::var("LOUPE_MIN_VOCAB_COUNT") {
            Ok(v) => v.parse().map_err(|_| {
                anyhow::anyhow!("LOUPE_MIN_VOCAB_COUNT must be a non-negative integer, got `{v}`")
            })?,
            Err(_) => MIN_VOCAB_COUNT,
        };

        Ok(Self {
            cache_root,
            use_cache,
            save,
            min_vocab_count,
        })
    }

    /// The fixed identity-term list as owned strings.
    pub fn identity_terms(&self) -> Vec<String> {
        IDENTITY_TERMS.iter().map(|t| t.to_string()).collect()
    }
}

fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("loupe"))
        .unwrap_or_else(|| PathBuf::from("cache_dir"))
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name).as_deref() {
        Ok("0") | Ok("false") | Ok("no") => false,
        Ok("1") | Ok("true") | Ok("yes") => true,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_terms_are_unique() {
        let mut terms: Vec<_> = IDENTITY_TERMS.to_vec();
        terms.sort_unstable();
        terms.dedup();
        assert_eq!(terms.len(), IDENTITY_TERMS.len());
    }
}
