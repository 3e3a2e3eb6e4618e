// Statistics orchestrator: the dependency chain of derived artifacts.
//
// One load-or-prepare operation per artifact, each following the CacheStore
// contract. A missing upstream artifact triggers preparation of exactly the
// missing prerequisites, never a full pipeline rerun. In-memory slots are
// `Option<T>`: absent-until-prepared is a type-level fact, not a null check.

pub mod general;
pub mod lengths;

use tracing::{info, warn};

use crate::cache::{ArtifactKey, ArtifactStore, CacheStore};
use crate::config::Config;
use crate::corpus::{
    CorpusSource, DatasetIdentity, DuplicateDetector, TokenizedCorpus, Tokenizer,
};
use crate::error::{Error, Result};
use crate::npmi::{CoOccurrenceEngine, PairedBiasTable};
use crate::vocab::{self, closed_class::closed_class_words, Vocabulary};

use general::{GeneralStats, TopVocab};
use lengths::LengthStats;

/// Text extracted from the source records, plus how many records had no
/// text at all (missing or null field, not empty strings).
struct ExtractedText {
    texts: Vec<String>,
    nan_count: usize,
}

/// Owns every derived artifact for one dataset identity.
pub struct DatasetStatistics {
    identity: DatasetIdentity,
    cache: CacheStore,
    source: Box<dyn CorpusSource>,
    tokenizer: Tokenizer,
    dedup: Box<dyn DuplicateDetector>,
    term_list: Vec<String>,
    min_vocab_count: u64,

    extracted: Option<ExtractedText>,
    tokenized: Option<TokenizedCorpus>,
    vocab: Option<Vocabulary>,
    filtered_vocab: Option<Vocabulary>,
    length_stats: Option<LengthStats>,
    general_stats: Option<GeneralStats>,
    top_vocab: Option<TopVocab>,
}

impl DatasetStatistics {
    pub fn new(
        identity: DatasetIdentity,
        config: &Config,
        store: Box<dyn ArtifactStore>,
        source: Box<dyn CorpusSource>,
        tokenizer: Tokenizer,
        dedup: Box<dyn DuplicateDetector>,
    ) -> Self {
        Self {
            identity,
            cache: CacheStore::new(store, config.use_cache, config.save),
            source,
            tokenizer,
            dedup,
            term_list: config.identity_terms(),
            min_vocab_count: config.min_vocab_count,
            extracted: None,
            tokenized: None,
            vocab: None,
            filtered_vocab: None,
            length_stats: None,
            general_stats: None,
            top_vocab: None,
        }
    }

    pub fn identity(&self) -> &DatasetIdentity {
        &self.identity
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    fn key(&self, name: &str) -> ArtifactKey {
        ArtifactKey::new(&self.identity, name)
    }

    // --- Extraction (collaborator output; held in memory, not cached) ---

    fn prepare_extracted(&mut self) -> Result<()> {
        if self.extracted.is_some() {
            return Ok(());
        }
        let records = self.source.records()?;
        let nan_count = records.iter().filter(|r| r.text.is_none()).count();
        if nan_count > 0 {
            warn!(nan_count, "Records with missing text field");
        }
        let texts = records
            .into_iter()
            .map(|r| r.text.unwrap_or_default())
            .collect();
        self.extracted = Some(ExtractedText { texts, nan_count });
        Ok(())
    }

    // --- Tokenized corpus ---

    pub fn load_or_prepare_tokenized(
        &mut self,
        load_only: bool,
    ) -> Result<Option<&TokenizedCorpus>> {
        if self.tokenized.is_none() {
            let key = self.key("tokenized.csv");
            if !load_only && !self.cache.is_cached(&key) {
                self.prepare_extracted()?;
            }
            let tokenizer = self.tokenizer.clone();
            let extracted = self.extracted.as_ref();
            self.tokenized = self.cache.load_or_compute(&key, load_only, || {
                let extracted =
                    extracted.ok_or(Error::MissingArtifact("extracted text"))?;
                info!(docs = extracted.texts.len(), "Tokenizing corpus");
                Ok(TokenizedCorpus::new(
                    extracted.texts.iter().map(|t| (*tokenizer)(t)).collect(),
                ))
            })?;
        }
        Ok(self.tokenized.as_ref())
    }

    fn require_tokenized(&mut self) -> Result<&TokenizedCorpus> {
        self.load_or_prepare_tokenized(false)?;
        self.tokenized
            .as_ref()
            .ok_or(Error::MissingArtifact("tokenized corpus"))
    }

    // --- Vocabulary (filtered vocabulary rides along) ---

    pub fn load_or_prepare_vocab(&mut self, load_only: bool) -> Result<Option<&Vocabulary>> {
        if self.vocab.is_none() {
            let key = self.key("vocab_counts.csv");
            if !load_only && !self.cache.is_cached(&key) {
                self.require_tokenized()?;
            }
            let corpus = self.tokenized.as_ref();
            self.vocab = self.cache.load_or_compute(&key, load_only, || {
                let corpus = corpus.ok_or(Error::MissingArtifact("tokenized corpus"))?;
                info!("Counting vocabulary frequencies");
                vocab::with_proportions(vocab::count_frequencies(corpus))
            })?;
        }
        // The filtered vocabulary is recomputed from the full one on every
        // path (fresh or loaded); it is cheap and never persisted alone.
        if self.filtered_vocab.is_none() {
            if let Some(v) = self.vocab.as_ref() {
                self.filtered_vocab = Some(vocab::filter_closed_class(v, &closed_class_words())?);
            }
        }
        Ok(self.vocab.as_ref())
    }

    fn require_vocab(&mut self) -> Result<&Vocabulary> {
        self.load_or_prepare_vocab(false)?;
        self.vocab
            .as_ref()
            .ok_or(Error::MissingArtifact("vocabulary"))
    }

    pub fn filtered_vocab(&mut self) -> Result<&Vocabulary> {
        self.load_or_prepare_vocab(false)?;
        self.filtered_vocab
            .as_ref()
            .ok_or(Error::MissingArtifact("filtered vocabulary"))
    }

    // --- Length statistics ---

    pub fn load_or_prepare_length_stats(
        &mut self,
        load_only: bool,
    ) -> Result<Option<&LengthStats>> {
        if self.length_stats.is_none() {
            let key = self.key("length_stats.json");
            if !load_only && !self.cache.is_cached(&key) {
                self.require_tokenized()?;
            }
            let corpus = self.tokenized.as_ref();
            self.length_stats = self.cache.load_or_compute(&key, load_only, || {
                let corpus = corpus.ok_or(Error::MissingArtifact("tokenized corpus"))?;
                lengths::compute(corpus)
            })?;
        }
        Ok(self.length_stats.as_ref())
    }

    // --- General statistics (plus the top open vocabulary) ---

    pub fn load_or_prepare_general_stats(
        &mut self,
        load_only: bool,
    ) -> Result<Option<&GeneralStats>> {
        if self.general_stats.is_none() {
            let key = self.key("general_stats.json");
            if !load_only && !self.cache.is_cached(&key) {
                self.prepare_extracted()?;
                self.require_vocab()?;
            }
            let vocab = self.vocab.as_ref();
            let filtered = self.filtered_vocab.as_ref();
            let extracted = self.extracted.as_ref();
            let dedup = self.dedup.as_ref();
            self.general_stats = self.cache.load_or_compute(&key, load_only, || {
                let vocab = vocab.ok_or(Error::MissingArtifact("vocabulary"))?;
                let filtered = filtered.ok_or(Error::MissingArtifact("filtered vocabulary"))?;
                let extracted = extracted.ok_or(Error::MissingArtifact("extracted text"))?;
                // The duplicate listing is not needed here, only the fraction.
                let dups = dedup.detect(&extracted.texts, false)?;
                Ok(GeneralStats::new(
                    vocab,
                    filtered,
                    extracted.nan_count,
                    dups.fraction,
                ))
            })?;
        }
        self.load_or_prepare_top_vocab(load_only)?;
        Ok(self.general_stats.as_ref())
    }

    pub fn load_or_prepare_top_vocab(&mut self, load_only: bool) -> Result<Option<&TopVocab>> {
        if self.top_vocab.is_none() {
            let key = self.key("sorted_top_vocab.csv");
            if !load_only && !self.cache.is_cached(&key) {
                self.filtered_vocab()?;
            }
            let filtered = self.filtered_vocab.as_ref();
            self.top_vocab = self.cache.load_or_compute(&key, load_only, || {
                let filtered = filtered.ok_or(Error::MissingArtifact("filtered vocabulary"))?;
                Ok(TopVocab::from_filtered(filtered))
            })?;
        }
        Ok(self.top_vocab.as_ref())
    }

    // --- nPMI delegation ---

    /// Build the co-occurrence engine over the prepared vocabulary and
    /// corpus. The engine borrows them; drop it before preparing more
    /// artifacts.
    pub fn npmi_engine(&mut self) -> Result<CoOccurrenceEngine<'_>> {
        self.require_vocab()?;
        self.require_tokenized()?;
        let vocab = self
            .vocab
            .as_ref()
            .ok_or(Error::MissingArtifact("vocabulary"))?;
        let corpus = self
            .tokenized
            .as_ref()
            .ok_or(Error::MissingArtifact("tokenized corpus"))?;
        Ok(CoOccurrenceEngine::new(
            vocab,
            corpus,
            &self.cache,
            &self.identity,
            self.term_list.clone(),
            self.min_vocab_count,
        ))
    }

    /// Identity terms available for bias comparisons.
    pub fn available_terms(&mut self, load_only: bool) -> Result<Option<Vec<String>>> {
        // A load-only request must not force vocabulary or tokenization; it
        // is answered from the cached terms record alone. The engine would
        // give the same answer, but building it prepares the tokenized
        // corpus, which a load-only caller never wants.
        if load_only {
            let key = self.key("npmi_terms.json");
            return Ok(self
                .cache
                .load_cached::<crate::npmi::AvailableTerms>(&key)?
                .filter(|r| !r.terms.is_empty())
                .map(|r| r.terms));
        }
        self.npmi_engine()?.available_terms(load_only)
    }

    /// Joint nPMI bias for a subgroup pair, in canonical order.
    pub fn load_or_prepare_joint_bias(
        &mut self,
        term_a: &str,
        term_b: &str,
    ) -> Result<PairedBiasTable> {
        self.npmi_engine()?.calc_paired_metrics(term_a, term_b)
    }
}
