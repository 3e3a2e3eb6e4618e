// Co-occurrence / nPMI bias engine.
//
// Works at document level: two words co-occur when both appear anywhere in
// the same document. Probabilities are document frequencies over the corpus.
// Results cache at two granularities: three tables per identity term (so a
// third subgroup reuses two already-cached single-term results) and one
// joint table per canonically-ordered pair.

pub mod tables;

pub use tables::{
    CoOccurrenceTable, NpmiTable, PairedBiasRow, PairedBiasTable, PmiTable, SubgroupTables,
};

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{ArtifactKey, CacheStore};
use crate::corpus::{DatasetIdentity, TokenizedCorpus};
use crate::error::{Error, Result};
use crate::vocab::Vocabulary;

/// The identity terms that occur often enough to compare. Cached as a small
/// JSON record because recomputing it means a scan against the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AvailableTerms {
    #[serde(rename = "available terms")]
    pub terms: Vec<String>,
}

/// The nPMI bias core. Reads the vocabulary and tokenized corpus by
/// reference; owns its per-subgroup result cache.
pub struct CoOccurrenceEngine<'a> {
    vocab: &'a Vocabulary,
    corpus: &'a TokenizedCorpus,
    cache: &'a CacheStore,
    identity: &'a DatasetIdentity,
    term_list: Vec<String>,
    min_count: u64,
    /// word -> number of documents containing it; built once, on first use.
    doc_freq: Option<HashMap<String, u64>>,
    /// In-memory per-subgroup results for this session.
    subgroups: HashMap<String, SubgroupTables>,
}

impl<'a> CoOccurrenceEngine<'a> {
    pub fn new(
        vocab: &'a Vocabulary,
        corpus: &'a TokenizedCorpus,
        cache: &'a CacheStore,
        identity: &'a DatasetIdentity,
        term_list: Vec<String>,
        min_count: u64,
    ) -> Self {
        Self {
            vocab,
            corpus,
            cache,
            identity,
            term_list,
            min_count,
            doc_freq: None,
            subgroups: HashMap::new(),
        }
    }

    fn key(&self, name: &str) -> ArtifactKey {
        ArtifactKey::new(self.identity, name)
    }

    /// The configured terms present in the vocabulary at least `min_count`
    /// times. A cached non-empty record is trusted as-is; an empty one is
    /// recomputed (it usually predates the vocabulary being built).
    pub fn available_terms(&mut self, load_only: bool) -> Result<Option<Vec<String>>> {
        let key = self.key("npmi_terms.json");
        if let Some(record) = self.cache.load_cached::<AvailableTerms>(&key)? {
            if !record.terms.is_empty() {
                return Ok(Some(record.terms));
            }
        }
        if load_only {
            return Ok(None);
        }
        let terms: Vec<String> = self
            .term_list
            .iter()
            .filter(|term| {
                self.vocab
                    .get(term)
                    .is_some_and(|e| e.count >= self.min_count)
            })
            .cloned()
            .collect();
        info!(available = terms.len(), of = self.term_list.len(), "Scanned identity terms");
        self.cache.persist(&key, &AvailableTerms { terms: terms.clone() })?;
        Ok(Some(terms))
    }

    /// Compute the three single-subgroup tables afresh.
    ///
    /// Co-occurrence counts documents, not token positions: each document
    /// containing `term` contributes one count per distinct other word in it.
    /// The term's own row is excluded.
    pub fn calc_metrics(&mut self, term: &str) -> Result<SubgroupTables> {
        if self.corpus.is_empty() {
            return Err(Error::DegenerateInput(
                "cannot compute co-occurrence over an empty corpus".to_string(),
            ));
        }
        let n_docs = self.corpus.len() as f64;

        let mut term_docs = 0u64;
        let mut cooc: BTreeMap<String, u64> = BTreeMap::new();
        for doc in self.corpus.docs() {
            let distinct: HashSet<&str> = doc.iter().map(|t| t.as_str()).collect();
            if !distinct.contains(term) {
                continue;
            }
            term_docs += 1;
            for word in distinct {
                if word != term {
                    *cooc.entry(word.to_string()).or_insert(0) += 1;
                }
            }
        }
        debug!(term, term_docs, cooc_words = cooc.len(), "Counted co-occurrence");

        let corpus = self.corpus;
        let doc_freq = self
            .doc_freq
            .get_or_insert_with(|| document_frequencies(corpus));

        let p_term = term_docs as f64 / n_docs;
        let mut pmi = BTreeMap::new();
        let mut npmi = BTreeMap::new();
        for (word, &count) in &cooc {
            let p_joint = count as f64 / n_docs;
            let p_word = doc_freq.get(word).copied().unwrap_or(0) as f64 / n_docs;
            let score = (p_joint / (p_term * p_word)).ln();
            pmi.insert(word.clone(), score);
            // When the pair appears in every document, -ln(p) is zero and
            // nPMI is undefined; the word is dropped, as on load.
            let denom = -p_joint.ln();
            if denom > 0.0 {
                npmi.insert(word.clone(), score / denom);
            }
        }

        Ok(SubgroupTables {
            cooc: CoOccurrenceTable { counts: cooc },
            pmi: PmiTable { scores: pmi },
            npmi: NpmiTable { scores: npmi },
        })
    }

    /// Pairwise nPMI bias for two identity terms.
    ///
    /// The pair is canonicalized by sorting the names, so `(A, B)` and
    /// `(B, A)` resolve to the same cached artifact. Sign convention:
    /// `bias = npmi(first-sorted) - npmi(second-sorted)`; use
    /// [`PairedBiasTable::reversed`] for the opposite orientation.
    pub fn calc_paired_metrics(&mut self, term_a: &str, term_b: &str) -> Result<PairedBiasTable> {
        let (first, second) = canonical_pair(term_a, term_b);

        // Reject unavailable terms before any computation starts.
        let available = self
            .available_terms(false)?
            .ok_or(Error::MissingArtifact("available terms"))?;
        for term in [&first, &second] {
            if !available.iter().any(|t| t == term) {
                return Err(Error::UnavailableSubgroup {
                    term: term.to_string(),
                    min_count: self.min_count,
                });
            }
        }

        let joint_key = self.key(&format!("npmi/{first}-{second}_bias.csv"));
        if let Some(cached) = self.cache.load_cached::<PairedBiasTable>(&joint_key)? {
            return Ok(cached);
        }

        // Pull in whatever single-term results exist; compute only the rest.
        self.ensure_subgroup(&first)?;
        self.ensure_subgroup(&second)?;
        let t1 = self
            .subgroups
            .get(&first)
            .ok_or(Error::MissingArtifact("subgroup tables"))?;
        let t2 = self
            .subgroups
            .get(&second)
            .ok_or(Error::MissingArtifact("subgroup tables"))?;

        let table = join_pair(&first, &second, t1, t2);
        self.cache.persist(&joint_key, &table)?;
        Ok(table)
    }

    /// Make one subgroup's tables resident: session cache, then disk (all
    /// three artifacts must be present), then fresh computation.
    fn ensure_subgroup(&mut self, term: &str) -> Result<()> {
        if self.subgroups.contains_key(term) {
            return Ok(());
        }

        let cooc_key = self.key(&format!("npmi/{term}_cooc.csv"));
        let pmi_key = self.key(&format!("npmi/{term}_pmi.csv"));
        let npmi_key = self.key(&format!("npmi/{term}_npmi.csv"));

        if let (Some(cooc), Some(pmi), Some(npmi)) = (
            self.cache.load_cached::<CoOccurrenceTable>(&cooc_key)?,
            self.cache.load_cached::<PmiTable>(&pmi_key)?,
            self.cache.load_cached::<NpmiTable>(&npmi_key)?,
        ) {
            debug!(term, "Loaded subgroup tables from cache");
            self.subgroups
                .insert(term.to_string(), SubgroupTables { cooc, pmi, npmi });
            return Ok(());
        }

        info!(term, "Computing subgroup nPMI statistics");
        let tables = self.calc_metrics(term)?;
        self.cache.persist(&cooc_key, &tables.cooc)?;
        self.cache.persist(&pmi_key, &tables.pmi)?;
        self.cache.persist(&npmi_key, &tables.npmi)?;
        self.subgroups.insert(term.to_string(), tables);
        Ok(())
    }
}

/// Sort two term names into canonical order.
fn canonical_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Inner-join two subgroups' nPMI tables and attach the bias column.
/// Words absent from either table are dropped; nPMI is undefined for them.
fn join_pair(
    first: &str,
    second: &str,
    t1: &SubgroupTables,
    t2: &SubgroupTables,
) -> PairedBiasTable {
    let mut rows: Vec<PairedBiasRow> = t1
        .npmi
        .scores
        .iter()
        .filter_map(|(word, &npmi1)| {
            let npmi2 = *t2.npmi.scores.get(word)?;
            Some(PairedBiasRow {
                word: word.clone(),
                npmi1,
                npmi2,
                count1: t1.cooc.counts.get(word).copied().unwrap_or(0),
                count2: t2.cooc.counts.get(word).copied().unwrap_or(0),
                bias: npmi1 - npmi2,
            })
        })
        .collect();
    tables::sort_rows(&mut rows);
    PairedBiasTable {
        subgroup1: first.to_string(),
        subgroup2: second.to_string(),
        rows,
    }
}

/// Number of documents each word appears in.
fn document_frequencies(corpus: &TokenizedCorpus) -> HashMap<String, u64> {
    let mut freq: HashMap<String, u64> = HashMap::new();
    for doc in corpus.docs() {
        let distinct: HashSet<&str> = doc.iter().map(|t| t.as_str()).collect();
        for word in distinct {
            *freq.entry(word.to_string()).or_insert(0) += 1;
        }
    }
    freq
}
