// Per-subgroup and per-pair result tables.
//
// BTreeMaps keep iteration (and thus persisted artifacts) deterministic.

use std::collections::BTreeMap;

/// Word -> number of documents in which the word co-occurs with the
/// subgroup term. The subgroup's own row is excluded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoOccurrenceTable {
    pub counts: BTreeMap<String, u64>,
}

/// Word -> pointwise mutual information with the subgroup term.
/// Pairs with zero joint probability are absent, not imputed to zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PmiTable {
    pub scores: BTreeMap<String, f64>,
}

/// Word -> normalized PMI, bounded in [-1, 1] wherever defined.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NpmiTable {
    pub scores: BTreeMap<String, f64>,
}

/// The three single-subgroup tables, cached together per identity term.
#[derive(Debug, Clone, PartialEq)]
pub struct SubgroupTables {
    pub cooc: CoOccurrenceTable,
    pub pmi: PmiTable,
    pub npmi: NpmiTable,
}

/// One row of the pairwise bias table.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedBiasRow {
    pub word: String,
    pub npmi1: f64,
    pub npmi2: f64,
    pub count1: u64,
    pub count2: u64,
    /// `npmi1 - npmi2`: positive means the word leans toward subgroup 1.
    pub bias: f64,
}

/// Pairwise nPMI bias over the words shared by both subgroups' tables.
///
/// `subgroup1`/`subgroup2` are in canonical (sorted) order; rows are sorted
/// by bias ascending, so the words most associated with subgroup 2 come first.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedBiasTable {
    pub subgroup1: String,
    pub subgroup2: String,
    pub rows: Vec<PairedBiasRow>,
}

impl PairedBiasTable {
    /// The same table oriented the other way: subgroups swapped, bias
    /// negated, rows re-sorted. Consumers that asked for `(B, A)` against
    /// the canonical `(A, B)` artifact relabel through this.
    pub fn reversed(&self) -> Self {
        let mut rows: Vec<PairedBiasRow> = self
            .rows
            .iter()
            .map(|r| PairedBiasRow {
                word: r.word.clone(),
                npmi1: r.npmi2,
                npmi2: r.npmi1,
                count1: r.count2,
                count2: r.count1,
                bias: -r.bias,
            })
            .collect();
        sort_rows(&mut rows);
        Self {
            subgroup1: self.subgroup2.clone(),
            subgroup2: self.subgroup1.clone(),
            rows,
        }
    }

    pub fn bias_for(&self, word: &str) -> Option<f64> {
        self.rows.iter().find(|r| r.word == word).map(|r| r.bias)
    }
}

/// Canonical row order: bias ascending, word ascending on ties.
pub fn sort_rows(rows: &mut [PairedBiasRow]) {
    rows.sort_by(|a, b| {
        a.bias
            .partial_cmp(&b.bias)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.word.cmp(&b.word))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PairedBiasTable {
        PairedBiasTable {
            subgroup1: "he".to_string(),
            subgroup2: "she".to_string(),
            rows: vec![
                PairedBiasRow {
                    word: "nurse".to_string(),
                    npmi1: -0.2,
                    npmi2: 0.3,
                    count1: 4,
                    count2: 9,
                    bias: -0.5,
                },
                PairedBiasRow {
                    word: "doctor".to_string(),
                    npmi1: 0.4,
                    npmi2: 0.1,
                    count1: 11,
                    count2: 5,
                    bias: 0.3,
                },
            ],
        }
    }

    #[test]
    fn reversed_negates_bias_over_same_word_set() {
        let t = table();
        let r = t.reversed();
        assert_eq!(r.subgroup1, "she");
        assert_eq!(r.subgroup2, "he");
        assert_eq!(r.rows.len(), t.rows.len());
        for row in &t.rows {
            assert_eq!(r.bias_for(&row.word), Some(-row.bias));
        }
        // Re-sorted ascending: doctor (-0.3) now precedes nurse (0.5).
        assert_eq!(r.rows[0].word, "doctor");
    }

    #[test]
    fn reversed_twice_is_identity() {
        let t = table();
        assert_eq!(t.reversed().reversed(), t);
    }
}
