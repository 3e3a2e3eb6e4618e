// Artifact encodings: CSV for tabular artifacts, JSON for records.
//
// Persisted artifacts have drifted over time (index column saved under
// different names, score columns prefixed with the subgroup term), so every
// decoder first re-derives canonical column identity from whatever layout it
// finds. Only when that fails does it raise CacheCorruption.

use std::collections::BTreeMap;
use std::collections::HashMap;

use csv::StringRecord;

use super::Artifact;
use crate::error::{Error, Result};
use crate::npmi::tables::{
    sort_rows, CoOccurrenceTable, NpmiTable, PairedBiasRow, PairedBiasTable, PmiTable,
};
use crate::npmi::AvailableTerms;
use crate::stats::general::{GeneralStats, TopVocab};
use crate::stats::lengths::LengthStats;
use crate::corpus::TokenizedCorpus;
use crate::vocab::{VocabEntry, Vocabulary};

/// Names the index column has been persisted under across schema versions.
const WORD_COLUMN_VARIANTS: &[&str] = &["word", "vocab", "Unnamed: 0", ""];

fn find_column(headers: &StringRecord, variants: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| variants.iter().any(|v| h == *v))
}

/// Re-derive the word index column from any known legacy name.
fn word_column(headers: &StringRecord, artifact: &str) -> Result<usize> {
    find_column(headers, WORD_COLUMN_VARIANTS)
        .ok_or_else(|| Error::corrupt(artifact, "no recognizable word index column"))
}

/// Locate a value column by its canonical names; in two-column tables fall
/// back to "whichever column is not the word index", which recovers the
/// legacy `{subgroup}-{score}` headers.
fn value_column(
    headers: &StringRecord,
    word_col: usize,
    variants: &[&str],
    artifact: &str,
) -> Result<usize> {
    if let Some(idx) = find_column(headers, variants) {
        return Ok(idx);
    }
    if headers.len() == 2 {
        return Ok(1 - word_col);
    }
    Err(Error::corrupt(
        artifact,
        format!("none of the columns {variants:?} found"),
    ))
}

fn csv_reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new().flexible(true).from_reader(bytes)
}

fn writer_bytes(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    wtr.into_inner()
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))
}

fn parse_u64(field: &str, artifact: &str) -> Result<u64> {
    // Counts written by older tooling came out as floats ("12.0").
    field
        .parse::<u64>()
        .or_else(|_| field.parse::<f64>().map(|f| f as u64))
        .map_err(|_| Error::corrupt(artifact, format!("bad count value `{field}`")))
}

fn parse_f64(field: &str, artifact: &str) -> Result<f64> {
    field
        .parse::<f64>()
        .map_err(|_| Error::corrupt(artifact, format!("bad float value `{field}`")))
}

// ---------------------------------------------------------------------------
// Tokenized corpus: one row per document.
// ---------------------------------------------------------------------------

impl Artifact for TokenizedCorpus {
    fn encode(&self) -> Result<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["text", "length"])?;
        for doc in self.docs() {
            wtr.write_record([doc.join(" "), doc.len().to_string()])?;
        }
        writer_bytes(wtr)
    }

    fn decode(bytes: &[u8], artifact: &str) -> Result<Self> {
        let mut rdr = csv_reader(bytes);
        let headers = rdr.headers()?.clone();
        let text_col = find_column(&headers, &["text", "tokenized_text"])
            .ok_or_else(|| Error::corrupt(artifact, "no text column"))?;
        let mut docs = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let text = record
                .get(text_col)
                .ok_or_else(|| Error::corrupt(artifact, "short row"))?;
            docs.push(text.split_whitespace().map(|t| t.to_string()).collect());
        }
        Ok(TokenizedCorpus::new(docs))
    }
}

// ---------------------------------------------------------------------------
// Vocabulary: word, count, proportion — canonical count-descending order.
// ---------------------------------------------------------------------------

impl Artifact for Vocabulary {
    fn encode(&self) -> Result<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["word", "count", "proportion"])?;
        for (word, entry) in self.sorted_by_count() {
            wtr.write_record([word, &entry.count.to_string(), &entry.proportion.to_string()])?;
        }
        writer_bytes(wtr)
    }

    fn decode(bytes: &[u8], artifact: &str) -> Result<Self> {
        let mut rdr = csv_reader(bytes);
        let headers = rdr.headers()?.clone();
        let word_col = word_column(&headers, artifact)?;
        let count_col = find_column(&headers, &["count", "cnt"])
            .ok_or_else(|| Error::corrupt(artifact, "no count column"))?;
        let prop_col = find_column(&headers, &["proportion", "prop"])
            .ok_or_else(|| Error::corrupt(artifact, "no proportion column"))?;

        let mut entries = HashMap::new();
        for record in rdr.records() {
            let record = record?;
            let word = field(&record, word_col, artifact)?;
            let count = parse_u64(field(&record, count_col, artifact)?, artifact)?;
            let proportion = parse_f64(field(&record, prop_col, artifact)?, artifact)?;
            entries.insert(word.to_string(), VocabEntry { count, proportion });
        }
        Ok(Vocabulary::from_entries(entries))
    }
}

impl Artifact for TopVocab {
    fn encode(&self) -> Result<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["word", "count", "proportion"])?;
        for (word, entry) in &self.rows {
            wtr.write_record([
                word.as_str(),
                &entry.count.to_string(),
                &entry.proportion.to_string(),
            ])?;
        }
        writer_bytes(wtr)
    }

    fn decode(bytes: &[u8], artifact: &str) -> Result<Self> {
        // Same layout as the vocabulary, but row order is meaningful.
        let mut rdr = csv_reader(bytes);
        let headers = rdr.headers()?.clone();
        let word_col = word_column(&headers, artifact)?;
        let count_col = find_column(&headers, &["count", "cnt"])
            .ok_or_else(|| Error::corrupt(artifact, "no count column"))?;
        let prop_col = find_column(&headers, &["proportion", "prop"])
            .ok_or_else(|| Error::corrupt(artifact, "no proportion column"))?;

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push((
                field(&record, word_col, artifact)?.to_string(),
                VocabEntry {
                    count: parse_u64(field(&record, count_col, artifact)?, artifact)?,
                    proportion: parse_f64(field(&record, prop_col, artifact)?, artifact)?,
                },
            ));
        }
        Ok(TopVocab { rows })
    }
}

// ---------------------------------------------------------------------------
// Single-subgroup score tables: word plus one value column.
// ---------------------------------------------------------------------------

fn encode_counts(counts: &BTreeMap<String, u64>, value_header: &str) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["word", value_header])?;
    for (word, count) in counts {
        wtr.write_record([word.as_str(), &count.to_string()])?;
    }
    writer_bytes(wtr)
}

fn encode_scores(scores: &BTreeMap<String, f64>, value_header: &str) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["word", value_header])?;
    for (word, score) in scores {
        wtr.write_record([word.as_str(), &score.to_string()])?;
    }
    writer_bytes(wtr)
}

fn decode_scores(
    bytes: &[u8],
    variants: &[&str],
    artifact: &str,
) -> Result<BTreeMap<String, f64>> {
    let mut rdr = csv_reader(bytes);
    let headers = rdr.headers()?.clone();
    let word_col = word_column(&headers, artifact)?;
    let value_col = value_column(&headers, word_col, variants, artifact)?;
    let mut scores = BTreeMap::new();
    for record in rdr.records() {
        let record = record?;
        scores.insert(
            field(&record, word_col, artifact)?.to_string(),
            parse_f64(field(&record, value_col, artifact)?, artifact)?,
        );
    }
    Ok(scores)
}

impl Artifact for CoOccurrenceTable {
    fn encode(&self) -> Result<Vec<u8>> {
        encode_counts(&self.counts, "count")
    }

    fn decode(bytes: &[u8], artifact: &str) -> Result<Self> {
        let mut rdr = csv_reader(bytes);
        let headers = rdr.headers()?.clone();
        let word_col = word_column(&headers, artifact)?;
        let value_col = value_column(&headers, word_col, &["count", "cnt"], artifact)?;
        let mut counts = BTreeMap::new();
        for record in rdr.records() {
            let record = record?;
            counts.insert(
                field(&record, word_col, artifact)?.to_string(),
                parse_u64(field(&record, value_col, artifact)?, artifact)?,
            );
        }
        Ok(Self { counts })
    }
}

impl Artifact for PmiTable {
    fn encode(&self) -> Result<Vec<u8>> {
        encode_scores(&self.scores, "pmi")
    }

    fn decode(bytes: &[u8], artifact: &str) -> Result<Self> {
        Ok(Self {
            scores: decode_scores(bytes, &["pmi"], artifact)?,
        })
    }
}

impl Artifact for NpmiTable {
    fn encode(&self) -> Result<Vec<u8>> {
        encode_scores(&self.scores, "npmi")
    }

    fn decode(bytes: &[u8], artifact: &str) -> Result<Self> {
        Ok(Self {
            scores: decode_scores(bytes, &["npmi"], artifact)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Paired bias table: subgroup names are carried in the column headers.
// ---------------------------------------------------------------------------

impl Artifact for PairedBiasTable {
    fn encode(&self) -> Result<Vec<u8>> {
        let s1 = &self.subgroup1;
        let s2 = &self.subgroup2;
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record([
            "word".to_string(),
            format!("{s1}-npmi"),
            format!("{s2}-npmi"),
            format!("{s1}-count"),
            format!("{s2}-count"),
            "npmi-bias".to_string(),
        ])?;
        for row in &self.rows {
            wtr.write_record([
                row.word.clone(),
                row.npmi1.to_string(),
                row.npmi2.to_string(),
                row.count1.to_string(),
                row.count2.to_string(),
                row.bias.to_string(),
            ])?;
        }
        writer_bytes(wtr)
    }

    fn decode(bytes: &[u8], artifact: &str) -> Result<Self> {
        let mut rdr = csv_reader(bytes);
        let headers = rdr.headers()?.clone();
        let word_col = word_column(&headers, artifact)?;

        // The subgroup names are whatever prefixes the two `-npmi` columns.
        let npmi_cols: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| {
                h.strip_suffix("-npmi")
                    .filter(|p| !p.is_empty())
                    .map(|p| (i, p.to_string()))
            })
            .collect();
        let [(npmi1_col, s1), (npmi2_col, s2)] = npmi_cols.as_slice() else {
            return Err(Error::corrupt(
                artifact,
                "expected exactly two subgroup npmi columns",
            ));
        };
        let count1_header = format!("{s1}-count");
        let count2_header = format!("{s2}-count");
        let count1_col = find_column(&headers, &[count1_header.as_str()])
            .ok_or_else(|| Error::corrupt(artifact, format!("no `{count1_header}` column")))?;
        let count2_col = find_column(&headers, &[count2_header.as_str()])
            .ok_or_else(|| Error::corrupt(artifact, format!("no `{count2_header}` column")))?;
        let bias_col = find_column(&headers, &["npmi-bias", "bias"])
            .ok_or_else(|| Error::corrupt(artifact, "no bias column"))?;

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(PairedBiasRow {
                word: field(&record, word_col, artifact)?.to_string(),
                npmi1: parse_f64(field(&record, *npmi1_col, artifact)?, artifact)?,
                npmi2: parse_f64(field(&record, *npmi2_col, artifact)?, artifact)?,
                count1: parse_u64(field(&record, count1_col, artifact)?, artifact)?,
                count2: parse_u64(field(&record, count2_col, artifact)?, artifact)?,
                bias: parse_f64(field(&record, bias_col, artifact)?, artifact)?,
            });
        }
        sort_rows(&mut rows);
        Ok(Self {
            subgroup1: s1.clone(),
            subgroup2: s2.clone(),
            rows,
        })
    }
}

// ---------------------------------------------------------------------------
// JSON records.
// ---------------------------------------------------------------------------

macro_rules! json_artifact {
    ($ty:ty) => {
        impl Artifact for $ty {
            fn encode(&self) -> Result<Vec<u8>> {
                Ok(serde_json::to_vec_pretty(self)?)
            }

            fn decode(bytes: &[u8], artifact: &str) -> Result<Self> {
                serde_json::from_slice(bytes).map_err(|e| Error::corrupt(artifact, e))
            }
        }
    };
}

json_artifact!(LengthStats);
json_artifact!(GeneralStats);
json_artifact!(AvailableTerms);

fn field<'r>(record: &'r StringRecord, idx: usize, artifact: &str) -> Result<&'r str> {
    record
        .get(idx)
        .ok_or_else(|| Error::corrupt(artifact, "short row"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_roundtrip() {
        let mut entries = HashMap::new();
        entries.insert(
            "cat".to_string(),
            VocabEntry {
                count: 2,
                proportion: 0.4,
            },
        );
        entries.insert(
            "dog".to_string(),
            VocabEntry {
                count: 3,
                proportion: 0.6,
            },
        );
        let vocab = Vocabulary::from_entries(entries);
        let bytes = vocab.encode().unwrap();
        let back = Vocabulary::decode(&bytes, "vocab_counts.csv").unwrap();
        assert_eq!(back, vocab);
    }

    #[test]
    fn vocabulary_decodes_legacy_index_column() {
        // Index saved as "vocab" with abbreviated column names.
        let bytes = b"vocab,cnt,prop\ncat,2,0.4\ndog,3,0.6\n";
        let vocab = Vocabulary::decode(bytes, "vocab_counts.csv").unwrap();
        assert_eq!(vocab.get("cat").unwrap().count, 2);
        assert!((vocab.get("dog").unwrap().proportion - 0.6).abs() < 1e-12);
    }

    #[test]
    fn vocabulary_decodes_unnamed_index_column() {
        let bytes = b"Unnamed: 0,count,proportion\ncat,2.0,0.4\n";
        let vocab = Vocabulary::decode(bytes, "vocab_counts.csv").unwrap();
        assert_eq!(vocab.get("cat").unwrap().count, 2);
    }

    #[test]
    fn vocabulary_rejects_unrecognizable_layout() {
        let bytes = b"foo,bar\n1,2\n";
        let err = Vocabulary::decode(bytes, "vocab_counts.csv").unwrap_err();
        assert!(matches!(err, Error::CacheCorruption { .. }));
    }

    #[test]
    fn tokenized_corpus_roundtrip_preserves_order() {
        let corpus = TokenizedCorpus::new(vec![
            vec!["the".into(), "cat".into()],
            vec![],
            vec!["dog".into()],
        ]);
        let bytes = corpus.encode().unwrap();
        let back = TokenizedCorpus::decode(&bytes, "tokenized.csv").unwrap();
        assert_eq!(back, corpus);
    }

    #[test]
    fn score_table_accepts_subgroup_prefixed_header() {
        // Legacy per-subgroup files carried `{term}-{score}` value columns.
        let bytes = b"word,she-npmi\nnurse,0.25\ndoctor,-0.1\n";
        let table = NpmiTable::decode(bytes, "she_npmi.csv").unwrap();
        assert!((table.scores["nurse"] - 0.25).abs() < 1e-12);
        assert!((table.scores["doctor"] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn paired_bias_roundtrip_recovers_subgroup_names() {
        let table = PairedBiasTable {
            subgroup1: "he".to_string(),
            subgroup2: "she".to_string(),
            rows: vec![PairedBiasRow {
                word: "nurse".to_string(),
                npmi1: -0.2,
                npmi2: 0.3,
                count1: 4,
                count2: 9,
                bias: -0.5,
            }],
        };
        let bytes = table.encode().unwrap();
        let back = PairedBiasTable::decode(&bytes, "he-she_bias.csv").unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn length_stats_roundtrip_uses_original_key_names() {
        let stats = LengthStats {
            avg_length: 3.3,
            std_length: 0.6,
            num_uniq_lengths: 2,
        };
        let bytes = stats.encode().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["avg length"], 3.3);
        assert_eq!(LengthStats::decode(&bytes, "length_stats.json").unwrap(), stats);
    }

    #[test]
    fn corrupt_json_is_cache_corruption() {
        let err = GeneralStats::decode(b"{ not json", "general_stats.json").unwrap_err();
        assert!(matches!(err, Error::CacheCorruption { .. }));
    }
}
