// Bias tests — nPMI subgroup comparison end to end: term availability,
// pair canonicalization, sign conventions, and reuse of cached per-subgroup
// artifacts when only the joint table is missing.

use std::path::PathBuf;

use tempfile::TempDir;

use loupe::cache::{ArtifactStore, FsStore, MemoryStore};
use loupe::config::Config;
use loupe::corpus::{
    default_tokenizer, CorpusSource, DatasetIdentity, ExactDuplicateDetector, Record,
};
use loupe::stats::DatasetStatistics;
use loupe::{Error, Result};

// ============================================================
// Term availability
// ============================================================

#[test]
fn available_terms_are_the_identity_terms_present_often_enough() {
    let mut dstats = memory_stats(pronoun_texts(), 1);
    let terms = dstats.available_terms(false).unwrap().unwrap();

    assert!(terms.contains(&"he".to_string()));
    assert!(terms.contains(&"she".to_string()));
    assert!(!terms.contains(&"woman".to_string()));
}

#[test]
fn rare_terms_fall_below_the_count_threshold() {
    // "he" and "she" each occur twice; a threshold of three hides both.
    let mut dstats = memory_stats(pronoun_texts(), 3);
    let terms = dstats.available_terms(false).unwrap().unwrap();
    assert!(terms.is_empty());
}

#[test]
fn comparing_an_absent_term_is_rejected_before_any_computation() {
    let mut dstats = memory_stats(pronoun_texts(), 1);
    let err = dstats
        .load_or_prepare_joint_bias("he", "woman")
        .unwrap_err();
    match err {
        Error::UnavailableSubgroup { term, .. } => assert_eq!(term, "woman"),
        other => panic!("expected UnavailableSubgroup, got {other:?}"),
    }
}

// ============================================================
// Bias values and orientation
// ============================================================

#[test]
fn symmetric_corpus_yields_zero_bias_everywhere() {
    let texts = vec![
        "he works hard".to_string(),
        "she works hard".to_string(),
        "he plays chess".to_string(),
        "she plays chess".to_string(),
    ];
    let mut dstats = memory_stats(texts, 1);
    let table = dstats.load_or_prepare_joint_bias("he", "she").unwrap();

    assert_eq!(table.subgroup1, "he");
    assert_eq!(table.subgroup2, "she");
    assert!(!table.rows.is_empty());
    for row in &table.rows {
        assert!(
            row.bias.abs() < 1e-12,
            "{} should carry no bias, got {}",
            row.word,
            row.bias
        );
    }
}

#[test]
fn skewed_word_leans_toward_the_subgroup_it_co_occurs_with() {
    let texts = vec![
        "he works hard".to_string(),
        "she works hard".to_string(),
        "he plays chess".to_string(),
        "she plays chess".to_string(),
        "he wins chess".to_string(),
    ];
    let mut dstats = memory_stats(texts, 1);
    let table = dstats.load_or_prepare_joint_bias("he", "she").unwrap();

    // "chess" appears with "he" twice but with "she" once. Positive bias
    // means subgroup 1, and "he" sorts first.
    assert!(table.bias_for("chess").unwrap() > 0.0);

    // Rows come back in ascending bias order.
    for pair in table.rows.windows(2) {
        assert!(pair[0].bias <= pair[1].bias);
    }

    // All nPMI values stay within the normalized bounds (modulo rounding).
    for row in &table.rows {
        assert!(row.npmi1.abs() <= 1.0 + 1e-12);
        assert!(row.npmi2.abs() <= 1.0 + 1e-12);
    }
}

#[test]
fn pair_order_does_not_change_the_canonical_artifact() {
    let texts = pronoun_texts();
    let mut a = memory_stats(texts.clone(), 1);
    let mut b = memory_stats(texts, 1);

    let forward = a.load_or_prepare_joint_bias("he", "she").unwrap();
    let backward = b.load_or_prepare_joint_bias("she", "he").unwrap();

    // Both resolve to the sorted pair.
    assert_eq!(forward.subgroup1, backward.subgroup1);
    assert_eq!(forward, backward);
}

#[test]
fn reversing_a_table_negates_bias_over_the_same_words() {
    let texts = vec![
        "he works hard".to_string(),
        "she works hard".to_string(),
        "he plays chess".to_string(),
        "she plays chess".to_string(),
        "he wins chess".to_string(),
    ];
    let mut dstats = memory_stats(texts, 1);
    let table = dstats.load_or_prepare_joint_bias("he", "she").unwrap();
    let reversed = table.reversed();

    assert_eq!(reversed.subgroup1, "she");
    assert_eq!(reversed.subgroup2, "he");
    assert_eq!(reversed.rows.len(), table.rows.len());
    for row in &table.rows {
        let flipped = reversed.bias_for(&row.word).unwrap();
        assert!((flipped + row.bias).abs() < 1e-12);
    }
}

// ============================================================
// Cache reuse
// ============================================================

#[test]
fn joint_table_is_rebuilt_from_cached_subgroup_artifacts() {
    let dir = TempDir::new().unwrap();
    let texts = vec![
        "he works hard".to_string(),
        "she works hard".to_string(),
        "he plays chess".to_string(),
        "she plays chess".to_string(),
        "he wins chess".to_string(),
    ];

    let original = {
        let mut dstats = fs_stats(dir.path().to_path_buf(), texts.clone());
        dstats.load_or_prepare_joint_bias("he", "she").unwrap()
    };

    // Drop only the joint artifact; the per-subgroup tables stay on disk.
    let identity = identity();
    let joint = dir
        .path()
        .join(identity.dir_name())
        .join("npmi")
        .join("he-she_bias.csv");
    assert!(joint.exists(), "joint artifact should have been persisted");
    std::fs::remove_file(&joint).unwrap();

    let rebuilt = {
        let mut dstats = fs_stats(dir.path().to_path_buf(), texts);
        dstats.load_or_prepare_joint_bias("he", "she").unwrap()
    };
    assert_eq!(original, rebuilt);
    assert!(joint.exists(), "rejoining should persist the artifact again");
}

#[test]
fn one_cached_subgroup_gives_the_same_table_as_none() {
    let texts = vec![
        "he works hard".to_string(),
        "she works hard".to_string(),
        "he plays chess".to_string(),
        "she plays chess".to_string(),
        "he wins chess".to_string(),
    ];

    let from_scratch = {
        let mut dstats = memory_stats(texts.clone(), 1);
        dstats.load_or_prepare_joint_bias("he", "she").unwrap()
    };

    let dir = TempDir::new().unwrap();
    let partially_cached = {
        // First run caches everything, then the joint table and one
        // subgroup's tables are removed; "she" must be recomputed, "he"
        // loaded.
        {
            let mut dstats = fs_stats(dir.path().to_path_buf(), texts.clone());
            dstats.load_or_prepare_joint_bias("he", "she").unwrap();
        }
        let npmi_dir = dir.path().join(identity().dir_name()).join("npmi");
        std::fs::remove_file(npmi_dir.join("he-she_bias.csv")).unwrap();
        for name in ["she_cooc.csv", "she_pmi.csv", "she_npmi.csv"] {
            std::fs::remove_file(npmi_dir.join(name)).unwrap();
        }

        let mut dstats = fs_stats(dir.path().to_path_buf(), texts);
        dstats.load_or_prepare_joint_bias("he", "she").unwrap()
    };

    assert_eq!(from_scratch, partially_cached);
}

#[test]
fn second_request_is_served_from_the_joint_artifact() {
    let dir = TempDir::new().unwrap();
    {
        let mut dstats = fs_stats(dir.path().to_path_buf(), pronoun_texts());
        dstats.load_or_prepare_joint_bias("he", "she").unwrap();
    }

    // Corrupting the per-subgroup tables is invisible as long as the joint
    // artifact itself still decodes.
    let identity = identity();
    let cooc = dir
        .path()
        .join(identity.dir_name())
        .join("npmi")
        .join("he_cooc.csv");
    std::fs::remove_file(&cooc).unwrap();

    let mut dstats = fs_stats(dir.path().to_path_buf(), pronoun_texts());
    let table = dstats.load_or_prepare_joint_bias("he", "she").unwrap();
    assert_eq!(table.subgroup1, "he");
}

#[test]
fn subgroup_artifacts_are_keyed_by_term_alone() {
    let mut dstats = memory_stats(pronoun_texts(), 1);
    dstats.load_or_prepare_joint_bias("he", "she").unwrap();

    // The per-subgroup files carry no pair name, so a later pair sharing a
    // term reuses them.
    let key = loupe::cache::ArtifactKey::new(dstats.identity(), "npmi/he_npmi.csv");
    assert!(dstats.cache().exists(&key));
}

// ============================================================
// Helpers
// ============================================================

fn pronoun_texts() -> Vec<String> {
    vec![
        "he walks the dog".to_string(),
        "she walks the dog".to_string(),
        "he reads books".to_string(),
        "she reads books".to_string(),
    ]
}

struct VecSource {
    records: Vec<Record>,
}

impl CorpusSource for VecSource {
    fn records(&self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }
}

fn identity() -> DatasetIdentity {
    DatasetIdentity::new("toy", "default", "train", "text")
}

fn build(
    store: Box<dyn ArtifactStore>,
    texts: Vec<String>,
    cache_root: PathBuf,
    min_vocab_count: u64,
) -> DatasetStatistics {
    let records = texts
        .into_iter()
        .map(|text| Record {
            text: Some(text),
            label: None,
        })
        .collect();
    let config = Config {
        cache_root,
        use_cache: true,
        save: true,
        min_vocab_count,
    };
    DatasetStatistics::new(
        identity(),
        &config,
        store,
        Box::new(VecSource { records }),
        default_tokenizer(),
        Box::new(ExactDuplicateDetector),
    )
}

fn memory_stats(texts: Vec<String>, min_vocab_count: u64) -> DatasetStatistics {
    build(
        Box::new(MemoryStore::new()),
        texts,
        PathBuf::from("unused"),
        min_vocab_count,
    )
}

fn fs_stats(cache_root: PathBuf, texts: Vec<String>) -> DatasetStatistics {
    build(
        Box::new(FsStore::new(&cache_root)),
        texts,
        cache_root,
        1,
    )
}
