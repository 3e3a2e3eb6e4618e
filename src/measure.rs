// Named measurements as a closed registry.
//
// Each entry pairs a stable name with the orchestrator operation that
// produces it, so the CLI report/status loops drive measurements by lookup
// instead of virtual dispatch over an open class hierarchy.

use serde_json::{json, Value};

use crate::error::Result;
use crate::stats::DatasetStatistics;

/// One runnable measurement: name, human description, and the operation.
///
/// `run` returns `Ok(None)` when a load-only request found nothing cached.
pub struct Measurement {
    pub name: &'static str,
    pub description: &'static str,
    pub run: fn(&mut DatasetStatistics, load_only: bool) -> Result<Option<Value>>,
}

/// The closed set of measurements, in report order.
pub fn registry() -> &'static [Measurement] {
    &[
        Measurement {
            name: "vocabulary",
            description: "word counts and proportions",
            run: run_vocabulary,
        },
        Measurement {
            name: "lengths",
            description: "text length statistics",
            run: run_lengths,
        },
        Measurement {
            name: "general",
            description: "totals, missing texts, duplication",
            run: run_general,
        },
        Measurement {
            name: "npmi-terms",
            description: "identity terms available for bias comparison",
            run: run_npmi_terms,
        },
    ]
}

pub fn find(name: &str) -> Option<&'static Measurement> {
    registry().iter().find(|m| m.name == name)
}

fn run_vocabulary(dstats: &mut DatasetStatistics, load_only: bool) -> Result<Option<Value>> {
    let Some(vocab) = dstats.load_or_prepare_vocab(load_only)? else {
        return Ok(None);
    };
    Ok(Some(json!({
        "total words": vocab.len(),
        "total count": vocab.total_count(),
    })))
}

fn run_lengths(dstats: &mut DatasetStatistics, load_only: bool) -> Result<Option<Value>> {
    let Some(stats) = dstats.load_or_prepare_length_stats(load_only)? else {
        return Ok(None);
    };
    Ok(Some(serde_json::to_value(stats)?))
}

fn run_general(dstats: &mut DatasetStatistics, load_only: bool) -> Result<Option<Value>> {
    let Some(stats) = dstats.load_or_prepare_general_stats(load_only)? else {
        return Ok(None);
    };
    Ok(Some(serde_json::to_value(stats)?))
}

fn run_npmi_terms(dstats: &mut DatasetStatistics, load_only: bool) -> Result<Option<Value>> {
    let Some(terms) = dstats.available_terms(load_only)? else {
        return Ok(None);
    };
    Ok(Some(json!({ "available terms": terms })))
}
