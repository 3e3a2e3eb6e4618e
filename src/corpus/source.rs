// Dataset source seam.
//
// Acquisition and truncation live behind this trait; the pipeline only sees
// an ordered list of records. JsonlSource reads newline-delimited JSON, which
// is what the CLI feeds it.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// One record of the dataset: the configured text field, plus the label
/// field when one is configured and present.
///
/// `text` is `None` when the field is missing or JSON null in the record;
/// the general statistics count those as NaN texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub text: Option<String>,
    pub label: Option<String>,
}

/// Anything that can yield the records of one dataset split.
pub trait CorpusSource {
    /// All records, in a stable order.
    fn records(&self) -> Result<Vec<Record>>;
}

/// Reads records from a newline-delimited JSON file, one object per line.
pub struct JsonlSource {
    path: PathBuf,
    text_field: String,
    label_field: Option<String>,
}

impl JsonlSource {
    pub fn new(path: &Path, text_field: &str, label_field: Option<&str>) -> Self {
        Self {
            path: path.to_path_buf(),
            text_field: text_field.to_string(),
            label_field: label_field.map(|s| s.to_string()),
        }
    }
}

impl CorpusSource for JsonlSource {
    fn records(&self) -> Result<Vec<Record>> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(&line).map_err(|e| {
                Error::Source(format!(
                    "{}:{}: not a JSON object: {e}",
                    self.path.display(),
                    lineno + 1
                ))
            })?;
            records.push(Record {
                text: field_as_string(&value, &self.text_field),
                label: self
                    .label_field
                    .as_deref()
                    .and_then(|f| field_as_string(&value, f)),
            });
        }
        debug!(
            path = %self.path.display(),
            records = records.len(),
            "Read JSONL source"
        );
        Ok(records)
    }
}

/// Extract a field as a string, tolerating numeric and boolean labels.
fn field_as_string(value: &Value, field: &str) -> Option<String> {
    match value.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}
