use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A row from an existing (possibly incomplete) prediction file. Extra
/// columns such as a stray `text_no_spaces` are ignored on read.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRow {
    pub id: i64,
    pub predicted_positions: String,
}

/// A row of the final submission. The list field always parses back to a
/// bracketed integer list, empty included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    pub id: i64,
    pub predicted_positions: String,
}

/// What the left-join had to paper over. Reported, never fatal.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Anomalies {
    /// Input rows whose id already appeared earlier (first occurrence wins).
    pub duplicate_input_ids: usize,
    /// Input rows whose id is not in the required set.
    pub extraneous_ids: usize,
    /// Required ids with no prediction, filled with `[]`.
    pub missing_ids: usize,
}

/// Produce exactly one row per required id, ascending, defaulting missing
/// predictions to `[]` and stripping legacy embedded quotes.
pub fn reconcile(required_ids: &[i64], rows: &[PredictionRow]) -> (Vec<OutputRow>, Anomalies) {
    let mut required: Vec<i64> = required_ids.to_vec();
    required.sort_unstable();
    required.dedup();
    let required_set: HashSet<i64> = required.iter().copied().collect();

    let mut anomalies = Anomalies::default();
    let mut by_id: HashMap<i64, String> = HashMap::new();
    for row in rows {
        if !required_set.contains(&row.id) {
            anomalies.extraneous_ids += 1;
            continue;
        }
        // First occurrence wins on duplicate ids
        if by_id.contains_key(&row.id) {
            anomalies.duplicate_input_ids += 1;
            continue;
        }
        by_id.insert(row.id, row.predicted_positions.clone());
    }

    let output = required
        .into_iter()
        .map(|id| {
            let positions = match by_id.remove(&id) {
                Some(text) => normalize_positions(&text),
                None => {
                    anomalies.missing_ids += 1;
                    "[]".to_string()
                }
            };
            OutputRow {
                id,
                predicted_positions: positions,
            }
        })
        .collect();

    (output, anomalies)
}

/// Strip embedded double quotes (legacy artifact of earlier serialization)
/// and substitute `[]` for anything left blank.
fn normalize_positions(text: &str) -> String {
    let cleaned: String = text.chars().filter(|&c| c != '"').collect();
    if cleaned.trim().is_empty() {
        "[]".to_string()
    } else {
        cleaned
    }
}

/// Parse a list field as a bracketed integer list. Used by the advisory
/// validation pass; the empty list is `[]`.
pub fn parse_list_literal(text: &str) -> Option<Vec<i64>> {
    let trimmed = text.trim();
    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    if inner.trim().is_empty() {
        return Some(vec![]);
    }
    inner
        .split(',')
        .map(|t| t.trim().parse::<i64>().ok())
        .collect()
}

/// Read an existing prediction file, skipping rows that fail to parse.
pub fn read_predictions(path: &Path) -> Result<Vec<PredictionRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open submission {}", path.display()))?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for row in reader.deserialize::<PredictionRow>() {
        match row {
            Ok(record) => rows.push(record),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "skipped malformed submission rows");
    }
    Ok(rows)
}

/// Write the standard submission via the csv writer (fields quoted only when
/// the dialect requires it).
pub fn write_submission(path: &Path, rows: &[OutputRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Variant with the list field bare: `0,[1, 5, 10]`. Deliberately not
/// RFC-4180 (the list's own commas are unescaped); some graders want
/// exactly this shape.
pub fn write_unquoted(path: &Path, rows: &[OutputRow]) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writeln!(file, "id,predicted_positions")?;
    for row in rows {
        writeln!(file, "{},{}", row.id, row.predicted_positions)?;
    }
    Ok(())
}

/// Variant with the list field always double-quoted: `0,"[1, 5, 10]"`.
pub fn write_quoted(path: &Path, rows: &[OutputRow]) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writeln!(file, "id,predicted_positions")?;
    for row in rows {
        writeln!(file, "{},\"{}\"", row.id, row.predicted_positions)?;
    }
    Ok(())
}

/// Advisory validation of a reconciled table. Violations are reported via
/// the returned report and logged by the caller; nothing here aborts.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub row_count_ok: bool,
    pub id_set_ok: bool,
    pub no_duplicates: bool,
    pub unparseable_samples: usize,
}

impl ValidationReport {
    pub fn all_ok(&self) -> bool {
        self.row_count_ok && self.id_set_ok && self.no_duplicates && self.unparseable_samples == 0
    }
}

const VALIDATION_SAMPLE: usize = 10;

pub fn validate(required_ids: &[i64], rows: &[OutputRow]) -> ValidationReport {
    let required_set: HashSet<i64> = required_ids.iter().copied().collect();
    let output_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let output_set: HashSet<i64> = output_ids.iter().copied().collect();

    let unparseable_samples = rows
        .iter()
        .take(VALIDATION_SAMPLE)
        .filter(|r| parse_list_literal(&r.predicted_positions).is_none())
        .count();

    ValidationReport {
        row_count_ok: rows.len() == required_set.len(),
        id_set_ok: output_set == required_set,
        no_duplicates: output_set.len() == output_ids.len(),
        unparseable_samples,
    }
}
