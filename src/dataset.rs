use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

/// One input record: the concatenated source text and its id.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentationRequest {
    pub id: i64,
    pub text_no_spaces: String,
}

/// Read the input table. Rows that fail to deserialize are skipped, not
/// fatal; an unreadable file is.
pub fn read_dataset(path: &Path) -> Result<Vec<SegmentationRequest>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open dataset {}", path.display()))?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in reader.deserialize::<SegmentationRequest>() {
        match row {
            Ok(record) => records.push(record),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "skipped malformed dataset rows");
    }
    Ok(records)
}

/// The full set of ids the final submission must cover, ascending and
/// deduplicated. Falls back to a contiguous `0..fallback_len` range when the
/// reference dataset cannot be read.
pub fn required_ids(dataset_path: &Path, fallback_len: usize) -> Vec<i64> {
    match read_dataset(dataset_path) {
        Ok(rows) => {
            let ids: BTreeSet<i64> = rows.iter().map(|r| r.id).collect();
            ids.into_iter().collect()
        }
        Err(e) => {
            warn!(
                dataset = %dataset_path.display(),
                error = %e,
                fallback_len,
                "cannot read reference dataset, using contiguous id range"
            );
            (0..fallback_len as i64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_read_dataset() {
        let f = write_temp("id,text_no_spaces\n0,куплюайфон\n1,сдаюгараж\n");
        let rows = read_dataset(f.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 0);
        assert_eq!(rows[1].text_no_spaces, "сдаюгараж");
    }

    #[test]
    fn test_read_dataset_skips_bad_rows() {
        let f = write_temp("id,text_no_spaces\n0,куплюайфон\nnot_a_number,x\n2,ищудом\n");
        let rows = read_dataset(f.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].id, 2);
    }

    #[test]
    fn test_read_dataset_unreadable_is_error() {
        assert!(read_dataset(Path::new("/nonexistent/dataset.csv")).is_err());
    }

    #[test]
    fn test_required_ids_sorted_and_deduplicated() {
        let f = write_temp("id,text_no_spaces\n3,a\n1,b\n3,c\n0,d\n");
        assert_eq!(required_ids(f.path(), 10), vec![0, 1, 3]);
    }

    #[test]
    fn test_required_ids_fallback_range() {
        let ids = required_ids(Path::new("/nonexistent/dataset.csv"), 5);
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }
}
