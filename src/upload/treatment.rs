use std::collections::HashSet;

use serde::Serialize;

use super::inspect::CsvTable;

pub const PREVIEW_ROWS: usize = 10;

pub const NOTHING_LEFT: &str = "No rows left after preprocessing!";

/// Counts and preview produced by [`clean`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanReport {
    pub columns: Vec<String>,
    pub rows_before: usize,
    pub rows_after: usize,
    pub missing_rows_removed: usize,
    pub duplicates_removed: usize,
    /// First rows of the cleaned table, aligned with `columns`.
    pub preview: Vec<Vec<String>>,
}

/// Run the treatments over a parsed table: rows with a missing value are
/// dropped first, then repeated rows (the first occurrence is kept).
///
/// A row with more fields than the header is an error; a shorter row counts
/// as missing values.
pub fn clean(table: CsvTable) -> Result<CleanReport, String> {
    let CsvTable { columns, records } = table;
    let width = columns.len();
    let rows_before = records.len();

    if let Some((index, record)) = records.iter().enumerate().find(|(_, r)| r.len() > width) {
        return Err(format!(
            "Row {}: expected {width} fields, found {}",
            index + 2,
            record.len()
        ));
    }

    let complete: Vec<Vec<String>> = records
        .into_iter()
        .filter(|r| r.len() == width && r.iter().all(|cell| !cell.is_empty()))
        .collect();
    let missing_rows_removed = rows_before - complete.len();

    let rows = drop_duplicates(complete);
    let duplicates_removed = rows_before - missing_rows_removed - rows.len();

    if rows.is_empty() {
        return Err(NOTHING_LEFT.to_string());
    }

    tracing::debug!(
        rows_before,
        missing_rows_removed,
        duplicates_removed,
        "CSV preprocessing finished"
    );

    Ok(CleanReport {
        columns,
        rows_before,
        rows_after: rows.len(),
        missing_rows_removed,
        duplicates_removed,
        preview: rows.into_iter().take(PREVIEW_ROWS).collect(),
    })
}

fn drop_duplicates(rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    rows.into_iter().filter(|row| seen.insert(row.clone())).collect()
}
