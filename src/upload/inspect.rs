use serde::Serialize;

use crate::error::AppError;

pub const NO_DATA: &str = "No data found in the uploaded file!";

const BOM: &[u8] = b"\xef\xbb\xbf";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub size: u64,
    pub columns: Option<Vec<String>>,
    pub rows: Option<usize>,
}

/// Header and data records of a CSV upload, fields trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub columns: Vec<String>,
    pub records: Vec<Vec<String>>,
}

/// Summarise a stored upload. Spreadsheets are only sized; CSV files also
/// report their header and data row count.
pub fn inspect(bytes: &[u8], extension: &str) -> Result<FileSummary, AppError> {
    if bytes.is_empty() {
        return Err(AppError::BadRequest(NO_DATA.to_string()));
    }

    let size = bytes.len() as u64;
    if extension != "csv" {
        return Ok(FileSummary {
            size,
            columns: None,
            rows: None,
        });
    }

    let (columns, rows) = summarize_csv(bytes).map_err(AppError::BadRequest)?;
    Ok(FileSummary {
        size,
        columns: Some(columns),
        rows: Some(rows),
    })
}

/// Header columns and number of data records.
pub fn summarize_csv(bytes: &[u8]) -> Result<(Vec<String>, usize), String> {
    let table = read_csv(bytes)?;
    Ok((table.columns, table.records.len()))
}

/// Parse a CSV body with a header row. Quoted fields may span lines; records
/// whose fields are all blank are skipped. A table without data records is
/// rejected with [`NO_DATA`].
pub fn read_csv(bytes: &[u8]) -> Result<CsvTable, String> {
    let bytes = bytes.strip_prefix(BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| format!("Failed to read CSV headers: {e}"))?
        .iter()
        .map(str::to_string)
        .collect();
    if columns.iter().all(String::is_empty) {
        return Err(NO_DATA.to_string());
    }

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        // Row 1 is the header.
        let record = result.map_err(|e| format!("Row {}: CSV parse error: {e}", index + 2))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        records.push(record.iter().map(str::to_string).collect());
    }

    if records.is_empty() {
        return Err(NO_DATA.to_string());
    }

    Ok(CsvTable { columns, records })
}
