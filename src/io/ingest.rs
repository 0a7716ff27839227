//! CSV ingest for the raw price dataset.
//!
//! This module only reads: it turns a heterogeneous price export into
//! `RawRecord`s with untyped, optional fields. Typing and filtering live in
//! `clean`, so every row that parses as CSV reaches the cleaner.
//!
//! Design goals:
//! - **Strict schema** for the expected columns (clear errors + exit code 2)
//! - **Tolerant rows** (ragged rows yield missing fields, undecodable rows are counted)
//! - **No typing here**

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{RawRecord, REQUIRED_COLUMNS};
use crate::error::AppError;

/// Everything read from the raw file.
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub records: Vec<RawRecord>,
    /// Number of columns in the input header (before projection).
    pub columns: usize,
    /// Data rows seen, including undecodable ones.
    pub rows_read: usize,
    /// Rows the CSV reader could not decode (dropped).
    pub malformed_rows: usize,
}

/// Load the raw dataset. Fails if the file does not exist.
pub fn load_raw_records(path: &Path) -> Result<RawDataset, AppError> {
    if !path.exists() {
        return Err(AppError::new(
            2,
            format!("File not found at {}", path.display()),
        ));
    }

    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_columns_exist(&header_map, &REQUIRED_COLUMNS)?;

    let mut records = Vec::new();
    let mut rows_read = 0usize;
    let mut malformed_rows = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        match result {
            Ok(record) => records.push(to_raw_record(&record, &header_map, line)),
            Err(e) => {
                malformed_rows += 1;
                warn!(line, error = %e, "skipping undecodable CSV row");
            }
        }
    }

    debug!(
        path = %path.display(),
        rows_read,
        malformed_rows,
        columns = headers.len(),
        "raw dataset loaded"
    );

    Ok(RawDataset {
        records,
        columns: headers.len(),
        rows_read,
        malformed_rows,
    })
}

pub(crate) fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // Keep the first occurrence if a header is duplicated.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM;
    // without stripping it the `date` column would look missing.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

pub(crate) fn ensure_columns_exist(header_map: &HashMap<String, usize>, columns: &[&str]) -> Result<(), AppError> {
    for name in columns {
        if !header_map.contains_key(*name) {
            return Err(AppError::new(2, format!("Missing required column: `{name}`")));
        }
    }
    Ok(())
}

fn to_raw_record(record: &StringRecord, header_map: &HashMap<String, usize>, line: usize) -> RawRecord {
    RawRecord {
        line,
        date: get_optional(record, header_map, "date"),
        admin1: get_optional(record, header_map, "admin1"),
        admin2: get_optional(record, header_map, "admin2"),
        market: get_optional(record, header_map, "market"),
        commodity: get_optional(record, header_map, "commodity"),
        unit: get_optional(record, header_map, "unit"),
        price: get_optional(record, header_map, "price"),
    }
}

fn get_optional(record: &StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<String> {
    let idx = header_map.get(name)?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn missing_file_is_a_not_found_error() {
        let err = load_raw_records(Path::new("definitely/not/here.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().starts_with("File not found"));
    }

    #[test]
    fn loads_rows_and_ignores_extra_columns() {
        let file = write_csv(concat!(
            "date,admin1,admin2,market,market_id,commodity,unit,currency,price\n",
            "#date,#adm1+name,#adm2+name,#loc+market+name,#loc+market+code,#item+name,#item+unit,#currency,#value\n",
            "2020-01-15,Kigali,Gasabo,Kimironko,12,Beans,KG,RWF,650\n",
        ));

        let data = load_raw_records(file.path()).unwrap();
        assert_eq!(data.columns, 9);
        assert_eq!(data.rows_read, 2);
        assert_eq!(data.records.len(), 2);

        let row = &data.records[1];
        assert_eq!(row.line, 3);
        assert_eq!(row.commodity.as_deref(), Some("Beans"));
        assert_eq!(row.price.as_deref(), Some("650"));
        assert_eq!(row.market.as_deref(), Some("Kimironko"));
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let file = write_csv("date,admin1,admin2,market,commodity,price\n2020-01-15,a,b,c,d,1\n");
        let err = load_raw_records(file.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("`unit`"));
    }

    #[test]
    fn headers_are_case_and_bom_insensitive_and_short_rows_are_padded() {
        let file = write_csv(concat!(
            "\u{feff}Date,ADMIN1,Admin2,Market,Commodity,Unit,Price\n",
            "2020-02-01,Kigali,Gasabo\n",
        ));

        let data = load_raw_records(file.path()).unwrap();
        let row = &data.records[0];
        assert_eq!(row.date.as_deref(), Some("2020-02-01"));
        assert_eq!(row.admin2.as_deref(), Some("Gasabo"));
        assert_eq!(row.commodity, None);
        assert_eq!(row.price, None);
    }

    #[test]
    fn blank_cells_are_missing() {
        let file = write_csv("date,admin1,admin2,market,commodity,unit,price\n2020-02-01,  ,x,y,,KG,10\n");
        let data = load_raw_records(file.path()).unwrap();
        let row = &data.records[0];
        assert_eq!(row.admin1, None);
        assert_eq!(row.commodity, None);
        assert_eq!(row.unit.as_deref(), Some("KG"));
    }
}
