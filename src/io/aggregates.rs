//! Read a previously exported monthly-aggregate table.
//!
//! Unlike the raw loader this reader is strict: the file was written by
//! `write_aggregates_csv`, so any malformed row is an error naming its line.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::domain::{MonthlyAggregate, YearMonth};
use crate::error::AppError;
use crate::io::export::AGGREGATE_HEADER;
use crate::io::ingest::{build_header_map, ensure_columns_exist};

/// Load `commodity,year_month,average_price` rows in file order.
///
/// `observations` is not persisted, so every loaded aggregate reports 0.
pub fn read_aggregates_csv(path: &Path) -> Result<Vec<MonthlyAggregate>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open aggregate CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read aggregate CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    ensure_columns_exist(&header_map, &AGGREGATE_HEADER)?;

    let mut out = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("Line {line}: invalid CSV row: {e}")))?;
        out.push(parse_row(&record, &header_map, line)?);
    }

    debug!(path = %path.display(), rows = out.len(), "aggregates loaded");
    Ok(out)
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>, line: usize) -> Result<MonthlyAggregate, AppError> {
    let commodity = get_required(record, header_map, "commodity", line)?.to_string();

    let raw_month = get_required(record, header_map, "year_month", line)?;
    let year_month: YearMonth = raw_month
        .parse()
        .map_err(|e: String| AppError::new(2, format!("Line {line}: {e}")))?;

    let raw_price = get_required(record, header_map, "average_price", line)?;
    let average_price: f64 = raw_price
        .parse()
        .map_err(|_| AppError::new(2, format!("Line {line}: invalid average_price '{raw_price}'.")))?;
    if !average_price.is_finite() {
        return Err(AppError::new(2, format!("Line {line}: average_price must be finite.")));
    }

    Ok(MonthlyAggregate {
        commodity,
        year_month,
        average_price,
        observations: 0,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
    line: usize,
) -> Result<&'a str, AppError> {
    header_map
        .get(name)
        .and_then(|idx| record.get(*idx))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::new(2, format!("Line {line}: missing `{name}`.")))
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
    fn reads_exported_rows() {
        let file = write_csv("commodity,year_month,average_price\nBeans,2020-01,650.0\nBeans,2020-02,655.5\n");
        let aggs = read_aggregates_csv(file.path()).unwrap();
        assert_eq!(aggs.len(), 2);
        assert_eq!(aggs[1].year_month.to_string(), "2020-02");
        assert_eq!(aggs[1].average_price, 655.5);
    }

    #[test]
    fn missing_column_is_fatal() {
        let file = write_csv("commodity,month,average_price\nBeans,2020-01,650.0\n");
        let err = read_aggregates_csv(file.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("`year_month`"));
    }

    #[test]
    fn malformed_row_names_its_line() {
        let file = write_csv("commodity,year_month,average_price\nBeans,2020-01,650.0\nBeans,2020-13,1.0\n");
        let err = read_aggregates_csv(file.path()).unwrap_err();
        assert!(err.message().starts_with("Line 3:"), "{}", err.message());

        let file = write_csv("commodity,year_month,average_price\nBeans,2020-01,cheap\n");
        let err = read_aggregates_csv(file.path()).unwrap_err();
        assert!(err.message().contains("Line 2"));
    }

    #[test]
    fn missing_file_is_exit_code_two() {
        let err = read_aggregates_csv(Path::new("no/such/aggregates.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
