//! Export pipeline artifacts to CSV.
//!
//! Every writer creates missing parent directories and fully overwrites its
//! target. The header is written explicitly so an empty table still produces
//! a well-formed file.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::domain::{CleanedRecord, ForecastPoint, MonthlyAggregate};
use crate::error::AppError;

pub const CLEANED_HEADER: [&str; 8] = ["date", "admin1", "admin2", "market", "commodity", "unit", "price", "year_month"];
pub const AGGREGATE_HEADER: [&str; 3] = ["commodity", "year_month", "average_price"];
pub const FORECAST_HEADER: [&str; 5] = ["commodity", "date", "predicted_price", "lower_bound", "upper_bound"];

#[derive(Serialize)]
struct CleanedRow<'a> {
    date: String,
    admin1: &'a str,
    admin2: &'a str,
    market: &'a str,
    commodity: &'a str,
    unit: &'a str,
    price: f64,
    year_month: String,
}

#[derive(Serialize)]
struct AggregateRow<'a> {
    commodity: &'a str,
    year_month: String,
    average_price: f64,
}

/// Write cleaned records plus the derived `year_month` column.
pub fn write_cleaned_csv(path: &Path, records: &[CleanedRecord]) -> Result<(), AppError> {
    write_rows(
        path,
        "cleaned CSV",
        &CLEANED_HEADER,
        records.iter().map(|r| CleanedRow {
            date: r.date.format("%Y-%m-%d").to_string(),
            admin1: &r.admin1,
            admin2: &r.admin2,
            market: &r.market,
            commodity: &r.commodity,
            unit: r.unit.as_deref().unwrap_or(""),
            price: r.price,
            year_month: r.year_month().to_string(),
        }),
    )
}

/// Write `commodity,year_month,average_price`.
pub fn write_aggregates_csv(path: &Path, aggregates: &[MonthlyAggregate]) -> Result<(), AppError> {
    write_rows(
        path,
        "aggregate CSV",
        &AGGREGATE_HEADER,
        aggregates.iter().map(|a| AggregateRow {
            commodity: &a.commodity,
            year_month: a.year_month.to_string(),
            average_price: a.average_price,
        }),
    )
}

/// Write `commodity,date,predicted_price,lower_bound,upper_bound`.
pub fn write_forecast_csv(path: &Path, table: &[ForecastPoint]) -> Result<(), AppError> {
    write_rows(path, "forecast CSV", &FORECAST_HEADER, table.iter())
}

fn write_rows<T, I>(path: &Path, what: &str, header: &[&str], rows: I) -> Result<(), AppError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    ensure_parent_dir(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create {what} '{}': {e}", path.display())))?;
    writer
        .write_record(header)
        .map_err(|e| AppError::new(2, format!("Failed to write {what} header: {e}")))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(2, format!("Failed to write {what} row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush {what} '{}': {e}", path.display())))?;
    Ok(())
}

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::new(2, format!("Failed to create directory '{}': {e}", parent.display()))
        })?;
    }
    Ok(())
}
