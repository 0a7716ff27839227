//! Read a previously exported forecast table (for plotting).

use std::fs::File;
use std::path::Path;

use crate::domain::ForecastPoint;
use crate::error::AppError;
use crate::io::export::FORECAST_HEADER;
use crate::io::ingest::{build_header_map, ensure_columns_exist};

/// Load every forecast row in file order.
pub fn read_forecast_csv(path: &Path) -> Result<Vec<ForecastPoint>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open forecast CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read forecast CSV headers: {e}")))?
        .clone();
    ensure_columns_exist(&build_header_map(&headers), &FORECAST_HEADER)?;

    let mut out = Vec::new();
    for result in reader.deserialize::<ForecastPoint>() {
        let point = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            AppError::new(2, format!("Line {line}: invalid forecast row: {e}"))
        })?;
        out.push(point);
    }
    Ok(out)
}
