//! Shared pipeline stages used by every subcommand.
//!
//! load -> clean -> aggregate -> export -> forecast -> export
//!
//! Each stage takes the artifacts of the previous one explicitly, so `run`,
//! `clean` and `forecast` only differ in where their inputs come from. The
//! front-end (`app`) is left with presentation.

use tracing::{info, warn};

use crate::aggregate::{commodity_series, monthly_aggregates};
use crate::clean::{CleanReport, clean_records};
use crate::domain::{ForecastPoint, MonthlyAggregate, PipelineConfig};
use crate::error::AppError;
use crate::forecast::{ForecastRun, forecast_all};
use crate::io::ingest::{RawDataset, load_raw_records};
use crate::report::{DatasetStats, compute_stats};

/// Outputs of the cleaning stage.
#[derive(Debug, Clone)]
pub struct CleanOutput {
    pub raw: RawDataset,
    pub report: CleanReport,
    pub aggregates: Vec<MonthlyAggregate>,
    pub stats: DatasetStats,
}

/// Outputs of the forecasting stage.
#[derive(Debug, Clone)]
pub struct ForecastOutput {
    /// Number of distinct commodities considered.
    pub commodities: usize,
    pub run: ForecastRun,
    pub table: Vec<ForecastPoint>,
}

/// Load, clean and aggregate the raw file, then write the cleaned and
/// aggregate tables.
///
/// A file with no usable rows still produces header-only tables.
pub fn run_clean(config: &PipelineConfig) -> Result<CleanOutput, AppError> {
    let raw = load_raw_records(&config.input_path)?;
    info!(
        path = %config.input_path.display(),
        rows = raw.rows_read,
        columns = raw.columns,
        "loaded raw dataset"
    );

    let report = clean_records(&raw.records);
    info!(
        kept = report.records.len(),
        dropped = report.rows_dropped(),
        imputed = report.imputed_labels,
        "cleaned records"
    );
    if report.records.is_empty() {
        warn!(path = %config.input_path.display(), "no usable rows left after cleaning");
    }

    let aggregates = monthly_aggregates(&report.records);
    let stats = compute_stats(&report.records);

    crate::io::export::write_cleaned_csv(&config.cleaned_path, &report.records)?;
    crate::io::export::write_aggregates_csv(&config.aggregates_path, &aggregates)?;
    info!(
        cleaned = %config.cleaned_path.display(),
        aggregates = %config.aggregates_path.display(),
        groups = aggregates.len(),
        "wrote cleaned and aggregate tables"
    );

    Ok(CleanOutput {
        raw,
        report,
        aggregates,
        stats,
    })
}

/// Forecast every commodity in `aggregates` and write the combined table.
///
/// The table is assembled in memory first; nothing is written when the run
/// aborts or when no commodity produced a forecast.
pub fn run_forecast(aggregates: &[MonthlyAggregate], config: &PipelineConfig) -> Result<ForecastOutput, AppError> {
    let series = commodity_series(aggregates);
    info!(commodities = series.len(), "forecasting commodities");

    let run = forecast_all(&series, &config.forecast)?;
    let table = run.table();
    if table.is_empty() {
        return Err(AppError::new(
            3,
            format!(
                "No commodity produced a forecast ({} skipped, {} failed)",
                run.skipped.len(),
                run.failed.len()
            ),
        ));
    }

    crate::io::export::write_forecast_csv(&config.forecast_path, &table)?;
    info!(
        path = %config.forecast_path.display(),
        rows = table.len(),
        forecasts = run.forecasts.len(),
        skipped = run.skipped.len(),
        failed = run.failed.len(),
        "wrote forecast table"
    );

    Ok(ForecastOutput {
        commodities: series.len(),
        run,
        table,
    })
}

/// Forecast from a previously exported aggregate table.
pub fn run_forecast_from_file(config: &PipelineConfig) -> Result<ForecastOutput, AppError> {
    let aggregates = crate::io::aggregates::read_aggregates_csv(&config.aggregates_path)?;
    info!(
        path = %config.aggregates_path.display(),
        rows = aggregates.len(),
        "loaded aggregate table"
    );
    run_forecast(&aggregates, config)
}
