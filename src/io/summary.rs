//! JSON run summary.
//!
//! A machine-readable companion to the console report: what was read, what
//! was dropped and why, and how each commodity fared.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clean::CleanReport;
use crate::domain::{FitSummary, ForecastConfig, YearMonth, YearlySeasonality};
use crate::error::AppError;
use crate::forecast::ForecastRun;
use crate::io::export::ensure_parent_dir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning: Option<CleaningSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecasting: Option<ForecastingSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows_read: usize,
    pub malformed_rows: usize,
    pub rows_kept: usize,
    pub dropped_header_marker: usize,
    pub dropped_invalid_date: usize,
    pub dropped_invalid_price: usize,
    pub dropped_non_positive_price: usize,
    pub imputed_labels: usize,
    pub aggregate_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastingSummary {
    pub settings: SettingsSummary,
    pub rows_written: usize,
    pub forecasts: Vec<CommoditySummary>,
    pub skipped: Vec<SkippedSummary>,
    pub failed: Vec<FailedSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsSummary {
    pub min_observations: usize,
    pub horizon: usize,
    pub interval_width: f64,
    pub uncertainty_samples: usize,
    pub seed: u64,
    pub yearly: YearlySeasonality,
    pub n_changepoints: usize,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommoditySummary {
    pub commodity: String,
    pub observations: usize,
    pub last_observed: YearMonth,
    pub rows: usize,
    pub fit: FitSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSummary {
    pub commodity: String,
    pub observations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedSummary {
    pub commodity: String,
    pub error: String,
}

impl CleaningSummary {
    pub fn new(rows_read: usize, malformed_rows: usize, report: &CleanReport, aggregate_rows: usize) -> Self {
        Self {
            rows_read,
            malformed_rows,
            rows_kept: report.records.len(),
            dropped_header_marker: report.dropped_header_marker,
            dropped_invalid_date: report.dropped_invalid_date,
            dropped_invalid_price: report.dropped_invalid_price,
            dropped_non_positive_price: report.dropped_non_positive_price,
            imputed_labels: report.imputed_labels,
            aggregate_rows,
        }
    }
}

impl ForecastingSummary {
    pub fn new(config: &ForecastConfig, run: &ForecastRun) -> Self {
        Self {
            settings: SettingsSummary {
                min_observations: config.min_observations,
                horizon: config.horizon,
                interval_width: config.interval_width,
                uncertainty_samples: config.uncertainty_samples,
                seed: config.seed,
                yearly: config.yearly,
                n_changepoints: config.n_changepoints,
                changepoint_prior_scale: config.changepoint_prior_scale,
                seasonality_prior_scale: config.seasonality_prior_scale,
            },
            rows_written: run.forecasts.iter().map(|f| f.points.len()).sum(),
            forecasts: run
                .forecasts
                .iter()
                .map(|f| CommoditySummary {
                    commodity: f.commodity.clone(),
                    observations: f.observations,
                    last_observed: f.last_observed,
                    rows: f.points.len(),
                    fit: f.fit.clone(),
                })
                .collect(),
            skipped: run
                .skipped
                .iter()
                .map(|s| SkippedSummary {
                    commodity: s.commodity.clone(),
                    observations: s.observations,
                })
                .collect(),
            failed: run
                .failed
                .iter()
                .map(|f| FailedSummary {
                    commodity: f.commodity.clone(),
                    error: f.error.to_string(),
                })
                .collect(),
        }
    }
}

/// Write the summary as pretty-printed JSON.
pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::new(2, format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}
