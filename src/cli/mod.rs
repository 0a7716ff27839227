//! Command-line parsing for the commodity price pipeline.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the cleaning/modeling code. Defaults reproduce the fixed
//! paths of the batch job, so a bare `price-forecast` does the full run.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::YearlySeasonality;

pub const DEFAULT_INPUT: &str = "data/raw/food_prices.csv";
pub const DEFAULT_CLEANED: &str = "data/processed/cleaned_food_prices.csv";
pub const DEFAULT_AGGREGATES: &str = "data/processed/processed_food_prices.csv";
pub const DEFAULT_FORECASTS: &str = "predictions/all_commodity_predictions.csv";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "price-forecast",
    version,
    about = "Clean commodity price data, aggregate it monthly and forecast each commodity"
)]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Clean, aggregate, export, then forecast every commodity (default).
    Run(RunArgs),
    /// Clean and aggregate the raw dataset only.
    Clean(CleanArgs),
    /// Forecast from a previously exported monthly-aggregate table.
    Forecast(ForecastArgs),
    /// Plot one commodity's history and forecast from the exported files.
    Plot(PlotArgs),
}

/// Input and intermediate file locations.
#[derive(Debug, Args, Clone)]
pub struct CleanPaths {
    /// Raw price CSV.
    #[arg(long, value_name = "CSV", default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Where to write the cleaned records.
    #[arg(long, value_name = "CSV", default_value = DEFAULT_CLEANED)]
    pub cleaned: PathBuf,

    /// Where to write the monthly aggregates.
    #[arg(long, value_name = "CSV", default_value = DEFAULT_AGGREGATES)]
    pub aggregates: PathBuf,
}

/// Report options shared by every stage.
#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    /// Rows shown in console previews.
    #[arg(long, default_value_t = 5)]
    pub preview: usize,

    /// Also write a JSON run summary.
    #[arg(long, value_name = "JSON")]
    pub summary: Option<PathBuf>,
}

/// Forecasting knobs.
#[derive(Debug, Args, Clone)]
pub struct ForecastOpts {
    /// Commodities with fewer monthly observations are skipped.
    #[arg(long, default_value_t = 12)]
    pub min_months: usize,

    /// Months to project past the last observation.
    #[arg(long, default_value_t = 3)]
    pub horizon: usize,

    /// Probability mass inside the reported bounds.
    #[arg(long, default_value_t = 0.8)]
    pub interval_width: f64,

    /// Simulated draws used for the bounds.
    #[arg(long, default_value_t = 1000)]
    pub uncertainty_samples: usize,

    /// Random seed (combined with the commodity name).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Yearly seasonality: auto enables it with two or more years of history.
    #[arg(long, value_enum, default_value_t = YearlySeasonality::Auto)]
    pub yearly: YearlySeasonality,

    /// Fourier order of the yearly component.
    #[arg(long, default_value_t = 10)]
    pub yearly_order: usize,

    /// Maximum number of trend changepoints.
    #[arg(long, default_value_t = 25)]
    pub changepoints: usize,

    /// Fraction of history in which changepoints may be placed.
    #[arg(long, default_value_t = 0.8)]
    pub changepoint_range: f64,

    /// Trend flexibility (Laplace prior scale on changepoint deltas).
    #[arg(long, default_value_t = 0.05)]
    pub changepoint_prior_scale: f64,

    /// Seasonality flexibility (Normal prior scale on Fourier coefficients).
    #[arg(long, default_value_t = 10.0)]
    pub seasonality_prior_scale: f64,

    /// Worker threads for per-commodity fits (default: one per core).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Abort the whole run when any commodity fails to fit.
    #[arg(long)]
    pub fail_fast: bool,
}

/// Options for the full run.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub paths: CleanPaths,

    /// Where to write the combined forecast table.
    #[arg(long, value_name = "CSV", default_value = DEFAULT_FORECASTS)]
    pub output: PathBuf,

    #[command(flatten)]
    pub forecast: ForecastOpts,

    #[command(flatten)]
    pub report: ReportArgs,
}

/// Options for the cleaning stage.
#[derive(Debug, Args, Clone)]
pub struct CleanArgs {
    #[command(flatten)]
    pub paths: CleanPaths,

    #[command(flatten)]
    pub report: ReportArgs,
}

/// Options for the forecasting stage.
#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// Monthly-aggregate table produced by `clean`.
    #[arg(long, value_name = "CSV", default_value = DEFAULT_AGGREGATES)]
    pub aggregates: PathBuf,

    /// Where to write the combined forecast table.
    #[arg(long, value_name = "CSV", default_value = DEFAULT_FORECASTS)]
    pub output: PathBuf,

    #[command(flatten)]
    pub forecast: ForecastOpts,

    #[command(flatten)]
    pub report: ReportArgs,
}

/// Options for plotting a saved forecast.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Commodity to plot (exact name).
    #[arg(long)]
    pub commodity: String,

    /// Monthly-aggregate table produced by `clean`.
    #[arg(long, value_name = "CSV", default_value = DEFAULT_AGGREGATES)]
    pub aggregates: PathBuf,

    /// Forecast table produced by `run` or `forecast`.
    #[arg(long, value_name = "CSV", default_value = DEFAULT_FORECASTS)]
    pub forecasts: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
