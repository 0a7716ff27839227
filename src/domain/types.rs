//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - threaded between pipeline stages as immutable artifacts
//! - exported to CSV/JSON
//! - reloaded later for plotting

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Date value of an embedded duplicate header row (HXL tag line).
pub const HEADER_MARKER: &str = "#date";

/// Sentinel written into missing categorical fields.
pub const UNKNOWN: &str = "Unknown";

/// Columns the raw dataset must provide.
pub const REQUIRED_COLUMNS: [&str; 7] = ["date", "admin1", "admin2", "market", "commodity", "unit", "price"];

/// A raw input row, restricted to the columns we care about.
///
/// Every field is an untyped, possibly missing string; typing happens in `clean`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// 1-based line number in the source file (header is line 1).
    pub line: usize,
    pub date: Option<String>,
    pub admin1: Option<String>,
    pub admin2: Option<String>,
    pub market: Option<String>,
    pub commodity: Option<String>,
    pub unit: Option<String>,
    pub price: Option<String>,
}

/// A validated observation: real calendar date, strictly positive price.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRecord {
    pub date: NaiveDate,
    pub admin1: String,
    pub admin2: String,
    pub market: String,
    pub commodity: String,
    pub unit: Option<String>,
    pub price: f64,
}

impl CleanedRecord {
    pub fn year_month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// Calendar month bucket, rendered as `YYYY-MM`.
///
/// Stored as the first day of the month so ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    /// First calendar day of the month.
    pub fn first_day(self) -> NaiveDate {
        self.0
    }

    /// The following month, or `None` past chrono's date range.
    pub fn succ(self) -> Option<Self> {
        self.0.checked_add_months(Months::new(1)).map(Self)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid year-month '{s}'. Expected YYYY-MM."))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("Invalid year in '{s}'. Expected YYYY-MM."))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("Invalid month in '{s}'. Expected YYYY-MM."))?;
        YearMonth::new(year, month).ok_or_else(|| format!("Invalid year-month '{s}'. Expected YYYY-MM."))
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Mean price of one commodity over one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyAggregate {
    pub commodity: String,
    pub year_month: YearMonth,
    pub average_price: f64,
    /// Number of cleaned records that contributed (in-memory only).
    pub observations: usize,
}

/// One monthly observation of a commodity series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyPoint {
    pub month: YearMonth,
    pub value: f64,
}

/// The monthly average-price series of a single commodity, in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct CommoditySeries {
    pub commodity: String,
    pub points: Vec<MonthlyPoint>,
}

impl CommoditySeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_month(&self) -> Option<YearMonth> {
        self.points.last().map(|p| p.month)
    }
}

/// A projected value with its uncertainty interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub commodity: String,
    pub date: NaiveDate,
    pub predicted_price: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Fit diagnostics for one commodity (for reports and the run summary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    /// Residual noise estimate in price units.
    pub sigma: f64,
    /// In-sample root mean squared error in price units.
    pub rmse: f64,
    pub changepoints: usize,
    pub yearly_seasonality: bool,
}

/// Projection for a single commodity: history followed by the future horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct CommodityForecast {
    pub commodity: String,
    pub observations: usize,
    pub last_observed: YearMonth,
    pub points: Vec<ForecastPoint>,
    pub fit: FitSummary,
}

/// Whether the yearly Fourier terms enter the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum YearlySeasonality {
    /// Enabled when the history spans at least two years.
    Auto,
    On,
    Off,
}

/// What to do when a commodity with enough history fails to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log, record the commodity as failed, and continue with the others.
    Skip,
    /// Abort the whole run.
    Abort,
}

/// Forecasting knobs. Defaults match the CLI defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    /// Commodities with fewer monthly observations are skipped.
    pub min_observations: usize,
    /// Number of future months to project.
    pub horizon: usize,
    /// Probability mass inside `[lower_bound, upper_bound]`.
    pub interval_width: f64,
    pub uncertainty_samples: usize,
    pub seed: u64,

    pub yearly: YearlySeasonality,
    pub yearly_order: usize,

    pub n_changepoints: usize,
    /// Fraction of history in which changepoints may be placed.
    pub changepoint_range: f64,
    /// Scale of the Laplace prior on trend changes.
    pub changepoint_prior_scale: f64,
    /// Standard deviation of the Normal prior on seasonal coefficients.
    pub seasonality_prior_scale: f64,
    /// Reweighted least-squares passes.
    pub fit_iterations: usize,

    pub failure_policy: FailurePolicy,
    /// Worker threads for per-commodity fits (`None` = rayon default).
    pub threads: Option<usize>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_observations: 12,
            horizon: 3,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            seed: 42,
            yearly: YearlySeasonality::Auto,
            yearly_order: 10,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            fit_iterations: 8,
            failure_policy: FailurePolicy::Skip,
            threads: None,
        }
    }
}

/// File locations and reporting options for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub cleaned_path: PathBuf,
    pub aggregates_path: PathBuf,
    pub forecast_path: PathBuf,
    pub summary_path: Option<PathBuf>,
    /// Rows shown in console previews.
    pub preview_rows: usize,
    pub forecast: ForecastConfig,
}
