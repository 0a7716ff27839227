//! Forecasting every commodity and assembling the combined table.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{CommodityForecast, CommoditySeries, FailurePolicy, ForecastConfig, ForecastPoint};
use crate::error::{AppError, ForecastError};
use crate::forecast::commodity::{forecast_commodity, validate_config, Outcome};

/// A commodity with too little history to model.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCommodity {
    pub commodity: String,
    pub observations: usize,
}

/// A commodity whose fit failed (only under `FailurePolicy::Skip`).
#[derive(Debug, Clone, PartialEq)]
pub struct FailedCommodity {
    pub commodity: String,
    pub observations: usize,
    pub error: ForecastError,
}

/// Everything produced by one forecasting pass, in input order.
#[derive(Debug, Clone, Default)]
pub struct ForecastRun {
    pub forecasts: Vec<CommodityForecast>,
    pub skipped: Vec<SkippedCommodity>,
    pub failed: Vec<FailedCommodity>,
}

impl ForecastRun {
    /// Combined forecast table.
    pub fn table(&self) -> Vec<ForecastPoint> {
        assemble(&self.forecasts)
    }
}

/// Forecast every series.
///
/// Series are fitted in parallel; results keep the input order. With
/// `FailurePolicy::Abort` the first failing commodity (in input order) aborts
/// the run with exit code 4.
pub fn forecast_all(series: &[CommoditySeries], config: &ForecastConfig) -> Result<ForecastRun, AppError> {
    validate_config(config)?;

    let results: Vec<Result<Outcome, ForecastError>> = match config.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| AppError::new(2, format!("Failed to build thread pool: {e}")))?;
            pool.install(|| fit_each(series, config))
        }
        None => fit_each(series, config),
    };

    let mut run = ForecastRun::default();
    for (s, result) in series.iter().zip(results) {
        match result {
            Ok(Outcome::Forecast(fc)) => {
                debug!(
                    commodity = %fc.commodity,
                    observations = fc.observations,
                    rmse = fc.fit.rmse,
                    changepoints = fc.fit.changepoints,
                    yearly = fc.fit.yearly_seasonality,
                    "forecast ready"
                );
                run.forecasts.push(fc);
            }
            Ok(Outcome::Skipped { commodity, observations }) => {
                info!(
                    commodity = %commodity,
                    observations,
                    needed = config.min_observations,
                    "skipping commodity: insufficient history"
                );
                run.skipped.push(SkippedCommodity { commodity, observations });
            }
            Err(error) => match config.failure_policy {
                FailurePolicy::Abort => {
                    return Err(AppError::new(
                        4,
                        format!("Forecast failed for commodity `{}`: {error}", s.commodity),
                    ));
                }
                FailurePolicy::Skip => {
                    warn!(commodity = %s.commodity, error = %error, "forecast failed; continuing");
                    run.failed.push(FailedCommodity {
                        commodity: s.commodity.clone(),
                        observations: s.len(),
                        error,
                    });
                }
            },
        }
    }

    Ok(run)
}

fn fit_each(series: &[CommoditySeries], config: &ForecastConfig) -> Vec<Result<Outcome, ForecastError>> {
    series
        .par_iter()
        .map(|s| forecast_commodity(s, config))
        .collect()
}

/// Concatenate per-commodity tables in processing order.
pub fn assemble(forecasts: &[CommodityForecast]) -> Vec<ForecastPoint> {
    let total = forecasts.iter().map(|f| f.points.len()).sum();
    let mut out = Vec::with_capacity(total);
    for f in forecasts {
        out.extend(f.points.iter().cloned());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MonthlyPoint, YearMonth};

    fn series(commodity: &str, n: usize, base: f64) -> CommoditySeries {
        let mut month = YearMonth::new(2021, 1).unwrap();
        let mut points = Vec::new();
        for i in 0..n {
            points.push(MonthlyPoint {
                month,
                value: base + 2.0 * i as f64 + (i % 3) as f64,
            });
            month = month.succ().unwrap();
        }
        CommoditySeries {
            commodity: commodity.to_string(),
            points,
        }
    }

    fn config() -> ForecastConfig {
        ForecastConfig {
            uncertainty_samples: 100,
            ..ForecastConfig::default()
        }
    }

    #[test]
    fn combined_rows_equal_sum_of_commodity_lengths() {
        let input = vec![series("Beans", 14, 500.0), series("Maize", 5, 200.0), series("Rice", 20, 900.0)];

        let run = forecast_all(&input, &config()).unwrap();
        assert_eq!(run.forecasts.len(), 2);
        assert_eq!(run.skipped, vec![SkippedCommodity { commodity: "Maize".to_string(), observations: 5 }]);
        assert!(run.failed.is_empty());

        let table = run.table();
        assert_eq!(table.len(), (14 + 3) + (20 + 3));
        // Contiguous blocks in input order.
        assert!(table[..17].iter().all(|p| p.commodity == "Beans"));
        assert!(table[17..].iter().all(|p| p.commodity == "Rice"));
    }

    #[test]
    fn thread_count_does_not_change_results() {
        let input = vec![series("Beans", 13, 500.0), series("Rice", 16, 900.0)];

        let parallel = forecast_all(&input, &config()).unwrap().table();
        let sequential = forecast_all(&input, &ForecastConfig { threads: Some(1), ..config() })
            .unwrap()
            .table();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn failure_policy_skip_records_and_continues() {
        let mut bad = series("Broken", 12, 100.0);
        bad.points[2].value = -1.0;
        let input = vec![bad, series("Beans", 12, 500.0)];

        let run = forecast_all(&input, &config()).unwrap();
        assert_eq!(run.forecasts.len(), 1);
        assert_eq!(run.failed.len(), 1);
        assert_eq!(run.failed[0].commodity, "Broken");
    }

    #[test]
    fn failure_policy_abort_stops_the_run() {
        let mut bad = series("Broken", 12, 100.0);
        bad.points[2].value = f64::NAN;
        let input = vec![series("Beans", 12, 500.0), bad];

        let cfg = ForecastConfig {
            failure_policy: FailurePolicy::Abort,
            ..config()
        };
        let err = forecast_all(&input, &cfg).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.message().contains("Broken"));
    }

    #[test]
    fn invalid_config_is_exit_code_two() {
        let cfg = ForecastConfig { horizon: 0, ..config() };
        let err = forecast_all(&[], &cfg).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn assemble_of_nothing_is_empty() {
        assert!(assemble(&[]).is_empty());
    }
}
