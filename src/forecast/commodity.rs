//! Forecast for a single commodity series.
//!
//! This is a pure function of the series and the configuration: it owns its
//! inputs and its RNG, so commodities can be processed in any order (or in
//! parallel) with identical results.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::domain::{CommodityForecast, CommoditySeries, FitSummary, ForecastConfig, ForecastPoint, YearMonth};
use crate::error::ForecastError;
use crate::fit::{fit_series, predict_intervals, FitOptions};
use crate::models::epoch_day;

/// Result of processing one commodity.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Forecast(CommodityForecast),
    /// Not enough monthly observations; no rows are produced.
    Skipped { commodity: String, observations: usize },
}

/// Reject configurations no series could be fitted with.
pub fn validate_config(config: &ForecastConfig) -> Result<(), ForecastError> {
    let invalid = |msg: String| Err(ForecastError::InvalidConfig(msg));

    if config.min_observations < 2 {
        return invalid(format!("min months must be >= 2, got {}", config.min_observations));
    }
    if config.horizon == 0 {
        return invalid("horizon must be >= 1".to_string());
    }
    if !(config.interval_width > 0.0 && config.interval_width < 1.0) {
        return invalid(format!("interval width must be in (0, 1), got {}", config.interval_width));
    }
    if config.uncertainty_samples == 0 {
        return invalid("uncertainty samples must be >= 1".to_string());
    }
    if !(config.changepoint_range > 0.0 && config.changepoint_range <= 1.0) {
        return invalid(format!("changepoint range must be in (0, 1], got {}", config.changepoint_range));
    }
    if !(config.changepoint_prior_scale.is_finite() && config.changepoint_prior_scale > 0.0) {
        return invalid(format!(
            "changepoint prior scale must be > 0, got {}",
            config.changepoint_prior_scale
        ));
    }
    if !(config.seasonality_prior_scale.is_finite() && config.seasonality_prior_scale > 0.0) {
        return invalid(format!(
            "seasonality prior scale must be > 0, got {}",
            config.seasonality_prior_scale
        ));
    }
    if config.fit_iterations == 0 {
        return invalid("fit iterations must be >= 1".to_string());
    }
    if config.threads == Some(0) {
        return invalid("threads must be >= 1".to_string());
    }
    Ok(())
}

/// Fit one commodity and project its history plus `config.horizon` months.
pub fn forecast_commodity(series: &CommoditySeries, config: &ForecastConfig) -> Result<Outcome, ForecastError> {
    let n = series.len();
    if n < config.min_observations {
        return Ok(Outcome::Skipped {
            commodity: series.commodity.clone(),
            observations: n,
        });
    }

    validate_series(series)?;

    let Some(last_observed) = series.last_month() else {
        return Err(ForecastError::InsufficientData {
            needed: config.min_observations,
            got: 0,
        });
    };

    let months: Vec<YearMonth> = series
        .points
        .iter()
        .map(|p| p.month)
        .chain(future_months(last_observed, config.horizon)?)
        .collect();

    let history_days: Vec<f64> = series.points.iter().map(|p| epoch_day(p.month.first_day())).collect();
    let values: Vec<f64> = series.points.iter().map(|p| p.value).collect();
    let fit = fit_series(&history_days, &values, &fit_options(config))?;

    let eval_days: Vec<f64> = months.iter().map(|m| epoch_day(m.first_day())).collect();
    let mut rng = StdRng::seed_from_u64(commodity_seed(&series.commodity, config.seed));
    let intervals = predict_intervals(
        &fit,
        &eval_days,
        config.uncertainty_samples,
        config.interval_width,
        &mut rng,
    )?;

    let points = months
        .iter()
        .zip(intervals)
        .map(|(month, iv)| ForecastPoint {
            commodity: series.commodity.clone(),
            date: month.first_day(),
            predicted_price: iv.yhat,
            lower_bound: iv.lower,
            upper_bound: iv.upper,
        })
        .collect();

    Ok(Outcome::Forecast(CommodityForecast {
        commodity: series.commodity.clone(),
        observations: n,
        last_observed,
        points,
        fit: FitSummary {
            sigma: fit.sigma * fit.y_scale,
            rmse: fit.rmse,
            changepoints: fit.model.changepoints.len(),
            yearly_seasonality: fit.yearly,
        },
    }))
}

/// The `horizon` months that follow `last`.
pub fn future_months(last: YearMonth, horizon: usize) -> Result<Vec<YearMonth>, ForecastError> {
    let mut out = Vec::with_capacity(horizon);
    let mut current = last;
    for _ in 0..horizon {
        current = current.succ().ok_or_else(|| {
            ForecastError::InvalidConfig(format!("horizon extends past the supported date range after {last}"))
        })?;
        out.push(current);
    }
    Ok(out)
}

fn validate_series(series: &CommoditySeries) -> Result<(), ForecastError> {
    for pair in series.points.windows(2) {
        if pair[0].month == pair[1].month {
            return Err(ForecastError::DuplicatePeriod(pair[1].month.to_string()));
        }
    }
    for p in &series.points {
        if !(p.value.is_finite() && p.value > 0.0) {
            return Err(ForecastError::InvalidObservation {
                month: p.month.to_string(),
                value: p.value,
            });
        }
    }
    Ok(())
}

fn fit_options(config: &ForecastConfig) -> FitOptions {
    FitOptions {
        n_changepoints: config.n_changepoints,
        changepoint_range: config.changepoint_range,
        changepoint_prior_scale: config.changepoint_prior_scale,
        yearly: config.yearly,
        yearly_order: config.yearly_order,
        seasonality_prior_scale: config.seasonality_prior_scale,
        iterations: config.fit_iterations,
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// RNG seed for one commodity: 64-bit FNV-1a over the name bytes followed by
/// the little-endian run seed. Stable across toolchains and platforms.
fn commodity_seed(commodity: &str, seed: u64) -> u64 {
    commodity
        .as_bytes()
        .iter()
        .chain(seed.to_le_bytes().iter())
        .fold(FNV_OFFSET, |hash, &byte| (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MonthlyPoint;
    use proptest::prelude::*;

    fn series(commodity: &str, start: (i32, u32), values: &[f64]) -> CommoditySeries {
        let mut month = YearMonth::new(start.0, start.1).unwrap();
        let mut points = Vec::new();
        for &value in values {
            points.push(MonthlyPoint { month, value });
            month = month.succ().unwrap();
        }
        CommoditySeries {
            commodity: commodity.to_string(),
            points,
        }
    }

    fn fast_config() -> ForecastConfig {
        ForecastConfig {
            uncertainty_samples: 200,
            ..ForecastConfig::default()
        }
    }

    fn linear(n: usize) -> Vec<f64> {
        (0..n).map(|i| 400.0 + 5.0 * i as f64).collect()
    }

    #[test]
    fn eleven_months_are_skipped() {
        let s = series("Beans", (2022, 8), &linear(11));
        let out = forecast_commodity(&s, &fast_config()).unwrap();
        assert_eq!(
            out,
            Outcome::Skipped {
                commodity: "Beans".to_string(),
                observations: 11
            }
        );
    }

    #[test]
    fn twelve_months_project_three_months_past_june() {
        // 2022-07 ..= 2023-06
        let s = series("Beans", (2022, 7), &linear(12));
        let Outcome::Forecast(fc) = forecast_commodity(&s, &fast_config()).unwrap() else {
            panic!("expected a forecast");
        };

        assert_eq!(fc.points.len(), 12 + 3);
        assert_eq!(fc.last_observed.to_string(), "2023-06");
        let future: Vec<String> = fc.points[12..].iter().map(|p| p.date.to_string()).collect();
        assert_eq!(future, vec!["2023-07-01", "2023-08-01", "2023-09-01"]);
        assert_eq!(fc.points[0].date.to_string(), "2022-07-01");
        assert!(fc.points.iter().all(|p| p.commodity == "Beans"));
    }

    #[test]
    fn bounds_always_bracket_prediction() {
        let values: Vec<f64> = (0..30)
            .map(|i| 100.0 + 3.0 * i as f64 + if i % 2 == 0 { 6.0 } else { -4.0 })
            .collect();
        let s = series("Maize", (2020, 1), &values);
        let Outcome::Forecast(fc) = forecast_commodity(&s, &fast_config()).unwrap() else {
            panic!("expected a forecast");
        };
        for p in &fc.points {
            assert!(p.lower_bound <= p.predicted_price && p.predicted_price <= p.upper_bound, "{p:?}");
        }
    }

    #[test]
    fn same_seed_gives_identical_forecasts() {
        let s = series("Rice", (2021, 1), &linear(15));
        let a = forecast_commodity(&s, &fast_config()).unwrap();
        let b = forecast_commodity(&s, &fast_config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn linear_series_is_followed() {
        let values = linear(24);
        let s = series("Sugar", (2021, 1), &values);
        let Outcome::Forecast(fc) = forecast_commodity(&s, &fast_config()).unwrap() else {
            panic!("expected a forecast");
        };
        for (p, &v) in fc.points.iter().zip(&values) {
            // Month lengths vary, so a linear-by-index series is only nearly linear in days.
            assert!((p.predicted_price - v).abs() / v < 0.01, "{} vs {v}", p.predicted_price);
        }
        assert!(fc.points[24].predicted_price > fc.points[23].predicted_price);
    }

    #[test]
    fn duplicate_month_is_an_error() {
        let mut s = series("Beans", (2022, 1), &linear(12));
        s.points[5].month = s.points[4].month;
        let err = forecast_commodity(&s, &fast_config()).unwrap_err();
        assert!(matches!(err, ForecastError::DuplicatePeriod(_)));
    }

    #[test]
    fn non_positive_value_is_an_error() {
        let mut values = linear(12);
        values[3] = 0.0;
        let s = series("Beans", (2022, 1), &values);
        let err = forecast_commodity(&s, &fast_config()).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidObservation { .. }));
    }

    #[test]
    fn future_months_roll_over_year_end() {
        let out = future_months(YearMonth::new(2023, 11).unwrap(), 3).unwrap();
        let labels: Vec<String> = out.iter().map(|m| m.to_string()).collect();
        assert_eq!(labels, vec!["2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn config_validation_catches_bad_values() {
        assert!(validate_config(&ForecastConfig::default()).is_ok());
        for bad in [
            ForecastConfig { horizon: 0, ..ForecastConfig::default() },
            ForecastConfig { interval_width: 1.0, ..ForecastConfig::default() },
            ForecastConfig { min_observations: 1, ..ForecastConfig::default() },
            ForecastConfig { threads: Some(0), ..ForecastConfig::default() },
            ForecastConfig { changepoint_prior_scale: 0.0, ..ForecastConfig::default() },
        ] {
            assert!(matches!(validate_config(&bad), Err(ForecastError::InvalidConfig(_))));
        }
    }

    #[test]
    fn commodity_seed_is_a_fixed_function_of_name_and_seed() {
        assert_eq!(commodity_seed("Beans", 42), 0xfccf_9fee_9be7_2d36);
        assert_eq!(commodity_seed("Maize", 42), 0x8db4_ff90_d540_1259);
        assert_ne!(commodity_seed("Beans", 42), commodity_seed("Beans", 43));
    }

    /// Month gaps (mostly consecutive, occasionally skipping) and positive
    /// prices: constant, wide-range and spiky around a base level.
    fn gapped_series() -> impl Strategy<Value = (Vec<u32>, Vec<f64>)> {
        (12usize..80).prop_flat_map(|n| {
            let gaps = prop::collection::vec(prop_oneof![4 => Just(1u32), 1 => 2u32..=3], n);
            let values = prop_oneof![
                (1.0..1e4_f64).prop_map(move |c| vec![c; n]),
                prop::collection::vec(1e-3..1e6_f64, n),
                (10.0..1000.0_f64, prop::collection::vec(0.5..3.0_f64, n))
                    .prop_map(|(base, k)| k.into_iter().map(|x| base * x).collect()),
            ];
            (gaps, values)
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn any_long_enough_series_gets_history_plus_horizon((gaps, values) in gapped_series()) {
            let mut month = YearMonth::new(2015, 1).unwrap();
            let mut points = Vec::with_capacity(values.len());
            for (i, (&gap, &value)) in gaps.iter().zip(&values).enumerate() {
                if i > 0 {
                    for _ in 0..gap {
                        month = month.succ().unwrap();
                    }
                }
                points.push(MonthlyPoint { month, value });
            }
            let n = points.len();
            let s = CommoditySeries {
                commodity: "Beans".to_string(),
                points,
            };
            let config = ForecastConfig {
                uncertainty_samples: 100,
                ..ForecastConfig::default()
            };

            let Outcome::Forecast(fc) = forecast_commodity(&s, &config).unwrap() else {
                panic!("series of {n} months was skipped");
            };

            prop_assert_eq!(fc.points.len(), n + config.horizon);
            for p in &fc.points {
                prop_assert!(p.lower_bound <= p.predicted_price && p.predicted_price <= p.upper_bound, "{:?}", p);
            }

            let mut expected = month;
            for p in &fc.points[n..] {
                expected = expected.succ().unwrap();
                prop_assert_eq!(p.date, expected.first_day());
            }
        }
    }
}
