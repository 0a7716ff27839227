//! Penalized fit of the trend + seasonality model to one monthly series.
//!
//! Given:
//! - observation days `d_i` (absolute day numbers, strictly increasing)
//! - observed prices `y_i`
//!
//! we find the MAP coefficients under:
//! - Normal(0, 5) on offset and slope
//! - Laplace(0, τ) on changepoint deltas
//! - Normal(0, s) on seasonal coefficients
//! - Normal(0, σ) observation noise
//!
//! The priors enter the least-squares system as pseudo-observation rows
//! (ridge penalties scaled by the current `σ²`). The Laplace prior has no
//! ridge form, so it is approximated by reweighting: each pass penalizes
//! `δ_j` with precision `σ² / (τ·|δ_j|)` taken from the previous pass. `σ` is
//! re-estimated from the residuals after every pass.

use nalgebra::{DMatrix, DVector};
use tracing::trace;

use crate::domain::YearlySeasonality;
use crate::error::ForecastError;
use crate::fit::changepoints::changepoint_locations;
use crate::math::{solve_penalized, std_dev};
use crate::models::{fill_design_row, ModelLayout, TimeScale, TrendSeasonalModel};

/// Offset and slope prior standard deviation (scaled units).
const TREND_PRIOR_SCALE: f64 = 5.0;

/// Lower bound on the noise estimate (scaled units).
const SIGMA_FLOOR: f64 = 1e-6;

/// Lower bound on `|δ|` when turning the Laplace prior into a ridge weight.
const DELTA_FLOOR: f64 = 1e-8;

/// History needed before `auto` turns yearly seasonality on.
const YEARLY_AUTO_MIN_DAYS: f64 = 730.0;

/// Options that affect how a series is calibrated.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub n_changepoints: usize,
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub yearly: YearlySeasonality,
    pub yearly_order: usize,
    pub seasonality_prior_scale: f64,
    /// Number of reweighted least-squares passes.
    pub iterations: usize,
}

/// A calibrated model plus everything needed to evaluate it in price units.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub model: TrendSeasonalModel,
    pub scale: TimeScale,
    /// Observations were divided by this before fitting.
    pub y_scale: f64,
    /// Noise standard deviation in scaled units.
    pub sigma: f64,
    /// In-sample RMSE in price units.
    pub rmse: f64,
    pub yearly: bool,
}

impl FittedModel {
    /// Point prediction in price units.
    pub fn predict_day(&self, day: f64) -> f64 {
        self.model.predict(self.scale.scaled(day), day) * self.y_scale
    }
}

/// Fit the model to `(days, y)`.
pub fn fit_series(days: &[f64], y: &[f64], opts: &FitOptions) -> Result<FittedModel, ForecastError> {
    let n = days.len();
    if n < 2 || y.len() != n {
        return Err(ForecastError::InsufficientData { needed: 2, got: n.min(y.len()) });
    }
    if days.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(ForecastError::NonFinite);
    }
    if !(opts.changepoint_prior_scale > 0.0 && opts.seasonality_prior_scale > 0.0) {
        return Err(ForecastError::InvalidConfig(
            "prior scales must be > 0".to_string(),
        ));
    }

    let origin_day = days[0];
    let span_days = days[n - 1] - origin_day;
    if span_days <= 0.0 {
        return Err(ForecastError::ZeroSpan);
    }
    let scale = TimeScale { origin_day, span_days };

    let y_scale = y.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if y_scale <= 0.0 {
        return Err(ForecastError::NonFinite);
    }
    let ys: Vec<f64> = y.iter().map(|v| v / y_scale).collect();
    let ts: Vec<f64> = days.iter().map(|&d| scale.scaled(d)).collect();

    let changepoints = changepoint_locations(&ts, opts.n_changepoints, opts.changepoint_range)?;
    let yearly = match opts.yearly {
        YearlySeasonality::On => opts.yearly_order > 0,
        YearlySeasonality::Off => false,
        YearlySeasonality::Auto => opts.yearly_order > 0 && span_days >= YEARLY_AUTO_MIN_DAYS,
    };
    let layout = ModelLayout {
        n_changepoints: changepoints.len(),
        fourier_order: if yearly { opts.yearly_order } else { 0 },
    };

    let p = layout.beta_len();
    let mut x = DMatrix::<f64>::zeros(n, p);
    let mut row = vec![0.0; p];
    for i in 0..n {
        fill_design_row(layout, &changepoints, ts[i], days[i], &mut row);
        for j in 0..p {
            x[(i, j)] = row[j];
        }
    }
    let yv = DVector::from_column_slice(&ys);

    // Deltas start from the Gaussian with the Laplace prior's variance (2τ²).
    let tau = opts.changepoint_prior_scale;
    let mut delta_var: Vec<f64> = vec![2.0 * tau * tau; layout.n_changepoints];
    let mut sigma = std_dev(&ys).unwrap_or(1.0).max(SIGMA_FLOOR);
    let mut betas: Option<DVector<f64>> = None;

    for pass in 0..opts.iterations.max(1) {
        let penalty = prior_penalty(layout, sigma, &delta_var, opts.seasonality_prior_scale);
        let beta = solve_penalized(&x, &yv, &penalty).ok_or(ForecastError::SingularDesign)?;

        let residuals = &yv - &x * &beta;
        let sse = residuals.norm_squared();
        sigma = (sse / n as f64).sqrt().max(SIGMA_FLOOR);

        // Reweight: Laplace(0, τ) ≈ Normal(0, τ·|δ|) around the current estimate.
        for (var, &d) in delta_var.iter_mut().zip(beta.rows(2, layout.n_changepoints).iter()) {
            *var = tau * d.abs().max(DELTA_FLOOR);
        }

        trace!(pass, sigma, sse, "reweighted pass");
        betas = Some(beta);
    }

    let Some(beta) = betas else {
        return Err(ForecastError::SingularDesign);
    };
    let beta: Vec<f64> = beta.iter().copied().collect();
    let model = TrendSeasonalModel::from_betas(layout, &changepoints, &beta);

    let residuals = compute_residuals(&model, &ts, days, &ys);
    let sse: f64 = residuals.iter().map(|r| r * r).sum();
    let rmse = (sse / n as f64).sqrt() * y_scale;
    if !(rmse.is_finite() && sigma.is_finite()) {
        return Err(ForecastError::NonFinite);
    }

    Ok(FittedModel {
        model,
        scale,
        y_scale,
        sigma,
        rmse,
        yearly,
    })
}

/// Ridge precisions `σ²/var_j` for every coefficient.
fn prior_penalty(layout: ModelLayout, sigma: f64, delta_var: &[f64], seasonality_scale: f64) -> Vec<f64> {
    let s2 = sigma * sigma;
    let mut penalty = vec![0.0; layout.beta_len()];

    let trend_var = TREND_PRIOR_SCALE * TREND_PRIOR_SCALE;
    penalty[ModelLayout::OFFSET] = s2 / trend_var;
    penalty[ModelLayout::SLOPE] = s2 / trend_var;

    for (slot, var) in penalty[layout.delta_range()].iter_mut().zip(delta_var) {
        *slot = s2 / var;
    }

    let seasonal_var = seasonality_scale * seasonality_scale;
    for slot in &mut penalty[layout.seasonal_range()] {
        *slot = s2 / seasonal_var;
    }

    penalty
}

fn compute_residuals(model: &TrendSeasonalModel, ts: &[f64], days: &[f64], y: &[f64]) -> Vec<f64> {
    ts.iter()
        .zip(days)
        .zip(y)
        .map(|((&t, &d), &yi)| yi - model.predict(t, d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> FitOptions {
        FitOptions {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            yearly: YearlySeasonality::Auto,
            yearly_order: 10,
            seasonality_prior_scale: 10.0,
            iterations: 8,
        }
    }

    fn monthly_days(n: usize) -> Vec<f64> {
        // Roughly monthly spacing starting 2020-01-01.
        (0..n).map(|i| 18262.0 + (i as f64 * 30.4375).round()).collect()
    }

    #[test]
    fn recovers_a_linear_series() {
        let days = monthly_days(24);
        let y: Vec<f64> = days.iter().map(|d| 100.0 + 0.5 * (d - days[0])).collect();

        let fit = fit_series(&days, &y, &FitOptions { yearly: YearlySeasonality::Off, ..opts() }).unwrap();

        for (&d, &yi) in days.iter().zip(&y) {
            let rel = (fit.predict_day(d) - yi).abs() / yi;
            assert!(rel < 1e-3, "relative error {rel} at day {d}");
        }
        // Extrapolation continues the line.
        let next = days[23] + 31.0;
        let expected = 100.0 + 0.5 * (next - days[0]);
        assert!((fit.predict_day(next) - expected).abs() / expected < 1e-2);
        assert!(!fit.yearly);
    }

    #[test]
    fn auto_yearly_needs_two_years_of_history() {
        let short = monthly_days(12);
        let y: Vec<f64> = short.iter().map(|d| 50.0 + (d / 100.0).sin()).collect();
        assert!(!fit_series(&short, &y, &opts()).unwrap().yearly);

        let long = monthly_days(30);
        let y: Vec<f64> = long.iter().map(|d| 50.0 + (d / 100.0).sin()).collect();
        let fit = fit_series(&long, &y, &opts()).unwrap();
        assert!(fit.yearly);
        assert_eq!(fit.model.seasonal.len(), 20);
    }

    #[test]
    fn forced_yearly_on_short_history_stays_finite() {
        let days = monthly_days(12);
        let y: Vec<f64> = days.iter().enumerate().map(|(i, _)| 200.0 + (i % 4) as f64 * 7.0).collect();
        let fit = fit_series(&days, &y, &FitOptions { yearly: YearlySeasonality::On, ..opts() }).unwrap();
        assert!(fit.yearly);
        assert!(fit.sigma.is_finite() && fit.rmse.is_finite());
        for &d in &days {
            assert!(fit.predict_day(d).is_finite());
        }
    }

    #[test]
    fn seasonal_pattern_is_captured() {
        let days = monthly_days(48);
        let y: Vec<f64> = days
            .iter()
            .map(|d| 100.0 + 10.0 * (2.0 * std::f64::consts::PI * d / 365.25).sin())
            .collect();

        let fit = fit_series(&days, &y, &opts()).unwrap();
        assert!(fit.yearly);
        assert!(fit.rmse < 1.0, "rmse {}", fit.rmse);
    }

    #[test]
    fn constant_days_are_rejected() {
        let err = fit_series(&[10.0, 10.0, 10.0], &[1.0, 2.0, 3.0], &opts()).unwrap_err();
        assert_eq!(err, ForecastError::ZeroSpan);
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let days = monthly_days(3);
        let err = fit_series(&days, &[1.0, f64::NAN, 3.0], &opts()).unwrap_err();
        assert_eq!(err, ForecastError::NonFinite);
    }
}
