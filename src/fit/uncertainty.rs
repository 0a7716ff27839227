//! Simulated uncertainty intervals.
//!
//! Each draw is the fitted trend, plus (beyond the history) a random set of
//! future trend changes, plus the seasonal component, plus observation noise:
//!
//! - future changepoints arrive uniformly on `(1, T]` with a Poisson count of
//!   mean `C·(T - 1)`, where `C` is the number of fitted changepoints
//! - each future change is Laplace(0, mean |δ|)
//! - noise is Normal(0, σ)
//!
//! Interval bounds are empirical quantiles of the draws. Within the history
//! the trend is deterministic, so only the noise widens the band there.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Exp, Normal, Poisson};

use crate::error::ForecastError;
use crate::fit::fitter::FittedModel;
use crate::math::{mean, quantile_mut, quantile_sorted};

/// Added to the mean |δ| so the Laplace scale is never zero.
const LAPLACE_SCALE_EPS: f64 = 1e-8;

/// Point estimate and interval for one evaluation day, in price units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub yhat: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Simulate `samples` draws at every day in `days` and return the
/// `interval_width` central interval around each point prediction.
///
/// The returned bounds always satisfy `lower <= yhat <= upper`.
pub fn predict_intervals(
    fit: &FittedModel,
    days: &[f64],
    samples: usize,
    interval_width: f64,
    rng: &mut StdRng,
) -> Result<Vec<Interval>, ForecastError> {
    if samples == 0 {
        return Err(ForecastError::InvalidConfig("uncertainty samples must be > 0".to_string()));
    }
    if !(interval_width > 0.0 && interval_width < 1.0) {
        return Err(ForecastError::InvalidConfig(format!(
            "interval width must be in (0, 1), got {interval_width}"
        )));
    }

    let ts: Vec<f64> = days.iter().map(|&d| fit.scale.scaled(d)).collect();
    let t_max = ts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let seasonal: Vec<f64> = days.iter().map(|&d| fit.model.seasonal(d)).collect();

    let noise = Normal::new(0.0, fit.sigma).map_err(|_| ForecastError::NonFinite)?;
    let abs_deltas: Vec<f64> = fit.model.deltas.iter().map(|d| d.abs()).collect();
    let laplace_scale = mean(&abs_deltas).unwrap_or(0.0) + LAPLACE_SCALE_EPS;
    let change_magnitude = Exp::new(1.0 / laplace_scale).map_err(|_| ForecastError::NonFinite)?;

    let expected_changes = fit.model.changepoints.len() as f64 * (t_max - 1.0);
    let arrivals = if expected_changes > 0.0 {
        Some(Poisson::new(expected_changes).map_err(|_| ForecastError::NonFinite)?)
    } else {
        None
    };

    // draws[i * samples + s]
    let mut draws = vec![0.0; days.len() * samples];
    let mut extra: Vec<(f64, f64)> = Vec::new();

    for s in 0..samples {
        extra.clear();
        if let Some(poisson) = &arrivals {
            let count: f64 = poisson.sample(rng);
            for _ in 0..count as usize {
                let at = 1.0 + rng.gen_range(0.0..1.0) * (t_max - 1.0);
                let magnitude: f64 = change_magnitude.sample(rng);
                let delta = if rng.gen_bool(0.5) { magnitude } else { -magnitude };
                extra.push((at, delta));
            }
        }

        for (i, (&t, &season)) in ts.iter().zip(&seasonal).enumerate() {
            let trend = fit.model.trend_with(t, &extra);
            draws[i * samples + s] = (trend + season + noise.sample(rng)) * fit.y_scale;
        }
    }

    let lower_q = (1.0 - interval_width) / 2.0;
    let upper_q = 1.0 - lower_q;

    let mut out = Vec::with_capacity(days.len());
    for (i, &day) in days.iter().enumerate() {
        let column = &mut draws[i * samples..(i + 1) * samples];

        let yhat = fit.predict_day(day);
        let lower = quantile_mut(column, lower_q).ok_or(ForecastError::NonFinite)?;
        let upper = quantile_sorted(column, upper_q).ok_or(ForecastError::NonFinite)?;
        if !(yhat.is_finite() && lower.is_finite() && upper.is_finite()) {
            return Err(ForecastError::NonFinite);
        }

        out.push(Interval {
            yhat,
            lower: lower.min(yhat),
            upper: upper.max(yhat),
        });
    }

    Ok(out)
}
