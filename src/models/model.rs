//! Model evaluation for the additive trend + seasonality model.
//!
//! ```text
//! y(t, d) = m + k·t + Σ_j δ_j·(t - s_j)_+ + Σ_n [a_n sin(2πn·d/P) + b_n cos(2πn·d/P)]
//! ```
//!
//! `t` is time scaled to `[0, 1]` over the history, `d` is the absolute day
//! number. Values are in scaled units (observations divided by `max |y|`).
//!
//! The fitter relies on two primitive operations:
//! - build a design row for a given time (for least squares)
//! - predict y given coefficients (for residuals and projections)

use std::ops::Range;

use chrono::NaiveDate;

use crate::math::{fill_fourier, hinge, YEAR_DAYS};

/// Column layout of the coefficient vector.
///
/// `[m, k, δ_1..δ_C, a_1, b_1, .., a_N, b_N]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelLayout {
    pub n_changepoints: usize,
    /// Fourier order of the yearly component (0 disables it).
    pub fourier_order: usize,
}

impl ModelLayout {
    pub const OFFSET: usize = 0;
    pub const SLOPE: usize = 1;

    pub fn delta_range(&self) -> Range<usize> {
        2..2 + self.n_changepoints
    }

    pub fn seasonal_range(&self) -> Range<usize> {
        let start = 2 + self.n_changepoints;
        start..start + 2 * self.fourier_order
    }

    pub fn beta_len(&self) -> usize {
        2 + self.n_changepoints + 2 * self.fourier_order
    }
}

/// Fill a design row for the given layout.
///
/// # Panics
/// Panics if `out.len() != layout.beta_len()` or
/// `changepoints.len() != layout.n_changepoints`.
pub fn fill_design_row(layout: ModelLayout, changepoints: &[f64], t: f64, day: f64, out: &mut [f64]) {
    assert_eq!(out.len(), layout.beta_len());
    assert_eq!(changepoints.len(), layout.n_changepoints);

    out[ModelLayout::OFFSET] = 1.0;
    out[ModelLayout::SLOPE] = t;
    for (slot, &s) in out[layout.delta_range()].iter_mut().zip(changepoints) {
        *slot = hinge(t, s);
    }
    fill_fourier(day, YEAR_DAYS, &mut out[layout.seasonal_range()]);
}

/// Maps calendar days onto the model's `[0, 1]` time axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    pub origin_day: f64,
    pub span_days: f64,
}

impl TimeScale {
    pub fn scaled(&self, day: f64) -> f64 {
        (day - self.origin_day) / self.span_days
    }
}

/// Day number relative to 1970-01-01.
pub fn epoch_day(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    (date - epoch).num_days() as f64
}

/// Fitted coefficients in scaled units.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeasonalModel {
    pub offset: f64,
    pub slope: f64,
    /// Changepoint locations on the scaled time axis, ascending.
    pub changepoints: Vec<f64>,
    pub deltas: Vec<f64>,
    /// Interleaved `[a_1, b_1, .., a_N, b_N]`.
    pub seasonal: Vec<f64>,
}

impl TrendSeasonalModel {
    /// Unpack a coefficient vector laid out per `layout`.
    pub fn from_betas(layout: ModelLayout, changepoints: &[f64], betas: &[f64]) -> Self {
        Self {
            offset: betas[ModelLayout::OFFSET],
            slope: betas[ModelLayout::SLOPE],
            changepoints: changepoints.to_vec(),
            deltas: betas[layout.delta_range()].to_vec(),
            seasonal: betas[layout.seasonal_range()].to_vec(),
        }
    }

    /// Piecewise-linear trend at scaled time `t`.
    pub fn trend(&self, t: f64) -> f64 {
        let bends: f64 = self
            .changepoints
            .iter()
            .zip(&self.deltas)
            .map(|(&s, &d)| d * hinge(t, s))
            .sum();
        self.offset + self.slope * t + bends
    }

    /// Trend with extra (simulated) changepoints layered on top.
    pub fn trend_with(&self, t: f64, extra: &[(f64, f64)]) -> f64 {
        let bends: f64 = extra.iter().map(|&(s, d)| d * hinge(t, s)).sum();
        self.trend(t) + bends
    }

    /// Yearly component at absolute day `day`.
    pub fn seasonal(&self, day: f64) -> f64 {
        if self.seasonal.is_empty() {
            return 0.0;
        }
        let mut terms = vec![0.0; self.seasonal.len()];
        fill_fourier(day, YEAR_DAYS, &mut terms);
        terms.iter().zip(&self.seasonal).map(|(x, b)| x * b).sum()
    }

    pub fn predict(&self, t: f64, day: f64) -> f64 {
        self.trend(t) + self.seasonal(day)
    }
}
