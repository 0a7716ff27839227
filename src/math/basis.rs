//! Basis functions for the additive trend + seasonality model.
//!
//! - hinge: `(t - s)_+`, the slope change contributed by a changepoint at `s`
//! - Fourier: `sin(2πn·d/P), cos(2πn·d/P)` for `n = 1..=order`
//!
//! Seasonal terms are evaluated on absolute days (days since 1970-01-01), not
//! on the scaled time axis, so the phase of a season does not depend on where
//! a series happens to start.

use std::f64::consts::PI;

/// Period of the yearly cycle in days.
pub const YEAR_DAYS: f64 = 365.25;

/// `max(t - s, 0)`.
pub fn hinge(t: f64, s: f64) -> f64 {
    (t - s).max(0.0)
}

/// Fill `out` with `[sin(2π·1·d/P), cos(2π·1·d/P), …, sin(2π·N·d/P), cos(2π·N·d/P)]`.
///
/// `out.len()` determines the order (`N = out.len() / 2`).
pub fn fill_fourier(day: f64, period: f64, out: &mut [f64]) {
    let base = 2.0 * PI * day / period;
    for (n, pair) in out.chunks_exact_mut(2).enumerate() {
        let x = base * (n as f64 + 1.0);
        pair[0] = x.sin();
        pair[1] = x.cos();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hinge_is_zero_before_changepoint() {
        assert_eq!(hinge(0.2, 0.5), 0.0);
        assert_eq!(hinge(0.5, 0.5), 0.0);
        assert!((hinge(0.75, 0.5) - 0.25).abs() < 1e-15);
    }

    #[test]
    fn fourier_terms_repeat_each_period() {
        let mut a = [0.0; 6];
        let mut b = [0.0; 6];
        fill_fourier(100.0, YEAR_DAYS, &mut a);
        fill_fourier(100.0 + YEAR_DAYS, YEAR_DAYS, &mut b);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn fourier_pairs_lie_on_unit_circle() {
        let mut out = [0.0; 20];
        fill_fourier(12345.0, YEAR_DAYS, &mut out);
        for pair in out.chunks_exact(2) {
            assert!((pair[0] * pair[0] + pair[1] * pair[1] - 1.0).abs() < 1e-12);
        }
    }
}
