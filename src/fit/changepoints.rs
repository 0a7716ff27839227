//! Changepoint placement.
//!
//! Candidate changepoints sit on observed times inside the first
//! `range` fraction of the history, evenly spaced by index. The very first
//! observation is never a changepoint. Short histories get fewer changepoints
//! so each one has at least one observation between it and the next.

use crate::error::ForecastError;

/// Place up to `requested` changepoints on the scaled times `ts` (ascending).
pub fn changepoint_locations(ts: &[f64], requested: usize, range: f64) -> Result<Vec<f64>, ForecastError> {
    if !(range.is_finite() && range > 0.0 && range <= 1.0) {
        return Err(ForecastError::InvalidConfig(format!(
            "changepoint range must be in (0, 1], got {range}"
        )));
    }

    let hist = (ts.len() as f64 * range).floor() as usize;
    let count = requested.min(hist.saturating_sub(1));
    if count == 0 {
        return Ok(Vec::new());
    }

    // Indexes round(linspace(0, hist-1, count+1)), dropping the leading 0.
    let last = (hist - 1) as f64;
    let step = last / count as f64;
    let out = (1..=count)
        .map(|i| {
            let idx = ((i as f64) * step).round() as usize;
            ts[idx.min(ts.len() - 1)]
        })
        .collect();
    Ok(out)
}
