//! Model calibration.
//!
//! Responsibilities:
//!
//! - place trend changepoints on the history
//! - fit the trend + seasonality model by reweighted penalized least squares
//! - simulate uncertainty intervals around the fitted projection

pub mod changepoints;
pub mod fitter;
pub mod uncertainty;

pub use changepoints::*;
pub use fitter::*;
pub use uncertainty::*;
