//! Per-commodity forecasting and result assembly.
//!
//! - `commodity`: skip rule, fit, projection and intervals for one series
//! - `batch`: parallel fan-out over commodities, failure policy, combined table

pub mod batch;
pub mod commodity;

pub use batch::*;
pub use commodity::*;
