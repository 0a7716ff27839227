//! Input/output helpers.
//!
//! - raw CSV ingest + schema check (`ingest`)
//! - CSV exports of every pipeline artifact (`export`)
//! - readers for previously exported tables (`aggregates`, `forecasts`)
//! - JSON run summary (`summary`)

pub mod aggregates;
pub mod export;
pub mod forecasts;
pub mod ingest;
pub mod summary;

pub use aggregates::*;
pub use export::*;
pub use forecasts::*;
pub use ingest::*;
pub use summary::*;
