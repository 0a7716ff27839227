//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and cleaned price records (`RawRecord`, `CleanedRecord`)
//! - monthly buckets and aggregates (`YearMonth`, `MonthlyAggregate`, `CommoditySeries`)
//! - forecast outputs (`ForecastPoint`, `CommodityForecast`)
//! - run configuration (`PipelineConfig`, `ForecastConfig`)

pub mod types;

pub use types::*;
