//! Reporting utilities: dataset statistics and formatted terminal output.

pub mod format;

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::domain::CleanedRecord;

pub use format::*;

/// Descriptive statistics over the cleaned records.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub rows: usize,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
    pub unique_commodities: usize,
    pub unique_admin1: usize,
}

/// Compute the stats printed after cleaning.
pub fn compute_stats(records: &[CleanedRecord]) -> DatasetStats {
    let commodities: HashSet<&str> = records.iter().map(|r| r.commodity.as_str()).collect();
    let provinces: HashSet<&str> = records.iter().map(|r| r.admin1.as_str()).collect();

    DatasetStats {
        rows: records.len(),
        date_min: records.iter().map(|r| r.date).min(),
        date_max: records.iter().map(|r| r.date).max(),
        unique_commodities: commodities.len(),
        unique_admin1: provinces.len(),
    }
}
