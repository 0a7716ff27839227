//! Row-level cleaning: raw strings in, validated `CleanedRecord`s out.
//!
//! Parsing is explicit: `parse_date` and `parse_price` return `Option`, and the
//! filtering decisions are taken afterwards over those options. No row-level
//! defect is an error; a defective row is either dropped (and counted under a
//! reason) or has its missing labels replaced by `UNKNOWN`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::domain::{CleanedRecord, RawRecord, HEADER_MARKER, UNKNOWN};

/// Cleaning output plus an account of every removed row.
#[derive(Debug, Clone, Default)]
pub struct CleanReport {
    pub records: Vec<CleanedRecord>,
    pub rows_in: usize,
    pub dropped_header_marker: usize,
    pub dropped_invalid_date: usize,
    pub dropped_invalid_price: usize,
    pub dropped_non_positive_price: usize,
    /// Categorical cells replaced by `UNKNOWN`.
    pub imputed_labels: usize,
}

impl CleanReport {
    pub fn rows_dropped(&self) -> usize {
        self.dropped_header_marker
            + self.dropped_invalid_date
            + self.dropped_invalid_price
            + self.dropped_non_positive_price
    }
}

/// Why a row did not survive cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    HeaderMarker,
    InvalidDate,
    InvalidPrice,
    NonPositivePrice,
}

/// Clean raw records in input order.
pub fn clean_records(raw: &[RawRecord]) -> CleanReport {
    let mut report = CleanReport {
        rows_in: raw.len(),
        ..CleanReport::default()
    };

    for row in raw {
        match clean_row(row) {
            Ok((record, imputed)) => {
                report.imputed_labels += imputed;
                report.records.push(record);
            }
            Err(reason) => {
                debug!(line = row.line, ?reason, "dropping row");
                match reason {
                    DropReason::HeaderMarker => report.dropped_header_marker += 1,
                    DropReason::InvalidDate => report.dropped_invalid_date += 1,
                    DropReason::InvalidPrice => report.dropped_invalid_price += 1,
                    DropReason::NonPositivePrice => report.dropped_non_positive_price += 1,
                }
            }
        }
    }

    report
}

/// Clean one row. On success also returns how many labels were imputed.
pub fn clean_row(row: &RawRecord) -> Result<(CleanedRecord, usize), DropReason> {
    // 1) Embedded duplicate header rows.
    if row.date.as_deref().map(str::trim) == Some(HEADER_MARKER) {
        return Err(DropReason::HeaderMarker);
    }

    // 2-3) Typed parses; failures become missing.
    let date = row.date.as_deref().and_then(parse_date);
    let price = row.price.as_deref().and_then(parse_price);

    // 5) Missing essentials.
    let Some(date) = date else {
        return Err(DropReason::InvalidDate);
    };
    let Some(price) = price else {
        return Err(DropReason::InvalidPrice);
    };

    // 6) Non-economic prices.
    if price <= 0.0 {
        return Err(DropReason::NonPositivePrice);
    }

    // 7) Label imputation.
    let mut imputed = 0;
    let mut label = |value: &Option<String>| match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            imputed += 1;
            UNKNOWN.to_string()
        }
    };
    let admin1 = label(&row.admin1);
    let admin2 = label(&row.admin2);
    let market = label(&row.market);
    let commodity = label(&row.commodity);

    let unit = row
        .unit
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok((
        CleanedRecord {
            date,
            admin1,
            admin2,
            market,
            commodity,
            unit,
            price,
        },
        imputed,
    ))
}

/// Parse a calendar date, returning `None` when the value is not a date.
///
/// Accepted: `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY`, `DD/MM/YYYY`,
/// ISO timestamps with or without an offset, and `YYYY-MM` (first of month).
/// Slash dates are read month first; day first only when that fails
/// (`15/01/2020`), so `01/02/2020` is January 2nd.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    const DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y"];
    const DATETIME_FMTS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
    ];

    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    // Month-only values.
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok()
}

/// Parse a price, returning `None` for anything that is not a finite number.
pub fn parse_price(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
