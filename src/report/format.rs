//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the cleaning/fitting code stays clean and testable
//! - output changes are localized

use crate::clean::CleanReport;
use crate::domain::{ForecastPoint, MonthlyAggregate};
use crate::forecast::ForecastRun;
use crate::io::ingest::RawDataset;
use crate::report::DatasetStats;

/// Number of projected columns kept after cleaning.
const PROJECTED_COLUMNS: usize = 7;

/// Format the cleaning stage summary: shapes, drop reasons, dataset stats and
/// an aggregate preview.
pub fn format_cleaning_summary(
    raw: &RawDataset,
    report: &CleanReport,
    aggregates: &[MonthlyAggregate],
    stats: &DatasetStats,
    preview_rows: usize,
) -> String {
    let mut out = String::new();

    out.push_str("=== price-forecast - cleaning ===\n");
    out.push_str(&format!("Initial dataset shape: ({}, {})\n", raw.rows_read, raw.columns));
    out.push_str(&format!(
        "After dropping unnecessary columns: ({}, {PROJECTED_COLUMNS})\n",
        raw.records.len()
    ));

    out.push_str("\nDropped rows:\n");
    let reasons = [
        ("undecodable CSV", raw.malformed_rows),
        ("header marker (#date)", report.dropped_header_marker),
        ("invalid or missing date", report.dropped_invalid_date),
        ("invalid or missing price", report.dropped_invalid_price),
        ("price <= 0", report.dropped_non_positive_price),
    ];
    for (label, count) in reasons {
        out.push_str(&format!("  {label:<26} {count:>8}\n"));
    }
    out.push_str(&format!("  {:<26} {:>8}\n", "labels set to Unknown", report.imputed_labels));

    out.push_str("\nGrouped data preview:\n");
    out.push_str(&format_aggregate_table(&aggregates[..preview_rows.min(aggregates.len())]));

    out.push('\n');
    out.push_str(&format!(
        "Final cleaned dataset shape: ({}, {})\n",
        stats.rows,
        PROJECTED_COLUMNS + 1
    ));
    out.push_str(&format!("Aggregated dataset shape: ({}, 3)\n", aggregates.len()));
    match (stats.date_min, stats.date_max) {
        (Some(lo), Some(hi)) => out.push_str(&format!("Date range: {lo} to {hi}\n")),
        _ => out.push_str("Date range: n/a\n"),
    }
    out.push_str(&format!("Number of unique commodities: {}\n", stats.unique_commodities));
    out.push_str(&format!("Number of provinces (admin1): {}\n", stats.unique_admin1));

    out
}

/// Format the forecasting stage summary: per-commodity outcomes, a preview of
/// the combined table and totals.
pub fn format_forecast_summary(run: &ForecastRun, table: &[ForecastPoint], commodities: usize, preview_rows: usize) -> String {
    let mut out = String::new();

    out.push_str("=== price-forecast - forecasting ===\n");
    out.push_str(&format!(
        "{:<28} {:>6} {:>8} {:>12} {:>4} {:>7}\n",
        "commodity", "months", "last", "rmse", "cps", "yearly"
    ));
    out.push_str(&format!(
        "{:-<28} {:-<6} {:-<8} {:-<12} {:-<4} {:-<7}\n",
        "", "", "", "", "", ""
    ));
    for f in &run.forecasts {
        out.push_str(&format!(
            "{:<28} {:>6} {:>8} {:>12.3} {:>4} {:>7}\n",
            truncate(&f.commodity, 28),
            f.observations,
            f.last_observed.to_string(),
            f.fit.rmse,
            f.fit.changepoints,
            if f.fit.yearly_seasonality { "yes" } else { "no" },
        ));
    }
    for s in &run.skipped {
        out.push_str(&format!(
            "{:<28} {:>6}  (skipped: not enough data)\n",
            truncate(&s.commodity, 28),
            s.observations
        ));
    }
    for f in &run.failed {
        out.push_str(&format!(
            "{:<28} {:>6}  (failed: {})\n",
            truncate(&f.commodity, 28),
            f.observations,
            f.error
        ));
    }

    out.push_str("\nSummary of predictions:\n");
    out.push_str(&format!("{:=<40}\n", ""));
    out.push_str(&format_forecast_table(&table[..preview_rows.min(table.len())]));

    out.push('\n');
    out.push_str(&format!("Total commodities: {commodities}\n"));
    out.push_str(&format!("Commodities predicted: {}\n", run.forecasts.len()));
    out.push_str(&format!("Commodities skipped: {}\n", run.skipped.len()));
    if !run.failed.is_empty() {
        out.push_str(&format!("Commodities failed: {}\n", run.failed.len()));
    }
    out.push_str(&format!("Total prediction records: {}\n", table.len()));

    out
}

fn format_aggregate_table(rows: &[MonthlyAggregate]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<28} {:<10} {:>14}\n", "commodity", "year_month", "average_price"));
    for a in rows {
        out.push_str(&format!(
            "{:<28} {:<10} {:>14.4}\n",
            truncate(&a.commodity, 28),
            a.year_month.to_string(),
            a.average_price
        ));
    }
    out
}

fn format_forecast_table(rows: &[ForecastPoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<28} {:<10} {:>14} {:>14} {:>14}\n",
        "commodity", "date", "predicted", "lower", "upper"
    ));
    for p in rows {
        out.push_str(&format!(
            "{:<28} {:<10} {:>14.4} {:>14.4} {:>14.4}\n",
            truncate(&p.commodity, 28),
            p.date.to_string(),
            p.predicted_price,
            p.lower_bound,
            p.upper_bound
        ));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommodityForecast, FitSummary, YearMonth};
    use crate::forecast::SkippedCommodity;
    use chrono::NaiveDate;

    #[test]
    fn truncate_marks_cut_labels() {
        assert_eq!(truncate("Beans", 10), "Beans");
        assert_eq!(truncate("Sweet potatoes (Irish)", 10), "Sweet pot.");
    }

    #[test]
    fn forecast_summary_lists_outcomes_and_totals() {
        let point = ForecastPoint {
            commodity: "Beans".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 7, 1).unwrap(),
            predicted_price: 650.0,
            lower_bound: 600.0,
            upper_bound: 700.0,
        };
        let run = ForecastRun {
            forecasts: vec![CommodityForecast {
                commodity: "Beans".to_string(),
                observations: 12,
                last_observed: YearMonth::new(2023, 6).unwrap(),
                points: vec![point.clone()],
                fit: FitSummary {
                    sigma: 1.0,
                    rmse: 0.5,
                    changepoints: 8,
                    yearly_seasonality: false,
                },
            }],
            skipped: vec![SkippedCommodity {
                commodity: "Maize".to_string(),
                observations: 3,
            }],
            failed: Vec::new(),
        };

        let text = format_forecast_summary(&run, &[point], 2, 5);
        assert!(text.contains("Beans"));
        assert!(text.contains("skipped: not enough data"));
        assert!(text.contains("Total commodities: 2"));
        assert!(text.contains("Total prediction records: 1"));
        assert!(!text.contains("Commodities failed"));
    }

    #[test]
    fn cleaning_summary_reports_shapes() {
        let raw = RawDataset {
            records: Vec::new(),
            columns: 14,
            rows_read: 10,
            malformed_rows: 1,
        };
        let report = CleanReport {
            rows_in: 9,
            dropped_header_marker: 1,
            ..CleanReport::default()
        };
        let stats = crate::report::compute_stats(&[]);
        let text = format_cleaning_summary(&raw, &report, &[], &stats, 5);
        assert!(text.contains("Initial dataset shape: (10, 14)"));
        assert!(text.contains("Date range: n/a"));
    }
}
