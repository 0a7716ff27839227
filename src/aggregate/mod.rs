//! Monthly aggregation of cleaned records.
//!
//! Records are bucketed by `(commodity, YearMonth)` and averaged. Output is
//! sorted by commodity, then month, so repeated runs are byte-identical.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{CleanedRecord, CommoditySeries, MonthlyAggregate, MonthlyPoint, YearMonth};

/// Mean price per `(commodity, year_month)`.
pub fn monthly_aggregates(records: &[CleanedRecord]) -> Vec<MonthlyAggregate> {
    // (sum, count) per bucket.
    let mut buckets: BTreeMap<(String, YearMonth), (f64, usize)> = BTreeMap::new();
    for r in records {
        let entry = buckets
            .entry((r.commodity.clone(), r.year_month()))
            .or_insert((0.0, 0));
        entry.0 += r.price;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|((commodity, year_month), (sum, count))| MonthlyAggregate {
            commodity,
            year_month,
            average_price: sum / count as f64,
            observations: count,
        })
        .collect()
}

/// Split aggregates into one chronological series per commodity.
///
/// Commodities appear in order of first appearance in `aggregates`; a
/// duplicated month is kept as-is so the forecaster can reject it.
pub fn commodity_series(aggregates: &[MonthlyAggregate]) -> Vec<CommoditySeries> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<CommoditySeries> = Vec::new();

    for a in aggregates {
        let idx = *index.entry(a.commodity.as_str()).or_insert_with(|| {
            out.push(CommoditySeries {
                commodity: a.commodity.clone(),
                points: Vec::new(),
            });
            out.len() - 1
        });
        out[idx].points.push(MonthlyPoint {
            month: a.year_month,
            value: a.average_price,
        });
    }

    for series in &mut out {
        // Stable sort keeps duplicates adjacent in input order.
        series.points.sort_by_key(|p| p.month);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(commodity: &str, y: i32, m: u32, d: u32, price: f64) -> CleanedRecord {
        CleanedRecord {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            admin1: "Kigali City".to_string(),
            admin2: "Gasabo".to_string(),
            market: "Kimironko".to_string(),
            commodity: commodity.to_string(),
            unit: Some("KG".to_string()),
            price,
        }
    }

    #[test]
    fn averages_within_month_and_sorts_by_commodity_then_month() {
        let records = vec![
            rec("Maize", 2020, 2, 15, 300.0),
            rec("Beans", 2020, 1, 15, 600.0),
            rec("Beans", 2020, 1, 28, 700.0),
            rec("Maize", 2020, 1, 1, 250.0),
            rec("Beans", 2019, 12, 31, 550.0),
        ];

        let aggs = monthly_aggregates(&records);
        let keys: Vec<(String, String)> = aggs
            .iter()
            .map(|a| (a.commodity.clone(), a.year_month.to_string()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Beans".to_string(), "2019-12".to_string()),
                ("Beans".to_string(), "2020-01".to_string()),
                ("Maize".to_string(), "2020-01".to_string()),
                ("Maize".to_string(), "2020-02".to_string()),
            ]
        );
        assert!((aggs[1].average_price - 650.0).abs() < 1e-12);
        assert_eq!(aggs[1].observations, 2);
    }

    #[test]
    fn group_sizes_sum_to_record_count() {
        let records: Vec<CleanedRecord> = (0..40)
            .map(|i| rec(if i % 3 == 0 { "Rice" } else { "Beans" }, 2021, (i % 12) as u32 + 1, 1, 10.0 + i as f64))
            .collect();

        let aggs = monthly_aggregates(&records);
        let total: usize = aggs.iter().map(|a| a.observations).sum();
        assert_eq!(total, records.len());
    }

    #[test]
    fn aggregation_is_deterministic() {
        let records = vec![
            rec("Sorghum", 2022, 5, 3, 1.5),
            rec("Cassava", 2022, 5, 9, 2.5),
            rec("Sorghum", 2022, 6, 3, 1.75),
        ];
        assert_eq!(monthly_aggregates(&records), monthly_aggregates(&records));
    }

    #[test]
    fn series_keep_first_appearance_order_and_sort_points() {
        let aggs = vec![
            MonthlyAggregate {
                commodity: "Rice".to_string(),
                year_month: YearMonth::new(2020, 3).unwrap(),
                average_price: 3.0,
                observations: 1,
            },
            MonthlyAggregate {
                commodity: "Beans".to_string(),
                year_month: YearMonth::new(2020, 1).unwrap(),
                average_price: 1.0,
                observations: 1,
            },
            MonthlyAggregate {
                commodity: "Rice".to_string(),
                year_month: YearMonth::new(2020, 1).unwrap(),
                average_price: 2.0,
                observations: 1,
            },
        ];

        let series = commodity_series(&aggs);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].commodity, "Rice");
        assert_eq!(series[0].points[0].month.to_string(), "2020-01");
        assert_eq!(series[0].last_month().unwrap().to_string(), "2020-03");
        assert_eq!(series[1].commodity, "Beans");
    }
}
