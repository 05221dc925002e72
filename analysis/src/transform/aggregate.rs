//! Aggregator: yearly price baskets and inflation per entity.
//!
//! # Algorithm
//!
//! ```text
//! records ──group by (entity, year)──▶ mean price (basket), sorted by entity then year
//!         ──same entity, previous row──▶ year-over-year %
//!         ──[post-shock: keep year >= start]
//!         ──first vs last year of window──▶ cumulative % (last-year rows only)
//!         ──round to 2 decimals──▶ InflationRecord
//! ```
//!
//! Every "previous row" comparison checks that both rows belong to the same
//! entity. Row adjacency alone is never trusted.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{CleanedRecord, EntityAverage, GroupField, InflationRecord, PriceBasket};

/// Round half away from zero to 2 decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage change from `previous` to `current`.
///
/// `None` when the base is zero or either value is not finite.
pub fn pct_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return None;
    }
    let change = (current - previous) / previous * 100.0;
    change.is_finite().then_some(change)
}

/// Year bounds of an inflation window.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InflationWindow {
    pub first_year: i32,
    pub last_year: i32,
}

impl InflationWindow {
    /// Number of years covered, both ends included.
    pub fn period_length(&self) -> usize {
        (self.last_year - self.first_year + 1).max(0) as usize
    }
}

/// One aggregated table with the window it was computed over.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InflationTable {
    pub group_field: GroupField,
    pub window: Option<InflationWindow>,
    pub rows: Vec<InflationRecord>,
}

/// Unrounded working row.
#[derive(Debug, Clone)]
struct BasketRow {
    entity: String,
    year: i32,
    basket: f64,
    yoy: Option<f64>,
}

/// Mean price per (entity, year), sorted by entity then year.
fn basket_rows(records: &[CleanedRecord], group_field: GroupField) -> Vec<BasketRow> {
    let mut sums: BTreeMap<(&str, i32), (f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = sums.entry((record.group_key(group_field), record.year)).or_insert((0.0, 0));
        entry.0 += record.domestic_price;
        entry.1 += 1;
    }

    // BTreeMap iteration is the (entity, year) ascending order
    sums.into_iter()
        .map(|((entity, year), (sum, count))| BasketRow {
            entity: entity.to_string(),
            year,
            basket: sum / count as f64,
            yoy: None,
        })
        .collect()
}

/// Change against the previous observed year of the same entity. A skipped
/// year does not break the series.
fn with_year_over_year(mut rows: Vec<BasketRow>) -> Vec<BasketRow> {
    for i in 1..rows.len() {
        let (before, after) = rows.split_at_mut(i);
        let previous = &before[i - 1];
        let current = &mut after[0];
        if previous.entity == current.entity {
            current.yoy = pct_change(previous.basket, current.basket);
        }
    }
    rows
}

/// Cumulative change per row: set only on the window's last year, against
/// the same entity's row at the window's first year.
fn cumulative_inflation(rows: &[BasketRow], window: InflationWindow) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(rows.len());
    let mut series_start = 0;

    for (i, row) in rows.iter().enumerate() {
        if i == 0 || rows[i - 1].entity != row.entity {
            series_start = i;
        }
        if row.year != window.last_year || i == series_start {
            out.push(None);
            continue;
        }
        let first = &rows[series_start];
        let value = (first.entity == row.entity && first.year == window.first_year)
            .then(|| pct_change(first.basket, row.basket))
            .flatten();
        out.push(value);
    }

    out
}

/// Yearly baskets for every entity of `group_field`, rounded to 2 decimals.
pub fn price_baskets(records: &[CleanedRecord], group_field: GroupField) -> Vec<PriceBasket> {
    basket_rows(records, group_field)
        .into_iter()
        .map(|row| PriceBasket {
            entity: row.entity,
            year: row.year,
            price_basket: round2(row.basket),
        })
        .collect()
}

/// Baskets with year-over-year and cumulative inflation.
///
/// With `post_shock_start`, rows before that year are removed and the
/// cumulative figure is measured from `post_shock_start`. Year-over-year
/// values are taken from the full series either way.
pub fn aggregate(
    records: &[CleanedRecord],
    group_field: GroupField,
    post_shock_start: Option<i32>,
) -> Vec<InflationRecord> {
    inflation_table(records, group_field, post_shock_start).rows
}

/// [`aggregate`] plus the window it used.
pub fn inflation_table(
    records: &[CleanedRecord],
    group_field: GroupField,
    post_shock_start: Option<i32>,
) -> InflationTable {
    let rows = with_year_over_year(basket_rows(records, group_field));

    let rows: Vec<BasketRow> = match post_shock_start {
        Some(start) => rows.into_iter().filter(|r| r.year >= start).collect(),
        None => rows,
    };

    let window = rows.iter().map(|r| r.year).max().map(|last_year| InflationWindow {
        first_year: post_shock_start
            .or_else(|| rows.iter().map(|r| r.year).min())
            .unwrap_or(last_year),
        last_year,
    });

    let cumulative = match window {
        Some(window) => cumulative_inflation(&rows, window),
        None => Vec::new(),
    };

    let rows = rows
        .into_iter()
        .zip(cumulative)
        .map(|(row, cumulative)| InflationRecord {
            entity: row.entity,
            year: row.year,
            price_basket: round2(row.basket),
            year_over_year_inflation_pct: row.yoy.map(round2),
            cumulative_inflation_pct: cumulative.map(round2),
        })
        .collect();

    InflationTable {
        group_field,
        window,
        rows,
    }
}

/// Mean price per entity over every year, rounded to 2 decimals.
pub fn average_by_entity(records: &[CleanedRecord], group_field: GroupField) -> Vec<EntityAverage> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = sums.entry(record.group_key(group_field)).or_insert((0.0, 0));
        entry.0 += record.domestic_price;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(entity, (sum, count))| EntityAverage {
            entity: entity.to_string(),
            average_price: round2(sum / count as f64),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceMethod;

    fn record(region: &str, category: &str, year: i32, price: f64) -> CleanedRecord {
        CleanedRecord {
            line: 0,
            year,
            region: region.to_string(),
            sub_region: region.to_string(),
            market: region.to_string(),
            category: category.to_string(),
            commodity: "Rice".into(),
            unit: "KG".into(),
            method: PriceMethod::Retail,
            domestic_price: price,
        }
    }

    fn series(region: &str, first_year: i32, prices: &[f64]) -> Vec<CleanedRecord> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| record(region, "cereals and tubers", first_year + i as i32, *p))
            .collect()
    }

    fn row<'a>(rows: &'a [InflationRecord], entity: &str, year: i32) -> &'a InflationRecord {
        rows.iter()
            .find(|r| r.entity == entity && r.year == year)
            .unwrap_or_else(|| panic!("no row for {entity}/{year}"))
    }

    #[test]
    fn test_basket_is_mean_of_prices() {
        let records = vec![
            record("Assam", "oil and fats", 2014, 10.0),
            record("Assam", "oil and fats", 2014, 20.0),
            record("Assam", "oil and fats", 2014, 30.0),
        ];
        let baskets = price_baskets(&records, GroupField::Region);
        assert_eq!(baskets.len(), 1);
        assert_eq!(baskets[0].price_basket, 20.0);
    }

    #[test]
    fn test_inflation_uses_unrounded_baskets() {
        // 10/3 -> 11/3 is exactly +10%; rounding the baskets first would give 10.21%
        let mut records = vec![
            record("Goa", "c", 2014, 10.0),
            record("Goa", "c", 2014, 0.0),
            record("Goa", "c", 2014, 0.0),
        ];
        records.extend([
            record("Goa", "c", 2015, 11.0),
            record("Goa", "c", 2015, 0.0),
            record("Goa", "c", 2015, 0.0),
        ]);
        let rows = aggregate(&records, GroupField::Region, None);

        assert_eq!(row(&rows, "Goa", 2014).price_basket, 3.33);
        assert_eq!(row(&rows, "Goa", 2015).price_basket, 3.67);
        assert_eq!(row(&rows, "Goa", 2015).year_over_year_inflation_pct, Some(10.0));
    }

    #[test]
    fn test_first_year_of_second_entity_has_no_yoy() {
        let mut records = series("R1", 2014, &[100.0, 110.0, 121.0]);
        records.extend(series("R2", 2014, &[50.0, 55.0]));
        let rows = aggregate(&records, GroupField::Region, None);

        assert_eq!(row(&rows, "R1", 2014).year_over_year_inflation_pct, None);
        assert_eq!(row(&rows, "R1", 2015).year_over_year_inflation_pct, Some(10.0));
        assert_eq!(row(&rows, "R1", 2016).year_over_year_inflation_pct, Some(10.0));
        assert_eq!(row(&rows, "R2", 2014).year_over_year_inflation_pct, None);
        assert_eq!(row(&rows, "R2", 2015).year_over_year_inflation_pct, Some(10.0));
    }

    #[test]
    fn test_rows_sorted_by_entity_then_year_regardless_of_input_order() {
        let mut records = series("Tripura", 2014, &[10.0, 12.0]);
        records.extend(series("Assam", 2014, &[20.0, 22.0]));
        records.reverse();

        let rows = aggregate(&records, GroupField::Region, None);
        let keys: Vec<(&str, i32)> = rows.iter().map(|r| (r.entity.as_str(), r.year)).collect();
        assert_eq!(keys, vec![("Assam", 2014), ("Assam", 2015), ("Tripura", 2014), ("Tripura", 2015)]);
        assert_eq!(row(&rows, "Tripura", 2014).year_over_year_inflation_pct, None);
    }

    #[test]
    fn test_no_cross_entity_yoy_anywhere() {
        let mut records = series("A", 2014, &[5.0, 6.0, 7.0]);
        records.extend(series("B", 2015, &[50.0, 40.0]));
        records.extend(series("C", 2014, &[1.0]));
        let rows = aggregate(&records, GroupField::Region, None);

        for pair in rows.windows(2) {
            if pair[0].entity != pair[1].entity {
                assert_eq!(pair[1].year_over_year_inflation_pct, None, "{} leaked into {}", pair[0].entity, pair[1].entity);
            }
        }
    }

    #[test]
    fn test_yoy_spans_a_skipped_year() {
        let records = vec![
            record("Kerala", "meat, fish and eggs", 2014, 100.0),
            record("Kerala", "meat, fish and eggs", 2016, 120.0),
        ];
        let rows = aggregate(&records, GroupField::Category, None);
        assert_eq!(row(&rows, "meat, fish and eggs", 2014).year_over_year_inflation_pct, None);
        assert_eq!(row(&rows, "meat, fish and eggs", 2016).year_over_year_inflation_pct, Some(20.0));
    }

    #[test]
    fn test_cumulative_nine_year_window() {
        let prices = [100.0, 105.0, 110.0, 120.0, 130.0, 140.0, 160.0, 180.0, 200.0];
        let rows = aggregate(&series("Assam", 2014, &prices), GroupField::Region, None);

        assert_eq!(rows.len(), 9);
        assert_eq!(row(&rows, "Assam", 2022).cumulative_inflation_pct, Some(100.0));
        for year in 2014..2022 {
            assert_eq!(row(&rows, "Assam", year).cumulative_inflation_pct, None, "year {year}");
        }
    }

    #[test]
    fn test_cumulative_requires_both_endpoints() {
        let mut records = series("R1", 2014, &[100.0, 110.0, 121.0]);
        records.extend(series("R2", 2014, &[50.0, 55.0]));
        records.extend(series("R3", 2015, &[10.0, 20.0]));
        let rows = aggregate(&records, GroupField::Region, None);

        assert_eq!(row(&rows, "R1", 2016).cumulative_inflation_pct, Some(21.0));
        // R2 has no 2016 row, R3 has no 2014 row
        assert!(rows.iter().filter(|r| r.entity == "R2").all(|r| r.cumulative_inflation_pct.is_none()));
        assert_eq!(row(&rows, "R3", 2016).cumulative_inflation_pct, None);
    }

    #[test]
    fn test_post_shock_window() {
        let prices = [100.0, 105.0, 110.0, 120.0, 130.0, 140.0, 160.0, 180.0, 200.0];
        let full = aggregate(&series("Assam", 2014, &prices), GroupField::Region, None);
        let post = inflation_table(&series("Assam", 2014, &prices), GroupField::Region, Some(2020));

        assert_eq!(post.window, Some(InflationWindow { first_year: 2020, last_year: 2022 }));
        assert_eq!(post.window.map(|w| w.period_length()), Some(3));
        assert_eq!(post.rows.iter().map(|r| r.year).collect::<Vec<_>>(), vec![2020, 2021, 2022]);

        // 160 -> 200
        assert_eq!(row(&post.rows, "Assam", 2022).cumulative_inflation_pct, Some(25.0));
        assert_eq!(row(&post.rows, "Assam", 2020).cumulative_inflation_pct, None);
        assert_eq!(row(&post.rows, "Assam", 2021).cumulative_inflation_pct, None);

        // YoY is window independent
        assert_eq!(
            row(&post.rows, "Assam", 2020).year_over_year_inflation_pct,
            row(&full, "Assam", 2020).year_over_year_inflation_pct
        );
        assert!(row(&post.rows, "Assam", 2020).year_over_year_inflation_pct.is_some());
    }

    #[test]
    fn test_zero_base_yields_null() {
        let rows = aggregate(&series("Bihar", 2014, &[0.0, 5.0]), GroupField::Region, None);
        assert_eq!(row(&rows, "Bihar", 2015).year_over_year_inflation_pct, None);
        assert_eq!(row(&rows, "Bihar", 2015).cumulative_inflation_pct, None);
    }

    #[test]
    fn test_group_by_category_ignores_region() {
        let records = vec![
            record("Assam", "pulses and nuts", 2014, 60.0),
            record("Goa", "pulses and nuts", 2014, 80.0),
            record("Goa", "oil and fats", 2014, 100.0),
        ];
        let baskets = price_baskets(&records, GroupField::Category);
        assert_eq!(baskets.len(), 2);
        assert_eq!(baskets[0].entity, "oil and fats");
        assert_eq!(baskets[1].price_basket, 70.0);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let mut records = series("R1", 2014, &[100.0, 110.0, 121.0]);
        records.extend(series("R2", 2014, &[50.0, 55.0, 61.0]));
        assert_eq!(
            aggregate(&records, GroupField::Region, Some(2015)),
            aggregate(&records, GroupField::Region, Some(2015))
        );
    }

    #[test]
    fn test_empty_input() {
        let table = inflation_table(&[], GroupField::Region, Some(2020));
        assert!(table.rows.is_empty());
        assert!(table.window.is_none());
    }

    #[test]
    fn test_average_by_entity() {
        let mut records = series("Assam", 2014, &[10.0, 20.0]);
        records.extend(series("Goa", 2014, &[1.0, 1.0, 2.0]));
        let averages = average_by_entity(&records, GroupField::Region);

        assert_eq!(averages.len(), 2);
        assert_eq!(averages[0], EntityAverage { entity: "Assam".into(), average_price: 15.0 });
        assert_eq!(averages[1].average_price, 1.33);
    }

    #[test]
    fn test_pct_change() {
        assert_eq!(pct_change(100.0, 150.0), Some(50.0));
        assert_eq!(pct_change(0.0, 1.0), None);
        assert_eq!(pct_change(f64::NAN, 1.0), None);
        assert_eq!(round2(-13.6349), -13.63);
    }
}
