//! Ranker: order result rows to surface extremes.
//!
//! Rows without a value for the sort field (and non-finite values) always
//! sort after every row that has one, in both directions.

use serde::Serialize;
use std::cmp::Ordering;

use crate::models::{EntityAverage, InflationRecord};

/// Numeric columns rows can be ranked on.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RankField {
    PriceBasket,
    YearOverYear,
    Cumulative,
    AveragePrice,
}

/// A row with rankable numeric columns.
pub trait Rankable {
    /// Value of `field`, or `None` when the row has no such value.
    fn sort_value(&self, field: RankField) -> Option<f64>;
}

impl Rankable for InflationRecord {
    fn sort_value(&self, field: RankField) -> Option<f64> {
        match field {
            RankField::PriceBasket | RankField::AveragePrice => Some(self.price_basket),
            RankField::YearOverYear => self.year_over_year_inflation_pct,
            RankField::Cumulative => self.cumulative_inflation_pct,
        }
    }
}

impl Rankable for EntityAverage {
    fn sort_value(&self, field: RankField) -> Option<f64> {
        match field {
            RankField::AveragePrice | RankField::PriceBasket => Some(self.average_price),
            RankField::YearOverYear | RankField::Cumulative => None,
        }
    }
}

fn compare(a: Option<f64>, b: Option<f64>, ascending: bool) -> Ordering {
    let a = a.filter(|v| v.is_finite());
    let b = b.filter(|v| v.is_finite());
    match (a, b) {
        (Some(a), Some(b)) => {
            let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sorted copy of `rows`. Stable: ties keep their input order.
pub fn rank<T: Rankable + Clone>(rows: &[T], field: RankField, ascending: bool) -> Vec<T> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| compare(a.sort_value(field), b.sort_value(field), ascending));
    sorted
}

/// The `n` highest rows on `field`.
pub fn top_n<T: Rankable + Clone>(rows: &[T], field: RankField, n: usize) -> Vec<T> {
    rank(rows, field, false).into_iter().take(n).collect()
}

/// The `n` lowest rows on `field`.
pub fn bottom_n<T: Rankable + Clone>(rows: &[T], field: RankField, n: usize) -> Vec<T> {
    rank(rows, field, true).into_iter().take(n).collect()
}

/// Highest and lowest rows of one table
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rankings<T> {
    pub field: RankField,
    pub highest: Vec<T>,
    pub lowest: Vec<T>,
}

/// Top and bottom `n` rows. Rows with no value are left out of both lists.
pub fn rankings<T: Rankable + Clone>(rows: &[T], field: RankField, n: usize) -> Rankings<T> {
    let ranked: Vec<T> = rows
        .iter()
        .filter(|r| r.sort_value(field).is_some_and(f64::is_finite))
        .cloned()
        .collect();

    Rankings {
        field,
        highest: top_n(&ranked, field, n),
        lowest: bottom_n(&ranked, field, n),
    }
}
