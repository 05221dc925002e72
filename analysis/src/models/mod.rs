//! Domain models for the food inflation pipeline.
//!
//! Each stage consumes one of these tables and produces the next; nothing
//! is mutated after it is built.
//!
//! - [`PriceObservation`] - one raw input row, every field still a string
//! - [`PriceRecord`] - a cleaned row: typed, renamed, dropped fields removed
//! - [`CleanedRecord`] - a row in scope, with `year` instead of `date`
//! - [`PriceBasket`] - mean price per (entity, year)
//! - [`InflationRecord`] - a basket with YoY and cumulative inflation
//! - [`EntityAverage`] - mean price per entity over the whole window

use serde::{Deserialize, Serialize};

// =============================================================================
// Raw Input
// =============================================================================

/// One raw row from the input file.
///
/// Field names match the input header. Empty cells deserialize to `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceObservation {
    pub date: Option<String>,
    pub admin1: Option<String>,
    pub admin2: Option<String>,
    pub market: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub category: Option<String>,
    pub commodity: Option<String>,
    pub unit: Option<String>,
    pub priceflag: Option<String>,
    pub pricetype: Option<String>,
    pub currency: Option<String>,
    pub price: Option<String>,
    pub usdprice: Option<String>,
}

/// A raw row together with its line number in the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub line: u64,
    pub observation: PriceObservation,
}

// =============================================================================
// Price Collection Method
// =============================================================================

/// How a price was collected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriceMethod {
    Retail,
    Wholesale,
}

impl PriceMethod {
    /// Parse the `pricetype` column. Matching ignores case and surrounding
    /// whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "retail" => Some(Self::Retail),
            "wholesale" => Some(Self::Wholesale),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Retail => "Retail",
            Self::Wholesale => "Wholesale",
        }
    }
}

impl std::fmt::Display for PriceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Cleaned Rows
// =============================================================================

/// A cleaned observation.
///
/// `priceflag`, `currency`, `usdprice`, `latitude` and `longitude` are gone;
/// `admin1`/`admin2`/`price` are renamed to `region`/`sub_region`/
/// `domestic_price`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    /// Source line, kept so later stages can report where a row came from.
    pub line: u64,
    pub date: String,
    pub region: String,
    pub sub_region: String,
    pub market: String,
    pub category: String,
    pub commodity: String,
    pub unit: String,
    pub method: PriceMethod,
    pub domestic_price: f64,
}

/// A cleaned observation inside the analysis window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CleanedRecord {
    pub line: u64,
    pub year: i32,
    pub region: String,
    pub sub_region: String,
    pub market: String,
    pub category: String,
    pub commodity: String,
    pub unit: String,
    pub method: PriceMethod,
    pub domestic_price: f64,
}

impl CleanedRecord {
    /// Build from a cleaned row and its derived year; the date is dropped.
    pub fn from_price_record(record: &PriceRecord, year: i32) -> Self {
        Self {
            line: record.line,
            year,
            region: record.region.clone(),
            sub_region: record.sub_region.clone(),
            market: record.market.clone(),
            category: record.category.clone(),
            commodity: record.commodity.clone(),
            unit: record.unit.clone(),
            method: record.method,
            domestic_price: record.domestic_price,
        }
    }

    /// The value of the given grouping field.
    pub fn group_key(&self, field: GroupField) -> &str {
        match field {
            GroupField::Region => &self.region,
            GroupField::Category => &self.category,
            GroupField::Commodity => &self.commodity,
        }
    }
}

// =============================================================================
// Dropped Rows
// =============================================================================

/// Why a row was left out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum DropReason {
    MissingRegion,
    MissingSubRegion,
    InvalidPrice(String),
    InvalidDate(String),
}

impl DropReason {
    /// Short label used to group drops in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingRegion => "missing region",
            Self::MissingSubRegion => "missing sub-region",
            Self::InvalidPrice(_) => "invalid price",
            Self::InvalidDate(_) => "invalid date",
        }
    }
}

/// A row that was dropped, not failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DroppedRow {
    pub line: u64,
    pub reason: DropReason,
}

// =============================================================================
// Aggregation
// =============================================================================

/// The field baskets are grouped by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GroupField {
    Region,
    Category,
    Commodity,
}

impl GroupField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Category => "category",
            Self::Commodity => "commodity",
        }
    }
}

/// Mean price of one entity in one year.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceBasket {
    pub entity: String,
    pub year: i32,
    pub price_basket: f64,
}

/// A basket with its inflation figures, rounded to 2 decimals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InflationRecord {
    pub entity: String,
    pub year: i32,
    pub price_basket: f64,
    pub year_over_year_inflation_pct: Option<f64>,
    pub cumulative_inflation_pct: Option<f64>,
}

/// Mean price of one entity across all years.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityAverage {
    pub entity: String,
    pub average_price: f64,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_method_from_label() {
        assert_eq!(PriceMethod::from_label("Retail"), Some(PriceMethod::Retail));
        assert_eq!(PriceMethod::from_label(" wholesale "), Some(PriceMethod::Wholesale));
        assert_eq!(PriceMethod::from_label("Farmgate"), None);
    }

    #[test]
    fn test_group_key() {
        let record = CleanedRecord {
            line: 2,
            year: 2015,
            region: "Assam".into(),
            sub_region: "Guwahati".into(),
            market: "Guwahati".into(),
            category: "cereals and tubers".into(),
            commodity: "Rice".into(),
            unit: "KG".into(),
            method: PriceMethod::Retail,
            domestic_price: 31.5,
        };
        assert_eq!(record.group_key(GroupField::Region), "Assam");
        assert_eq!(record.group_key(GroupField::Category), "cereals and tubers");
        assert_eq!(record.group_key(GroupField::Commodity), "Rice");
    }

    #[test]
    fn test_dropped_row_serialization() {
        let row = DroppedRow {
            line: 12,
            reason: DropReason::InvalidPrice("n/a".into()),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["line"], 12);
        assert_eq!(json["reason"]["kind"], "invalidPrice");
        assert_eq!(json["reason"]["detail"], "n/a");
    }

    #[test]
    fn test_inflation_record_nulls_serialize() {
        let record = InflationRecord {
            entity: "Goa".into(),
            year: 2014,
            price_basket: 45.1,
            year_over_year_inflation_pct: None,
            cumulative_inflation_pct: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["yearOverYearInflationPct"].is_null());
        assert_eq!(json["priceBasket"], 45.1);
    }
}
