//! Loader/Cleaner: raw rows to typed [`PriceRecord`]s.
//!
//! Rows missing a region or sub-region, or carrying an unusable price, are
//! dropped and reported. Any other empty cell in a retained column aborts
//! the run with a [`CleanError`].

use crate::error::{CleanError, CleanResult};
use crate::models::{DropReason, DroppedRow, PriceMethod, PriceObservation, PriceRecord, RawRow};

/// Output of [`load_and_clean`]
#[derive(Debug, Clone, Default)]
pub struct CleanOutcome {
    pub records: Vec<PriceRecord>,
    pub dropped: Vec<DroppedRow>,
}

/// Type, rename and filter raw rows.
///
/// `priceflag`, `currency`, `usdprice`, `latitude` and `longitude` are not
/// carried over.
pub fn load_and_clean(rows: &[RawRow]) -> CleanResult<CleanOutcome> {
    let mut outcome = CleanOutcome::default();

    for row in rows {
        match clean_row(row)? {
            Ok(record) => outcome.records.push(record),
            Err(reason) => outcome.dropped.push(DroppedRow { line: row.line, reason }),
        }
    }

    Ok(outcome)
}

/// Outer error aborts the run, inner error drops the row.
fn clean_row(row: &RawRow) -> CleanResult<Result<PriceRecord, DropReason>> {
    let obs = &row.observation;

    let Some(region) = present(&obs.admin1) else {
        return Ok(Err(DropReason::MissingRegion));
    };
    let Some(sub_region) = present(&obs.admin2) else {
        return Ok(Err(DropReason::MissingSubRegion));
    };
    let domestic_price = match parse_price(obs.price.as_deref()) {
        Ok(price) => price,
        Err(reason) => return Ok(Err(reason)),
    };

    let pricetype = required(obs, row.line, "pricetype", |o| &o.pricetype)?;
    let method = PriceMethod::from_label(pricetype).ok_or_else(|| CleanError::UnexpectedValue {
        line: row.line,
        column: "pricetype".to_string(),
        value: pricetype.to_string(),
    })?;

    Ok(Ok(PriceRecord {
        line: row.line,
        date: required(obs, row.line, "date", |o| &o.date)?.to_string(),
        region: region.to_string(),
        sub_region: sub_region.to_string(),
        market: required(obs, row.line, "market", |o| &o.market)?.to_string(),
        category: required(obs, row.line, "category", |o| &o.category)?.to_string(),
        commodity: required(obs, row.line, "commodity", |o| &o.commodity)?.to_string(),
        unit: required(obs, row.line, "unit", |o| &o.unit)?.to_string(),
        method,
        domestic_price,
    }))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(
    obs: &'a PriceObservation,
    line: u64,
    column: &str,
    field: impl Fn(&'a PriceObservation) -> &'a Option<String>,
) -> CleanResult<&'a str> {
    present(field(obs)).ok_or_else(|| CleanError::UnexpectedNull {
        line,
        column: column.to_string(),
    })
}

/// A price must be a finite, non-negative decimal.
pub fn parse_price(raw: Option<&str>) -> Result<f64, DropReason> {
    let raw = raw.map(str::trim).unwrap_or("");
    match raw.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(DropReason::InvalidPrice(raw.to_string())),
    }
}

// =============================================================================
// Unit semantics
// =============================================================================

/// A row whose unit contradicts its price type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitViolation {
    pub line: u64,
    pub unit: String,
    pub method: PriceMethod,
}

impl std::fmt::Display for UnitViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: unit '{}' with {} price", self.line, self.unit, self.method)
    }
}

/// The price type a unit is known to go with, if any.
///
/// `100 KG` appears only on wholesale rows, `KG` and `L` only on retail.
pub fn expected_method(unit: &str) -> Option<PriceMethod> {
    match unit.trim().to_uppercase().as_str() {
        "100 KG" => Some(PriceMethod::Wholesale),
        "KG" | "L" => Some(PriceMethod::Retail),
        _ => None,
    }
}

/// Rows that break the unit / price type pairing.
pub fn unit_violations(records: &[PriceRecord]) -> Vec<UnitViolation> {
    records
        .iter()
        .filter(|r| expected_method(&r.unit).is_some_and(|m| m != r.method))
        .map(|r| UnitViolation {
            line: r.line,
            unit: r.unit.clone(),
            method: r.method,
        })
        .collect()
}

/// Check unit semantics; with `strict`, any violation is an error.
pub fn check_unit_semantics(records: &[PriceRecord], strict: bool) -> CleanResult<Vec<UnitViolation>> {
    let violations = unit_violations(records);
    if strict {
        if let Some(first) = violations.first() {
            return Err(CleanError::UnitSemantics {
                count: violations.len(),
                first_line: first.line,
                detail: first.to_string(),
            });
        }
    }
    Ok(violations)
}
