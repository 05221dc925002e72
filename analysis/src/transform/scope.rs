//! Scope Filter: restrict records to a uniform region set and time window.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CoverageGap, ScopeError, ScopeResult};
use crate::models::{CleanedRecord, DropReason, DroppedRow, PriceMethod, PriceRecord};

/// Four digits before the first date separator.
static YEAR_RE: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^(\d{4})-"));

/// Output of [`restrict_scope`]
#[derive(Debug, Clone)]
pub struct ScopeOutcome {
    pub records: Vec<CleanedRecord>,
    /// Rows whose date had no usable year
    pub dropped: Vec<DroppedRow>,
    /// Rows removed because their region is excluded
    pub excluded: usize,
    /// Rows removed because they predate the window
    pub before_start: usize,
    pub start_year: i32,
    /// Latest year among the retained records
    pub end_year: i32,
}

/// Parse the year from an ISO-like `YYYY-MM-DD...` date.
pub fn derive_year(date: &str) -> Result<i32, DropReason> {
    YEAR_RE
        .as_ref()
        .ok()
        .and_then(|re| re.captures(date.trim()))
        .and_then(|caps| caps[1].parse::<i32>().ok())
        .ok_or_else(|| DropReason::InvalidDate(date.to_string()))
}

/// Derive `year`, drop excluded regions and years before `start_year`.
///
/// Fails if nothing remains, or if a region left in scope lacks retail
/// observations for some year of the window.
pub fn restrict_scope(
    records: &[PriceRecord],
    excluded_regions: &[String],
    start_year: i32,
) -> ScopeResult<ScopeOutcome> {
    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    let mut excluded = 0;
    let mut before_start = 0;

    for record in records {
        let year = match derive_year(&record.date) {
            Ok(year) => year,
            Err(reason) => {
                dropped.push(DroppedRow { line: record.line, reason });
                continue;
            }
        };
        if excluded_regions.contains(&record.region) {
            excluded += 1;
            continue;
        }
        if year < start_year {
            before_start += 1;
            continue;
        }
        kept.push(CleanedRecord::from_price_record(record, year));
    }

    let Some(end_year) = kept.iter().map(|r| r.year).max() else {
        return Err(ScopeError::EmptyWindow { start_year });
    };

    check_coverage(&kept, PriceMethod::Retail, start_year, end_year)?;

    Ok(ScopeOutcome {
        records: kept,
        dropped,
        excluded,
        before_start,
        start_year,
        end_year,
    })
}

/// Every region in `records` must have `method` records in every year from
/// `start_year` to `end_year`. A region with none at all misses every year.
/// Without any `method` record there is nothing to check.
pub fn check_coverage(
    records: &[CleanedRecord],
    method: PriceMethod,
    start_year: i32,
    end_year: i32,
) -> ScopeResult<()> {
    let mut years_by_region: BTreeMap<&str, BTreeSet<i32>> = BTreeMap::new();
    for record in records {
        let years = years_by_region.entry(record.region.as_str()).or_default();
        if record.method == method {
            years.insert(record.year);
        }
    }
    if years_by_region.values().all(BTreeSet::is_empty) {
        return Ok(());
    }

    let gaps: Vec<CoverageGap> = years_by_region
        .iter()
        .filter_map(|(region, years)| {
            let missing: Vec<i32> = (start_year..=end_year).filter(|y| !years.contains(y)).collect();
            (!missing.is_empty()).then(|| CoverageGap {
                region: region.to_string(),
                missing_years: missing,
            })
        })
        .collect();

    if gaps.is_empty() {
        Ok(())
    } else {
        Err(ScopeError::IncompleteCoverage {
            start_year,
            end_year,
            gaps,
        })
    }
}

/// Record counts per region and year for one price method.
pub fn year_coverage(records: &[CleanedRecord], method: PriceMethod) -> BTreeMap<String, BTreeMap<i32, usize>> {
    let mut coverage: BTreeMap<String, BTreeMap<i32, usize>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.method == method) {
        *coverage
            .entry(record.region.clone())
            .or_default()
            .entry(record.year)
            .or_default() += 1;
    }
    coverage
}
