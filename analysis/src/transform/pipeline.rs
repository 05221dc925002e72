//! High-level pipeline API: price file to inflation tables.
//!
//! Chains every stage and reports each one through [`crate::logs`]:
//! parsing, cleaning, scope filtering, splitting, aggregation and output
//! validation. Ranking is left to the caller (see [`crate::report`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use food_inflation::{run_analysis, AnalysisConfig};
//! use std::path::Path;
//!
//! let result = run_analysis(Path::new("wfp_food_prices_ind.csv"), &AnalysisConfig::default())?;
//! println!("{} regions", result.retail.average_price_by_region.len());
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::aggregate::{average_by_entity, inflation_table, InflationTable};
use super::clean::{check_unit_semantics, load_and_clean, CleanOutcome};
use super::scope::{restrict_scope, year_coverage, ScopeOutcome};
use super::split::{split_by_method, wholesale_coverage, MethodSplit, WholesaleCoverage};
use crate::config::AnalysisConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_info_indent, log_stage, log_success, log_warning, Stage};
use crate::models::{CleanedRecord, DroppedRow, EntityAverage, GroupField, PriceMethod};
use crate::parser::{parse_bytes_auto, parse_file_auto, RawTable};
use crate::validation::{validate_rows, OutputSchema};

/// Line numbers shown per drop reason.
const DROP_SAMPLE_SIZE: usize = 5;

/// Input file information and row accounting
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSummary {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub marker_row_skipped: bool,
    /// Data rows read, marker row excluded
    pub rows_read: usize,
    /// Dropped rows per reason label
    pub dropped_by_reason: BTreeMap<String, usize>,
    pub excluded_rows: usize,
    pub before_start_rows: usize,
    pub unit_violations: usize,
    pub records_in_scope: usize,
    pub retail_records: usize,
    pub wholesale_records: usize,
    pub start_year: i32,
    pub end_year: i32,
}

/// Everything up to and including the split
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub summary: InputSummary,
    pub dropped: Vec<DroppedRow>,
    pub split: MethodSplit,
    pub wholesale_coverage: WholesaleCoverage,
}

/// The tables computed for one price method
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodAnalysis {
    pub method: PriceMethod,
    pub region_inflation: InflationTable,
    pub category_inflation: InflationTable,
    pub post_shock_region_inflation: InflationTable,
    pub post_shock_category_inflation: InflationTable,
    pub average_price_by_region: Vec<EntityAverage>,
    pub average_price_by_category: Vec<EntityAverage>,
}

impl MethodAnalysis {
    /// Inflation tables with a label, in report order.
    pub fn inflation_tables(&self) -> [(&'static str, &InflationTable); 4] {
        [
            ("inflation by region", &self.region_inflation),
            ("inflation by category", &self.category_inflation),
            ("post-shock inflation by region", &self.post_shock_region_inflation),
            ("post-shock inflation by category", &self.post_shock_category_inflation),
        ]
    }

    /// Average tables with a label, in report order.
    pub fn average_tables(&self) -> [(&'static str, &[EntityAverage]); 2] {
        [
            ("average price by region", self.average_price_by_region.as_slice()),
            ("average price by category", self.average_price_by_category.as_slice()),
        ]
    }
}

/// Result of a complete analysis run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: InputSummary,
    pub dropped: Vec<DroppedRow>,
    pub wholesale_coverage: WholesaleCoverage,
    pub retail: MethodAnalysis,
    /// Present only when the wholesale split covers enough regions
    pub wholesale: Option<MethodAnalysis>,
}

/// Analyze a price file.
///
/// 1. Parse with encoding and delimiter detection
/// 2. Clean, check unit semantics
/// 3. Restrict to the configured regions and window, check coverage
/// 4. Split by price method
/// 5. Aggregate and validate the retail tables (and wholesale, when usable)
pub fn run_analysis(path: &Path, config: &AnalysisConfig) -> PipelineResult<AnalysisResult> {
    config.validate()?;
    log_stage(Stage::Read, format!("Reading {}...", path.display()));
    let table = parse_file_auto(path)?;
    run_table(table, config)
}

/// Same as [`run_analysis`] for in-memory content.
pub fn run_bytes(bytes: &[u8], config: &AnalysisConfig) -> PipelineResult<AnalysisResult> {
    config.validate()?;
    let table = parse_bytes_auto(bytes)?;
    run_table(table, config)
}

/// Analyze an already parsed table.
pub fn run_table(table: RawTable, config: &AnalysisConfig) -> PipelineResult<AnalysisResult> {
    let prepared = prepare(table, config)?;

    log_stage(Stage::Aggregate, "Aggregating retail prices...");
    let retail = analyze_method(PriceMethod::Retail, &prepared.split.retail, config)?;

    let wholesale = if prepared.wholesale_coverage.usable {
        log_stage(Stage::Aggregate, "Aggregating wholesale prices...");
        Some(analyze_method(PriceMethod::Wholesale, &prepared.split.wholesale, config)?)
    } else {
        None
    };

    log_success("Analysis complete");

    Ok(AnalysisResult {
        summary: prepared.summary,
        dropped: prepared.dropped,
        wholesale_coverage: prepared.wholesale_coverage,
        retail,
        wholesale,
    })
}

/// Parse a file and run every stage up to the split.
pub fn prepare_file(path: &Path, config: &AnalysisConfig) -> PipelineResult<PreparedData> {
    config.validate()?;
    log_stage(Stage::Read, format!("Reading {}...", path.display()));
    prepare(parse_file_auto(path)?, config)
}

/// Clean only, for inspection.
pub fn clean_file(path: &Path, config: &AnalysisConfig) -> PipelineResult<CleanOutcome> {
    config.validate()?;
    log_stage(Stage::Read, format!("Reading {}...", path.display()));
    let table = parse_file_auto(path)?;
    log_table(&table);
    clean_stage(&table)
}

/// One aggregator table for one price method.
pub fn inflation_for(
    prepared: &PreparedData,
    method: PriceMethod,
    group_field: GroupField,
    post_shock_start: Option<i32>,
) -> PipelineResult<InflationTable> {
    let table = inflation_table(prepared.split.get(method), group_field, post_shock_start);
    validate_rows(&format!("{} inflation by {}", method, group_field.name()), &table.rows, OutputSchema::InflationRecord)?;
    Ok(table)
}

/// Record counts per region and year, per price method.
pub fn coverage_counts(prepared: &PreparedData) -> BTreeMap<PriceMethod, BTreeMap<String, BTreeMap<i32, usize>>> {
    let mut counts = BTreeMap::new();
    for method in [PriceMethod::Retail, PriceMethod::Wholesale] {
        counts.insert(method, year_coverage(prepared.split.get(method), method));
    }
    counts
}

fn prepare(table: RawTable, config: &AnalysisConfig) -> PipelineResult<PreparedData> {
    log_table(&table);

    let cleaned = clean_stage(&table)?;
    let unit_violations = check_units(&cleaned, config)?;
    let scoped = scope_stage(&cleaned, config)?;

    log_stage(Stage::Split, "Splitting by price type...");
    let split = split_by_method(&scoped.records);
    log_success(format!("{} retail, {} wholesale", split.retail.len(), split.wholesale.len()));
    if split.retail.is_empty() {
        return Err(PipelineError::NoRetailRecords);
    }

    let coverage = wholesale_coverage(&split, config.wholesale_min_region_share);
    if coverage.usable {
        log_success(format!(
            "Wholesale covers {}/{} regions ({:.0}%), analyzing it too",
            coverage.wholesale_regions.len(),
            coverage.total_regions,
            coverage.share * 100.0
        ));
    } else {
        log_warning(format!(
            "Wholesale covers {}/{} regions ({:.0}% < {:.0}%), skipping it",
            coverage.wholesale_regions.len(),
            coverage.total_regions,
            coverage.share * 100.0,
            coverage.min_share * 100.0
        ));
    }

    let mut dropped = cleaned.dropped;
    dropped.extend(scoped.dropped.iter().cloned());
    dropped.sort_by_key(|d| d.line);

    let mut dropped_by_reason: BTreeMap<String, usize> = BTreeMap::new();
    for row in &dropped {
        *dropped_by_reason.entry(row.reason.kind().to_string()).or_default() += 1;
    }

    let summary = InputSummary {
        encoding: table.encoding,
        delimiter: table.delimiter,
        headers: table.headers,
        marker_row_skipped: table.marker_row_skipped,
        rows_read: table.rows.len(),
        dropped_by_reason,
        excluded_rows: scoped.excluded,
        before_start_rows: scoped.before_start,
        unit_violations,
        records_in_scope: scoped.records.len(),
        retail_records: split.retail.len(),
        wholesale_records: split.wholesale.len(),
        start_year: scoped.start_year,
        end_year: scoped.end_year,
    };

    Ok(PreparedData {
        summary,
        dropped,
        split,
        wholesale_coverage: coverage,
    })
}

fn log_table(table: &RawTable) {
    log_success(format!("Detected encoding: {}", table.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(table.delimiter)));
    if table.marker_row_skipped {
        log_info_indent("Skipped marker row after header", 1);
    }
    log_success(format!("Read {} rows", table.rows.len()));
}

fn clean_stage(table: &RawTable) -> PipelineResult<CleanOutcome> {
    if table.rows.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    log_stage(Stage::Clean, "Cleaning rows...");
    let outcome = load_and_clean(&table.rows)?;
    log_success(format!("{} of {} rows kept", outcome.records.len(), table.rows.len()));
    log_dropped(&outcome.dropped);

    if outcome.records.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    Ok(outcome)
}

fn check_units(cleaned: &CleanOutcome, config: &AnalysisConfig) -> PipelineResult<usize> {
    let violations = check_unit_semantics(&cleaned.records, config.strict_units)?;
    if let Some(first) = violations.first() {
        log_warning(format!("{} row(s) with a unit unusual for their price type, first at {}", violations.len(), first));
    }
    Ok(violations.len())
}

fn scope_stage(cleaned: &CleanOutcome, config: &AnalysisConfig) -> PipelineResult<ScopeOutcome> {
    log_stage(Stage::Scope, format!(
        "Restricting to {}+ and excluding {}...",
        config.start_year,
        if config.excluded_regions.is_empty() {
            "no regions".to_string()
        } else {
            config.excluded_regions.join(", ")
        }
    ));

    let outcome = restrict_scope(&cleaned.records, &config.excluded_regions, config.start_year)?;
    log_dropped(&outcome.dropped);
    log_info_indent(format!("{} row(s) in excluded regions", outcome.excluded), 1);
    log_info_indent(format!("{} row(s) before {}", outcome.before_start, config.start_year), 1);
    log_success(format!(
        "{} records in {}..={}, retail coverage complete",
        outcome.records.len(),
        outcome.start_year,
        outcome.end_year
    ));
    Ok(outcome)
}

fn log_dropped(dropped: &[DroppedRow]) {
    if dropped.is_empty() {
        return;
    }

    let mut by_reason: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
    for row in dropped {
        by_reason.entry(row.reason.kind()).or_default().push(row.line);
    }

    log_warning(format!("Dropped {} row(s)", dropped.len()));
    for (reason, lines) in by_reason {
        let sample: Vec<String> = lines.iter().take(DROP_SAMPLE_SIZE).map(|l| l.to_string()).collect();
        let more = if lines.len() > DROP_SAMPLE_SIZE { ", ..." } else { "" };
        log_info_indent(format!("{}: {} (lines {}{})", reason, lines.len(), sample.join(", "), more), 1);
    }
}

fn analyze_method(method: PriceMethod, records: &[CleanedRecord], config: &AnalysisConfig) -> PipelineResult<MethodAnalysis> {
    let post_shock = Some(config.post_shock_start);

    let analysis = MethodAnalysis {
        method,
        region_inflation: inflation_table(records, GroupField::Region, None),
        category_inflation: inflation_table(records, GroupField::Category, None),
        post_shock_region_inflation: inflation_table(records, GroupField::Region, post_shock),
        post_shock_category_inflation: inflation_table(records, GroupField::Category, post_shock),
        average_price_by_region: average_by_entity(records, GroupField::Region),
        average_price_by_category: average_by_entity(records, GroupField::Category),
    };

    for (label, table) in analysis.inflation_tables() {
        validate_rows(&format!("{} {}", method, label), &table.rows, OutputSchema::InflationRecord)?;
        log_info_indent(format!("{}: {} rows", label, table.rows.len()), 1);
    }
    for (label, rows) in analysis.average_tables() {
        validate_rows(&format!("{} {}", method, label), rows, OutputSchema::EntityAverage)?;
        log_info_indent(format!("{}: {} rows", label, rows.len()), 1);
    }
    log_success(format!("{} tables valid", method));

    Ok(analysis)
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CleanError, ScopeError};
    use crate::logs::{drain, Stage, LOG_BROADCASTER};
    use crate::transform::aggregate::price_baskets;

    const HEADER: &str =
        "date,admin1,admin2,market,latitude,longitude,category,commodity,unit,priceflag,pricetype,currency,price,usdprice";
    const MARKER: &str = "#date,#adm1+name,#adm2+name,#loc+market+name,#geo+lat,#geo+lon,#item+type,#item+name,#item+unit,#item+price+flag,#item+price+type,#currency,#value,#value+usd";

    fn line(date: &str, region: &str, category: &str, unit: &str, pricetype: &str, price: &str) -> String {
        format!("{date},{region},{region} district,{region} market,20.0,80.0,{category},Rice,{unit},actual,{pricetype},INR,{price},0.5")
    }

    fn sample_csv() -> String {
        let mut lines = vec![HEADER.to_string(), MARKER.to_string()];
        for (i, year) in (2014..=2022).enumerate() {
            let step = i as f64;
            lines.push(line(&format!("{year}-01-15"), "Assam", "cereals and tubers", "KG", "Retail", &format!("{}", 100.0 + 12.5 * step)));
            lines.push(line(&format!("{year}-01-15"), "Goa", "cereals and tubers", "KG", "Retail", &format!("{}", 50.0 + 5.0 * step)));
            lines.push(line(&format!("{year}-06-15"), "Goa", "oil and fats", "L", "Retail", &format!("{}", 150.0 + 10.0 * step)));
            lines.push(line(&format!("{year}-01-15"), "Delhi", "cereals and tubers", "KG", "Retail", &format!("{}", 80.0 + 2.0 * step)));
        }
        // gappy region, excluded by default
        lines.push(line("2016-01-15", "Sikkim", "cereals and tubers", "KG", "Retail", "99"));
        lines.push(line("2012-01-15", "Assam", "cereals and tubers", "KG", "Retail", "70"));
        lines.push(line("2015-01-15", "Delhi", "cereals and tubers", "100 KG", "Wholesale", "2500"));
        lines.push(line("2015-02-15", "Delhi", "cereals and tubers", "KG", "Retail", "n/a"));
        lines.push(line("2015-02-15", "", "cereals and tubers", "KG", "Retail", "40"));
        lines.join("\n")
    }

    fn write_csv(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_full_run() {
        let (_dir, path) = write_csv(&sample_csv());
        let result = run_analysis(&path, &AnalysisConfig::default()).unwrap();

        let summary = &result.summary;
        assert!(summary.marker_row_skipped);
        assert_eq!(summary.rows_read, 41);
        assert_eq!(summary.dropped_by_reason["invalid price"], 1);
        assert_eq!(summary.dropped_by_reason["missing region"], 1);
        assert_eq!(summary.excluded_rows, 1);
        assert_eq!(summary.before_start_rows, 1);
        assert_eq!(summary.retail_records, 36);
        assert_eq!(summary.wholesale_records, 1);
        assert_eq!((summary.start_year, summary.end_year), (2014, 2022));

        let region = &result.retail.region_inflation;
        assert_eq!(region.rows.len(), 27);
        let assam_2022 = region.rows.iter().find(|r| r.entity == "Assam" && r.year == 2022).unwrap();
        assert_eq!(assam_2022.cumulative_inflation_pct, Some(100.0));

        // the "n/a" price row is absent from the basket
        let delhi_2015 = region.rows.iter().find(|r| r.entity == "Delhi" && r.year == 2015).unwrap();
        assert_eq!(delhi_2015.price_basket, 82.0);
        let prepared = prepare_file(&path, &AnalysisConfig::default()).unwrap();
        let baskets = price_baskets(&prepared.split.retail, GroupField::Region);
        assert!(baskets.iter().any(|b| b.entity == "Delhi" && b.year == 2015 && b.price_basket == 82.0));

        let post = &result.retail.post_shock_region_inflation;
        assert!(post.rows.iter().all(|r| r.year >= 2020));
        assert_eq!(post.window.map(|w| w.period_length()), Some(3));

        assert_eq!(result.retail.average_price_by_region.len(), 3);
        assert_eq!(result.retail.average_price_by_category.len(), 2);

        // 1 of 3 regions has wholesale rows
        assert!(result.wholesale_coverage.usable);
        let wholesale = result.wholesale.as_ref().unwrap();
        assert_eq!(wholesale.region_inflation.rows.len(), 1);
    }

    #[test]
    fn test_wholesale_skipped_below_threshold() {
        let (_dir, path) = write_csv(&sample_csv());
        let config = AnalysisConfig {
            wholesale_min_region_share: 0.5,
            ..AnalysisConfig::default()
        };
        let result = run_analysis(&path, &config).unwrap();
        assert!(!result.wholesale_coverage.usable);
        assert!(result.wholesale.is_none());
    }

    #[test]
    fn test_stage_logs_report_drops() {
        let mut rx = LOG_BROADCASTER.subscribe();
        let (_dir, path) = write_csv(&sample_csv());
        run_analysis(&path, &AnalysisConfig::default()).unwrap();

        let entries = drain(&mut rx);
        assert!(entries.iter().any(|e| e.stage == Some(Stage::Clean)));
        let messages: Vec<String> = entries.into_iter().map(|e| e.message).collect();
        assert!(messages.iter().any(|m| m.starts_with("invalid price: 1 (lines")), "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("Wholesale covers 1/3 regions")), "{messages:?}");
    }

    #[test]
    fn test_including_gappy_region_fails_coverage() {
        let (_dir, path) = write_csv(&sample_csv());
        let config = AnalysisConfig {
            excluded_regions: vec![],
            ..AnalysisConfig::default()
        };
        match run_analysis(&path, &config) {
            Err(PipelineError::Scope(ScopeError::IncompleteCoverage { gaps, .. })) => {
                assert_eq!(gaps.len(), 1);
                assert_eq!(gaps[0].region, "Sikkim");
            }
            other => panic!("expected IncompleteCoverage, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_strict_units_fails() {
        let mut csv = sample_csv();
        csv.push('\n');
        csv.push_str(&line("2016-01-15", "Delhi", "cereals and tubers", "100 KG", "Retail", "2600"));
        let (_dir, path) = write_csv(&csv);

        assert!(run_analysis(&path, &AnalysisConfig::default()).is_ok());

        let strict = AnalysisConfig {
            strict_units: true,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            run_analysis(&path, &strict),
            Err(PipelineError::Clean(CleanError::UnitSemantics { count: 1, .. }))
        ));
    }

    #[test]
    fn test_header_only_is_empty_input() {
        let (_dir, path) = write_csv(&format!("{HEADER}\n{MARKER}\n"));
        assert!(matches!(run_analysis(&path, &AnalysisConfig::default()), Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn test_wholesale_only_has_no_retail() {
        let csv = [
            HEADER.to_string(),
            line("2014-01-15", "Delhi", "cereals and tubers", "100 KG", "Wholesale", "2500"),
        ]
        .join("\n");
        assert!(matches!(run_bytes(csv.as_bytes(), &AnalysisConfig::default()), Err(PipelineError::NoRetailRecords)));
    }

    #[test]
    fn test_inflation_for_commodity() {
        let (_dir, path) = write_csv(&sample_csv());
        let prepared = prepare_file(&path, &AnalysisConfig::default()).unwrap();
        let table = inflation_for(&prepared, PriceMethod::Retail, GroupField::Commodity, None).unwrap();
        assert!(table.rows.iter().all(|r| r.entity == "Rice"));
        assert_eq!(table.rows.len(), 9);

        let counts = coverage_counts(&prepared);
        assert_eq!(counts[&PriceMethod::Retail]["Goa"][&2014], 2);
    }

    #[test]
    fn test_invalid_config_rejected_before_reading() {
        let config = AnalysisConfig {
            post_shock_start: 2000,
            ..AnalysisConfig::default()
        };
        let missing = Path::new("/nonexistent/prices.csv");
        assert!(matches!(run_analysis(missing, &config), Err(PipelineError::Config(_))));
    }
}
