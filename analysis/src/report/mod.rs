//! Analysis report: serializable run output, rankings and terminal summary.
//!
//! Formatting lives here so the pipeline only computes tables.

pub mod export;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::models::{EntityAverage, InflationRecord};
use crate::transform::aggregate::InflationTable;
use crate::transform::pipeline::{AnalysisResult, InputSummary, MethodAnalysis};
use crate::transform::rank::{rankings, RankField, Rankings};
use crate::transform::split::WholesaleCoverage;

pub use export::{export_tables, write_report};

/// Complete output of one run, written as JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Unique run identifier
    pub run_id: String,

    /// RFC 3339 generation time (UTC)
    pub generated_at: String,

    pub input: String,
    pub config: AnalysisConfig,
    pub summary: InputSummary,
    pub wholesale_coverage: WholesaleCoverage,

    pub retail: MethodReport,

    /// Absent when wholesale coverage is too sparse
    pub wholesale: Option<MethodReport>,

    /// Why wholesale was not analyzed
    pub wholesale_skipped_reason: Option<String>,
}

/// Tables and rankings for one price method
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodReport {
    pub tables: MethodAnalysis,
    pub rankings: MethodRankings,
}

/// Extremes of every table of one price method
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodRankings {
    pub cumulative_by_region: Rankings<InflationRecord>,
    pub cumulative_by_category: Rankings<InflationRecord>,
    pub post_shock_cumulative_by_region: Rankings<InflationRecord>,
    pub post_shock_cumulative_by_category: Rankings<InflationRecord>,
    pub average_price_by_region: Rankings<EntityAverage>,
    pub average_price_by_category: Rankings<EntityAverage>,
}

impl MethodReport {
    pub fn new(tables: MethodAnalysis, top_n: usize) -> Self {
        let cumulative = |table: &InflationTable| rankings(&table.rows, RankField::Cumulative, top_n);
        let ranked = MethodRankings {
            cumulative_by_region: cumulative(&tables.region_inflation),
            cumulative_by_category: cumulative(&tables.category_inflation),
            post_shock_cumulative_by_region: cumulative(&tables.post_shock_region_inflation),
            post_shock_cumulative_by_category: cumulative(&tables.post_shock_category_inflation),
            average_price_by_region: rankings(&tables.average_price_by_region, RankField::AveragePrice, top_n),
            average_price_by_category: rankings(&tables.average_price_by_category, RankField::AveragePrice, top_n),
        };
        Self { tables, rankings: ranked }
    }
}

impl AnalysisReport {
    pub fn new(result: AnalysisResult, config: &AnalysisConfig, input: impl Into<String>) -> Self {
        let coverage = result.wholesale_coverage;
        let wholesale_skipped_reason = (!coverage.usable).then(|| {
            if coverage.wholesale_regions.is_empty() {
                "no wholesale records in scope".to_string()
            } else {
                format!(
                    "wholesale covers {} of {} regions ({:.0}%), below the {:.0}% minimum",
                    coverage.wholesale_regions.len(),
                    coverage.total_regions,
                    coverage.share * 100.0,
                    coverage.min_share * 100.0
                )
            }
        });

        Self {
            run_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now().to_rfc3339(),
            input: input.into(),
            config: config.clone(),
            summary: result.summary,
            wholesale_coverage: coverage,
            retail: MethodReport::new(result.retail, config.top_n),
            wholesale: result.wholesale.map(|w| MethodReport::new(w, config.top_n)),
            wholesale_skipped_reason,
        }
    }
}

/// Format the run summary followed by every ranking.
pub fn format_summary(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let s = &report.summary;

    out.push_str("=== Food Price Inflation ===\n");
    out.push_str(&format!("Input: {}\n", report.input));
    out.push_str(&format!("Run: {} at {}\n", report.run_id, report.generated_at));
    out.push_str(&format!("Window: {}..={} (post-shock from {})\n", s.start_year, s.end_year, report.config.post_shock_start));
    out.push_str(&format!(
        "Rows: read={} in_scope={} retail={} wholesale={}\n",
        s.rows_read, s.records_in_scope, s.retail_records, s.wholesale_records
    ));
    out.push_str(&format!(
        "Removed: excluded_regions={} before_start={}",
        s.excluded_rows, s.before_start_rows
    ));
    for (reason, count) in &s.dropped_by_reason {
        out.push_str(&format!(" {}={}", reason.replace(' ', "_"), count));
    }
    out.push('\n');
    if s.unit_violations > 0 {
        out.push_str(&format!("Unit warnings: {}\n", s.unit_violations));
    }

    out.push_str(&format_method(&report.retail));
    match (&report.wholesale, &report.wholesale_skipped_reason) {
        (Some(wholesale), _) => out.push_str(&format_method(wholesale)),
        (None, Some(reason)) => out.push_str(&format!("\nWholesale skipped: {}\n", reason)),
        (None, None) => {}
    }

    out
}

fn format_method(report: &MethodReport) -> String {
    let mut out = String::new();
    let method = report.tables.method;
    let r = &report.rankings;

    let inflation = [
        ("cumulative inflation by region", &r.cumulative_by_region, &report.tables.region_inflation),
        ("cumulative inflation by category", &r.cumulative_by_category, &report.tables.category_inflation),
        (
            "post-shock cumulative inflation by region",
            &r.post_shock_cumulative_by_region,
            &report.tables.post_shock_region_inflation,
        ),
        (
            "post-shock cumulative inflation by category",
            &r.post_shock_cumulative_by_category,
            &report.tables.post_shock_category_inflation,
        ),
    ];

    for (label, ranking, table) in inflation {
        let period = table
            .window
            .map(|w| format!(" ({}..={}, {} years)", w.first_year, w.last_year, w.period_length()))
            .unwrap_or_default();
        out.push_str(&format!("\n{} {}{}\n", method, label, period));
        out.push_str(&inflation_table("Highest", &ranking.highest));
        out.push_str(&inflation_table("Lowest", &ranking.lowest));
    }

    for (label, ranking) in [
        ("average price by region", &r.average_price_by_region),
        ("average price by category", &r.average_price_by_category),
    ] {
        out.push_str(&format!("\n{} {}\n", method, label));
        out.push_str(&average_table("Highest", &ranking.highest));
        out.push_str(&average_table("Lowest", &ranking.lowest));
    }

    out
}

fn inflation_table(title: &str, rows: &[InflationRecord]) -> String {
    let mut out = format!("  {}:\n", title);
    if rows.is_empty() {
        out.push_str("    (no complete series)\n");
        return out;
    }
    out.push_str(&format!("    {:<28} {:>6} {:>12} {:>12}\n", "entity", "year", "basket", "cumulative%"));
    out.push_str(&format!("    {:-<28} {:-<6} {:-<12} {:-<12}\n", "", "", "", ""));
    for row in rows {
        out.push_str(&format!(
            "    {:<28} {:>6} {:>12.2} {:>12}\n",
            truncate(&row.entity, 28),
            row.year,
            row.price_basket,
            fmt_pct(row.cumulative_inflation_pct)
        ));
    }
    out
}

fn average_table(title: &str, rows: &[EntityAverage]) -> String {
    let mut out = format!("  {}:\n", title);
    out.push_str(&format!("    {:<28} {:>12}\n", "entity", "average"));
    out.push_str(&format!("    {:-<28} {:-<12}\n", "", ""));
    for row in rows {
        out.push_str(&format!("    {:<28} {:>12.2}\n", truncate(&row.entity, 28), row.average_price));
    }
    out
}

fn fmt_pct(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
