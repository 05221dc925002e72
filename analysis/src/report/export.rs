//! Writing reports and tables to disk.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{AnalysisReport, MethodReport};
use crate::error::PipelineResult;

const INFLATION_HEADER: [&str; 5] = [
    "entity",
    "year",
    "priceBasket",
    "yearOverYearInflationPct",
    "cumulativeInflationPct",
];

const AVERAGE_HEADER: [&str; 2] = ["entity", "averagePrice"];

/// Write the report as pretty JSON.
pub fn write_report(report: &AnalysisReport, path: &Path) -> PipelineResult<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}

/// Write one CSV per result table into `dir`, creating it if needed.
///
/// Files are named `<method>_<table>.csv`, e.g. `retail_region_inflation.csv`.
/// Null inflation values are written as empty cells.
pub fn export_tables(report: &AnalysisReport, dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for method in std::iter::once(&report.retail).chain(report.wholesale.as_ref()) {
        written.extend(export_method(method, dir)?);
    }
    Ok(written)
}

fn export_method(report: &MethodReport, dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let prefix = report.tables.method.label().to_lowercase();
    let t = &report.tables;

    let mut written = Vec::new();
    for (name, rows) in [
        ("region_inflation", &t.region_inflation.rows),
        ("category_inflation", &t.category_inflation.rows),
        ("post_shock_region_inflation", &t.post_shock_region_inflation.rows),
        ("post_shock_category_inflation", &t.post_shock_category_inflation.rows),
    ] {
        written.push(write_csv(&dir.join(format!("{prefix}_{name}.csv")), rows, &INFLATION_HEADER)?);
    }
    for (name, rows) in [
        ("average_price_by_region", &t.average_price_by_region),
        ("average_price_by_category", &t.average_price_by_category),
    ] {
        written.push(write_csv(&dir.join(format!("{prefix}_{name}.csv")), rows, &AVERAGE_HEADER)?);
    }
    Ok(written)
}

/// Serialized rows carry their own header; an empty table gets `header`.
fn write_csv<T: Serialize>(path: &Path, rows: &[T], header: &[&str]) -> PipelineResult<PathBuf> {
    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(path.to_path_buf())
}
