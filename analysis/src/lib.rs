//! # Food Inflation - regional food price inflation analysis
//!
//! Reads a food price table (date, region, market, category, commodity,
//! unit, price type, price...) and reports how prices moved per region and
//! per food category: yearly price baskets, year-over-year inflation,
//! cumulative inflation over the whole window and after a shock year.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌─────────┐   ┌─────────┐   ┌───────────┐   ┌────────┐
//! │ CSV File │──▶│ Cleaner │──▶│  Scope  │──▶│ Splitter│──▶│ Aggregator│──▶│ Ranker │
//! │(auto-enc)│   │ (drops) │   │(window) │   │(R / W)  │   │ (basket,%)│   │(top/bot)│
//! └──────────┘   └─────────┘   └─────────┘   └─────────┘   └───────────┘   └────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use food_inflation::{run_analysis, AnalysisConfig, AnalysisReport};
//! use std::path::Path;
//!
//! let config = AnalysisConfig::default();
//! let result = run_analysis(Path::new("wfp_food_prices_ind.csv"), &config)?;
//! let report = AnalysisReport::new(result, &config, "wfp_food_prices_ind.csv");
//! println!("{}", food_inflation::report::format_summary(&report));
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Analysis constants and config files
//! - [`logs`] - Stage logging
//! - [`models`] - Domain models (PriceRecord, InflationRecord, ...)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`transform`] - Cleaning, scoping, splitting, aggregation, ranking, pipeline
//! - [`validation`] - Output schema validation
//! - [`report`] - Report assembly, summary text, export

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Output
pub mod report;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CleanError, ConfigError, CoverageGap, CsvError, PipelineError, PipelineResult, ScopeError, ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CleanedRecord, DropReason, DroppedRow, EntityAverage, GroupField, InflationRecord, PriceBasket, PriceMethod,
    PriceRecord,
};

// =============================================================================
// Re-exports - Config
// =============================================================================

pub use config::AnalysisConfig;

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_file_auto, RawTable};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    clean_file, coverage_counts, inflation_for, prepare_file, run_analysis, run_bytes, run_table, AnalysisResult,
    InputSummary, MethodAnalysis, PreparedData,
};

// =============================================================================
// Re-exports - Report
// =============================================================================

pub use report::{export_tables, format_summary, write_report, AnalysisReport};
