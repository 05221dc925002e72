//! Error types for the food inflation pipeline.
//!
//! One error type per stage, each convertible into [`PipelineError`]:
//!
//! - [`CsvError`] - reading and decoding the input file
//! - [`CleanError`] - data-quality failures while cleaning
//! - [`ScopeError`] - time window / region coverage failures
//! - [`ConfigError`] - configuration loading and consistency
//! - [`ValidationError`] - output rows violating the output schema
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Row-level parse failures (bad price, bad date) are not errors. They are
//! recorded as [`crate::models::DroppedRow`] and the run continues.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while reading the input table.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode the file contents.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Malformed CSV.
    #[error("Invalid CSV format at line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// One or more expected columns are absent from the header.
    #[error("Missing expected column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

// =============================================================================
// Cleaning Errors
// =============================================================================

/// Data-quality errors found while cleaning.
///
/// These abort the run: they mean the input does not look like the dataset
/// the analysis was written for.
#[derive(Debug, Error)]
pub enum CleanError {
    /// A column that must be fully populated has an empty cell.
    #[error("Line {line}: unexpected empty value in column '{column}'")]
    UnexpectedNull { line: u64, column: String },

    /// A categorical value outside its vocabulary.
    #[error("Line {line}: unexpected value '{value}' in column '{column}'")]
    UnexpectedValue {
        line: u64,
        column: String,
        value: String,
    },

    /// Unit / price type co-occurrence violated under strict checking.
    #[error("{count} row(s) violate unit semantics, first at line {first_line}: {detail}")]
    UnitSemantics {
        count: usize,
        first_line: u64,
        detail: String,
    },
}

// =============================================================================
// Scope Errors
// =============================================================================

/// A region with no retail observations for one or more years of the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageGap {
    pub region: String,
    pub missing_years: Vec<i32>,
}

impl std::fmt::Display for CoverageGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let years: Vec<String> = self.missing_years.iter().map(|y| y.to_string()).collect();
        write!(f, "{} (missing {})", self.region, years.join(", "))
    }
}

/// Errors from the scope filter.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// The fixed exclusion list no longer yields a uniform timeframe.
    #[error(
        "Retail coverage incomplete for {}..={} in: {}; the excluded region list needs revisiting",
        .start_year,
        .end_year,
        .gaps.iter().map(|g| g.to_string()).collect::<Vec<_>>().join("; ")
    )]
    IncompleteCoverage {
        start_year: i32,
        end_year: i32,
        gaps: Vec<CoverageGap>,
    },

    /// Nothing left after filtering.
    #[error("No records remain from {start_year} onwards after excluding regions")]
    EmptyWindow { start_year: i32 },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors loading or checking an [`crate::config::AnalysisConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error.
    #[error("Config IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Config JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Values that cannot be used together.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors validating output rows.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema validation failed.
    #[error("Validation failed for {table}: {errors:?}")]
    SchemaError { table: String, errors: Vec<String> },

    /// An embedded schema could not be compiled.
    #[error("Invalid embedded schema '{name}': {message}")]
    InvalidSchema { name: String, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run_analysis`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Cleaning error.
    #[error("Data quality error: {0}")]
    Clean(#[from] CleanError),

    /// Scope filter error.
    #[error("Scope error: {0}")]
    Scope(#[from] ScopeError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Output validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO error while writing outputs.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error.
    #[error("CSV export error: {0}")]
    Export(#[from] csv::Error),

    /// No records survived cleaning.
    #[error("No usable records in input")]
    EmptyInput,

    /// No retail records in scope.
    #[error("No retail records in the analysis window")]
    NoRetailRecords,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for cleaning operations.
pub type CleanResult<T> = Result<T, CleanError>;

/// Result type for scope operations.
pub type ScopeResult<T> = Result<T, ScopeError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let csv_err = CsvError::EmptyFile;
        let pipeline_err: PipelineError = csv_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        let clean_err = CleanError::UnexpectedNull {
            line: 7,
            column: "market".into(),
        };
        let pipeline_err: PipelineError = clean_err.into();
        assert!(pipeline_err.to_string().contains("market"));
        assert!(pipeline_err.to_string().contains("Line 7"));
    }

    #[test]
    fn test_missing_columns_lists_all() {
        let err = CsvError::MissingColumns(vec!["admin1".into(), "price".into()]);
        assert_eq!(err.to_string(), "Missing expected column(s): admin1, price");
    }

    #[test]
    fn test_coverage_error_format() {
        let err = ScopeError::IncompleteCoverage {
            start_year: 2014,
            end_year: 2022,
            gaps: vec![
                CoverageGap {
                    region: "Goa".into(),
                    missing_years: vec![2015, 2016],
                },
                CoverageGap {
                    region: "Kerala".into(),
                    missing_years: vec![2022],
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2014..=2022"));
        assert!(msg.contains("Goa (missing 2015, 2016)"));
        assert!(msg.contains("Kerala (missing 2022)"));
    }
}
