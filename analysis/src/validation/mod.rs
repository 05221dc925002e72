//! JSON Schema validation of output tables.
//!
//! Every inflation and average row is checked against a Draft 7 schema
//! before it is exported.
//!
//! # Embedded Schemas
//!
//! Schemas are embedded at compile time from the `schemas/` directory and
//! compiled once:
//! - `inflation-record.json`
//! - `entity-average.json`
//!
//! # Example
//!
//! ```rust,ignore
//! use food_inflation::validation::{validate_rows, OutputSchema};
//!
//! validate_rows("retail region inflation", &rows, OutputSchema::InflationRecord)?;
//! ```

use jsonschema::Validator;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;

static INFLATION_RECORD: Lazy<Result<Validator, String>> =
    Lazy::new(|| compile(include_str!("../../schemas/inflation-record.json")));

static ENTITY_AVERAGE: Lazy<Result<Validator, String>> =
    Lazy::new(|| compile(include_str!("../../schemas/entity-average.json")));

fn compile(source: &str) -> Result<Validator, String> {
    let schema: Value = serde_json::from_str(source).map_err(|e| e.to_string())?;
    jsonschema::draft7::new(&schema).map_err(|e| e.to_string())
}

/// The row shapes that have an embedded schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSchema {
    InflationRecord,
    EntityAverage,
}

impl OutputSchema {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InflationRecord => "inflation-record",
            Self::EntityAverage => "entity-average",
        }
    }

    fn validator(&self) -> Result<&'static Validator, ValidationError> {
        let compiled = match self {
            Self::InflationRecord => &*INFLATION_RECORD,
            Self::EntityAverage => &*ENTITY_AVERAGE,
        };
        compiled.as_ref().map_err(|message| ValidationError::InvalidSchema {
            name: self.name().to_string(),
            message: message.clone(),
        })
    }
}

/// Validate one value against an embedded schema.
pub fn validate_value(data: &Value, schema: OutputSchema) -> Result<Result<(), Vec<String>>, ValidationError> {
    let validator = schema.validator()?;
    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();
    Ok(if errors.is_empty() { Ok(()) } else { Err(errors) })
}

/// Validate every row of a table. Errors are prefixed with the row index.
pub fn validate_rows<T: Serialize>(table: &str, rows: &[T], schema: OutputSchema) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let value = match serde_json::to_value(row) {
            Ok(value) => value,
            Err(e) => {
                errors.push(format!("row {}: {}", i, e));
                continue;
            }
        };
        if let Err(row_errors) = validate_value(&value, schema)? {
            errors.extend(row_errors.into_iter().map(|e| format!("row {}: {}", i, e)));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::SchemaError {
            table: table.to_string(),
            errors,
        })
    }
}
