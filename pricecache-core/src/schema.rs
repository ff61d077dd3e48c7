//! Cache file schema contract.
//!
//! Defines the exact column names, data types, and order of a cached price
//! table. Writes build every column from this list and loads are checked
//! against it, so cache hits and fresh fetches come back with identical typing.

use polars::prelude::{DataFrame, DataType};
use serde::{Deserialize, Serialize};

/// Expected data types in the Parquet schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaType {
    Date,
    Float64,
    Int64,
}

impl SchemaType {
    /// The Polars dtype this column is stored as.
    pub fn dtype(self) -> DataType {
        match self {
            SchemaType::Date => DataType::Date,
            SchemaType::Float64 => DataType::Float64,
            SchemaType::Int64 => DataType::Int64,
        }
    }

    /// Map a Polars dtype back to a schema type, if it is one we use.
    pub fn from_dtype(dtype: &DataType) -> Option<Self> {
        match dtype {
            DataType::Date => Some(SchemaType::Date),
            DataType::Float64 => Some(SchemaType::Float64),
            DataType::Int64 => Some(SchemaType::Int64),
            _ => None,
        }
    }
}

/// A single field in the expected Parquet schema.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaField {
    pub name: &'static str,
    pub dtype: SchemaType,
}

const fn field(name: &'static str, dtype: SchemaType) -> SchemaField {
    SchemaField { name, dtype }
}

/// The price table schema, in column order.
///
/// - One row per trading day, ascending by `date`
/// - `date` is a calendar date with no time component
/// - Volumes are whole share counts
pub const PRICE_SCHEMA: &[SchemaField] = &[
    field("date", SchemaType::Date),
    field("open", SchemaType::Float64),
    field("high", SchemaType::Float64),
    field("low", SchemaType::Float64),
    field("close", SchemaType::Float64),
    field("volume", SchemaType::Int64),
    field("adjusted_open", SchemaType::Float64),
    field("adjusted_high", SchemaType::Float64),
    field("adjusted_low", SchemaType::Float64),
    field("adjusted_close", SchemaType::Float64),
    field("adjusted_volume", SchemaType::Int64),
    field("dividend_cash", SchemaType::Float64),
    field("split_factor", SchemaType::Float64),
];

/// Column names in schema order.
pub fn column_names() -> Vec<&'static str> {
    PRICE_SCHEMA.iter().map(|f| f.name).collect()
}

/// Result of schema validation.
#[derive(Debug, Clone)]
pub struct SchemaValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Validate a set of (column_name, column_type) pairs against the schema.
///
/// Column order is part of the contract.
pub fn validate_schema(columns: &[(&str, Option<SchemaType>)]) -> SchemaValidation {
    let mut errors = Vec::new();

    for expected in PRICE_SCHEMA {
        match columns.iter().find(|(name, _)| *name == expected.name) {
            Some((_, Some(dtype))) if *dtype == expected.dtype => {}
            Some((_, dtype)) => {
                errors.push(format!(
                    "column '{}': expected {:?}, got {:?}",
                    expected.name, expected.dtype, dtype
                ));
            }
            None => {
                errors.push(format!("missing required column '{}'", expected.name));
            }
        }
    }

    for (name, _) in columns {
        if !PRICE_SCHEMA.iter().any(|f| f.name == *name) {
            errors.push(format!("unexpected column '{name}' (not in schema)"));
        }
    }

    if errors.is_empty() {
        let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        if names != column_names() {
            errors.push(format!("columns out of order: {names:?}"));
        }
    }

    SchemaValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Validate a loaded DataFrame against the schema.
pub fn validate_frame(df: &DataFrame) -> SchemaValidation {
    let columns: Vec<(&str, Option<SchemaType>)> = df
        .get_columns()
        .iter()
        .map(|c| (c.name().as_str(), SchemaType::from_dtype(c.dtype())))
        .collect();
    validate_schema(&columns)
}
