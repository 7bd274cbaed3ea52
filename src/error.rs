//! Error types for the index builder.

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for index construction.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Malformed price panel: {0}")]
    MalformedPanel(String),

    #[error("Insufficient universe: {available} stock(s) available, {required} required")]
    InsufficientUniverse { available: usize, required: usize },

    #[error("No holding assigned on {0}: date precedes the first month-end selection")]
    MissingHolding(NaiveDate),

    #[error("Date {0} is not present in the price panel")]
    DateNotInPanel(NaiveDate),

    #[error(
        "Range starts on {start}, before the first date with a holding ({})",
        first_available.map(|d| d.to_string()).unwrap_or_else(|| "none".to_string())
    )]
    RangeBeforeData {
        start: NaiveDate,
        first_available: Option<NaiveDate>,
    },

    #[error("No panel dates between {start} and {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParseError(#[from] chrono::ParseError),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
