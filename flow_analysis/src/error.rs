//! Error types for the flow_analysis crate

use chrono::{DateTime, Utc};
use flow_math::MathError;
use thiserror::Error;

/// Custom error types for the flow_analysis crate
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A period whose start is not strictly before its end
    #[error("Invalid time range: start {start} must be before end {end}")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A fill policy token that is neither a keyword nor a number
    #[error("Unknown fill policy '{0}': use zero, null, nan or a numeric constant")]
    UnknownFillPolicy(String),

    /// A negative top-K limit
    #[error("Invalid top-k for {class}: {value} (must not be negative)")]
    InvalidTopK { class: &'static str, value: i64 },

    /// A flow record that violates the data model
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error parsing timestamps or enumerated tokens
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error from the numeric kernels (shape, history, horizon)
    #[error(transparent)]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error reading CSV input
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error reading or writing JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl From<chrono::ParseError> for AnalysisError {
    fn from(err: chrono::ParseError) -> Self {
        AnalysisError::ParseError(err.to_string())
    }
}
