//! Error types for ratchange

use thiserror::Error;

/// Main error type for ratchange operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing capability: {capability} ({reason})")]
    MissingDependency {
        capability: &'static str,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Degenerate distribution: {0}")]
    DegenerateDistribution(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column '{column}' has {actual} rows, table has {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Column '{column}' is {actual}, expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for ratchange operations
pub type Result<T> = std::result::Result<T, Error>;
