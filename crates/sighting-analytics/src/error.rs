//! Analytics error types.

use thiserror::Error;

/// Analytics errors.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Malformed input row
    #[error("Decode error at line {line}: {reason}")]
    Decode {
        /// 1-based line number, header included
        line: u64,
        /// What could not be decoded
        reason: String,
    },

    /// CSV transport error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Extremal query with no eligible input
    #[error("No result: {0}")]
    EmptySelection(String),

    /// Percentage or mean over an empty population
    #[error("Undefined: {0}")]
    Undefined(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unusable configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Domain error
    #[error(transparent)]
    Domain(#[from] sighting_domain::DomainError),

    /// Data conversion error
    #[error("Data conversion error: {0}")]
    Conversion(String),
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Conversion(err.to_string())
    }
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
