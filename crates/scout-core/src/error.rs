//! Unified error types for Scout

use thiserror::Error;

/// Unified error type for all Scout operations
#[derive(Error, Debug)]
pub enum ScoutError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Model API errors
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("API limit reached: {0}")]
    ApiLimit(String),

    #[error("Model API paused after repeated failed rounds, retry in {}s", .retry_in.as_secs())]
    CircuitOpen { retry_in: std::time::Duration },

    // HTTP client setup errors (probe failures are verdicts, not errors)
    #[error("HTTP client error: {0}")]
    Http(String),

    // Export errors
    #[error("Export failed: {0}")]
    Export(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

/// Result type alias using ScoutError
pub type Result<T> = std::result::Result<T, ScoutError>;
