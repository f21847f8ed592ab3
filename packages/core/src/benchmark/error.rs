//! Error types for benchmark analytics

use thiserror::Error;

/// Errors raised by the analytics engine.
///
/// Empty peer groups, single periods and zero baselines are not errors;
/// the engine answers them with fixed fallback output.
#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Invalid comparison: {message}")]
    InvalidComparison { message: String },

    #[error("Malformed value '{value}' for filter '{axis}'")]
    MalformedFilterValue { axis: String, value: String },

    #[error("Benchmark source error: {0}")]
    Source(#[from] SourceError),
}

/// Errors from benchmark record sources.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data format error: {message}")]
    Format { message: String },

    #[error("Source unavailable: {message}")]
    Unavailable { message: String },
}

impl BenchmarkError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput { message: message.into() }
    }

    pub fn invalid_comparison(message: impl Into<String>) -> Self {
        Self::InvalidComparison { message: message.into() }
    }

    pub fn malformed_filter_value(axis: impl Into<String>, value: impl Into<String>) -> Self {
        Self::MalformedFilterValue {
            axis: axis.into(),
            value: value.into(),
        }
    }
}

impl SourceError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format { message: message.into() }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }
}
