use std::fmt;
use std::error::Error;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::benchmark::BenchmarkError;

/// Unified application error.
///
/// Startup failures (config, database) and request failures share this
/// type; the HTTP layer turns it into a JSON `{"error": ...}` body.
#[derive(Debug)]
pub enum AppError {
    Config(String),
    Database(String),
    BadRequest(String),
    SourceUnavailable(String),
    Unknown(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::SourceUnavailable(msg) => write!(f, "Data source unavailable: {}", msg),
            AppError::Unknown(msg) => write!(f, "Unknown error: {}", msg),
        }
    }
}

impl Error for AppError {}

impl From<BenchmarkError> for AppError {
    fn from(err: BenchmarkError) -> Self {
        match err {
            BenchmarkError::MalformedFilterValue { .. } => AppError::BadRequest(err.to_string()),
            BenchmarkError::Source(source) => AppError::SourceUnavailable(source.to_string()),
            other => AppError::Unknown(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
