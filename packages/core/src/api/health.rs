use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use super::benchmarks::BenchmarkState;

/// Liveness plus a check of the record source. Answers `ok` or 503.
pub async fn health(State(state): State<BenchmarkState>) -> impl IntoResponse {
    let (status, body) = match state.engine.health_check().await {
        Ok(()) => (StatusCode::OK, "ok".to_string()),
        Err(err) => {
            tracing::warn!("Health check failed for {}: {}", state.engine.source_name(), err);
            (StatusCode::SERVICE_UNAVAILABLE, format!("unavailable: {}", err))
        }
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
