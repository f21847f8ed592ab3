//! HTTP surface: benchmark endpoints, health and Prometheus scrape.

pub mod benchmarks;
pub mod health;

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use self::benchmarks::BenchmarkState;

/// Assemble the full application router.
pub fn build_router(state: BenchmarkState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(render_metrics))
        .route("/api/data", get(benchmarks::list_data))
        .route("/api/filters", get(benchmarks::filters))
        .route("/api/chart-data", get(benchmarks::chart_data))
        .route("/api/insights", get(benchmarks::insights))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            track_http_metrics,
        ))
        .layer(cors)
        .with_state(state)
}

/// CORS policy for the benchmark API. Any origin is allowed unless one is
/// configured.
pub fn cors_layer(allow_origin: Option<&str>) -> Result<CorsLayer, String> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any);

    match allow_origin {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .map_err(|_| format!("Invalid CORS_ALLOW_ORIGIN: {}", origin))?;
            Ok(layer.allow_origin(origin))
        }
        None => Ok(layer.allow_origin(Any)),
    }
}

async fn render_metrics(State(state): State<BenchmarkState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            Body::from(body),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Failed to render metrics: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics error").into_response()
        }
    }
}

async fn track_http_metrics(
    State(state): State<BenchmarkState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let started = Instant::now();
    let response = next.run(request).await;

    state
        .metrics
        .http_requests_total
        .with_label_values(&[&method, &path, response.status().as_str()])
        .inc();
    state
        .metrics
        .http_request_duration
        .observe(started.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::http::Request as HttpRequest;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::benchmark::BenchmarkEngine;
    use crate::fixture::FixtureSource;
    use crate::metrics::AppMetrics;

    use super::benchmarks::BenchmarkApiState;

    fn make_app() -> Router {
        let metrics = Arc::new(AppMetrics::new().unwrap());
        let engine = BenchmarkEngine::new(Arc::new(FixtureSource::new()));
        build_router(
            BenchmarkApiState::new(engine, metrics),
            cors_layer(None).unwrap(),
        )
    }

    #[test]
    fn invalid_cors_origin_is_rejected() {
        assert!(cors_layer(Some("bad\norigin")).is_err());
        assert!(cors_layer(Some("https://dashboard.example.com")).is_ok());
    }

    #[tokio::test]
    async fn metrics_endpoint_content_type_is_prometheus_text() {
        let resp = make_app()
            .oneshot(HttpRequest::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let ct = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert_eq!(ct, "text/plain; version=0.0.4");
    }

    #[tokio::test]
    async fn requests_are_counted_by_matched_path() {
        let app = make_app();

        let resp = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/chart-data?state=TX")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(HttpRequest::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();

        assert!(body.contains("fee_benchmark_http_requests_total"));
        assert!(body.contains("path=\"/api/chart-data\""));
        assert!(body.contains("fee_benchmark_requests_total{endpoint=\"chart_data\"} 1"));
    }

    #[tokio::test]
    async fn cors_preflight_allows_any_origin_by_default() {
        let resp = make_app()
            .oneshot(
                HttpRequest::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/insights")
                    .header("origin", "https://dashboard.example.com")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let allow = resp
            .headers()
            .get("access-control-allow-origin")
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(allow, "*");
    }
}
