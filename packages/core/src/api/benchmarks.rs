//! Benchmark API endpoints
//!
//! Every handler validates its filter parameters, runs one engine call and
//! serializes the result. Malformed numeric filters answer 400; a failing
//! record source answers 503.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::benchmark::{
    BenchmarkEngine, BenchmarkError, BenchmarkFilter, ChartData, DataRow, FilterOptions,
    FilterParams, InsightResult,
};
use crate::error::AppError;
use crate::metrics::AppMetrics;

/// State shared by the benchmark handlers.
pub struct BenchmarkApiState {
    pub engine: BenchmarkEngine,
    pub metrics: Arc<AppMetrics>,
}

pub type BenchmarkState = Arc<BenchmarkApiState>;

impl BenchmarkApiState {
    pub fn new(engine: BenchmarkEngine, metrics: Arc<AppMetrics>) -> BenchmarkState {
        Arc::new(Self { engine, metrics })
    }

    fn begin(&self, endpoint: &str, params: &FilterParams) -> Result<BenchmarkFilter, AppError> {
        self.metrics.requests_total.with_label_values(&[endpoint]).inc();
        BenchmarkFilter::from_params(params).map_err(|err| self.fail(err))
    }

    /// Count the failure and convert it for the response.
    fn fail(&self, err: BenchmarkError) -> AppError {
        match &err {
            BenchmarkError::MalformedFilterValue { .. } => self.metrics.rejected_filters_total.inc(),
            BenchmarkError::Source(_) => self.metrics.source_errors_total.inc(),
            _ => {}
        }
        err.into()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltersQuery {
    pub state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InsightsQuery {
    #[serde(flatten)]
    pub filter: FilterParams,
    #[serde(rename = "currentFee")]
    pub current_fee: Option<String>,
}

impl InsightsQuery {
    /// Parsed current fee. Non-numeric values count as not provided.
    pub fn current_fee(&self) -> Option<f64> {
        self.current_fee
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|fee| fee.is_finite())
    }
}

/// GET /api/data
pub async fn list_data(
    State(state): State<BenchmarkState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Vec<DataRow>>, AppError> {
    let filter = state.begin("data", &params)?;
    let rows = state
        .engine
        .list_filtered_data(&filter)
        .await
        .map_err(|err| state.fail(err))?;

    state.metrics.records_fetched.observe(rows.len() as f64);
    Ok(Json(rows))
}

/// GET /api/filters
pub async fn filters(
    State(state): State<BenchmarkState>,
    Query(query): Query<FiltersQuery>,
) -> Result<Json<FilterOptions>, AppError> {
    state.metrics.requests_total.with_label_values(&["filters"]).inc();
    let options = state
        .engine
        .filter_options(query.state.as_deref())
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Json(options))
}

/// GET /api/chart-data
pub async fn chart_data(
    State(state): State<BenchmarkState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<ChartData>, AppError> {
    let filter = state.begin("chart_data", &params)?;
    let started = Instant::now();
    let chart = state
        .engine
        .chart_data(&filter)
        .await
        .map_err(|err| state.fail(err))?;

    tracing::debug!(
        "Chart data for {}: {} periods in {:?}",
        filter,
        chart.line_chart.len(),
        started.elapsed()
    );
    Ok(Json(chart))
}

/// GET /api/insights
pub async fn insights(
    State(state): State<BenchmarkState>,
    Query(query): Query<InsightsQuery>,
) -> Result<Json<InsightResult>, AppError> {
    let filter = state.begin("insights", &query.filter)?;
    let result = state
        .engine
        .insights(&filter, query.current_fee())
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Json(result))
}
