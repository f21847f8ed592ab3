//! Prometheus metrics registry for the fee benchmark service.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and pass it
//! to the API handlers and HTTP middleware.
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format
//! (`text/plain; version=0.0.4`).

use prometheus::{
    Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry,
};

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Benchmark API requests, labelled by endpoint.
    pub requests_total: CounterVec,
    /// Record source failures surfaced to callers.
    pub source_errors_total: Counter,
    /// Requests rejected for a malformed filter value.
    pub rejected_filters_total: Counter,
    /// Number of records fetched per benchmark query.
    pub records_fetched: Histogram,
    /// HTTP request count, labelled by method, path, and status code.
    pub http_requests_total: CounterVec,
    /// HTTP request latency histogram in seconds.
    pub http_request_duration: Histogram,
    /// The registry that owns all of the above metrics.
    pub registry: Registry,
}

impl AppMetrics {
    /// Create and register all metrics. Returns an error if any metric
    /// name is invalid or duplicated.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new(
                "fee_benchmark_requests_total",
                "Benchmark API requests by endpoint",
            ),
            &["endpoint"],
        )?;

        let source_errors_total = Counter::with_opts(Opts::new(
            "fee_benchmark_source_errors_total",
            "Benchmark record source failures",
        ))?;

        let rejected_filters_total = Counter::with_opts(Opts::new(
            "fee_benchmark_rejected_filters_total",
            "Requests rejected for a malformed filter value",
        ))?;

        let records_fetched = Histogram::with_opts(
            HistogramOpts::new(
                "fee_benchmark_records_fetched",
                "Records in the peer group per benchmark query",
            )
            .buckets(vec![0.0, 1.0, 4.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0]),
        )?;

        let http_requests_total = CounterVec::new(
            Opts::new(
                "fee_benchmark_http_requests_total",
                "HTTP requests by method, path, and status",
            ),
            &["method", "path", "status"],
        )?;

        let http_request_duration = Histogram::with_opts(
            HistogramOpts::new(
                "fee_benchmark_http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(source_errors_total.clone()))?;
        registry.register(Box::new(rejected_filters_total.clone()))?;
        registry.register(Box::new(records_fetched.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;

        Ok(Self {
            requests_total,
            source_errors_total,
            rejected_filters_total,
            records_fetched,
            http_requests_total,
            http_request_duration,
            registry,
        })
    }

    /// Render all metrics as Prometheus text format (for the `/metrics` endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}
