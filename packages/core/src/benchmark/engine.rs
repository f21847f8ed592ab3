//! Benchmark Engine - fetch, filter, aggregate, explain

use std::sync::Arc;

use tracing::debug;

use crate::benchmark::{
    aggregator::aggregate,
    error::BenchmarkError,
    filter::filter_records,
    insights::generate_insights,
    source::BenchmarkSource,
    types::*,
};

/// Runs the filter → aggregate → insight pipeline against a record source.
///
/// Holds no mutable state: every call works on the records fetched for that
/// call, so concurrent requests need no coordination.
#[derive(Clone)]
pub struct BenchmarkEngine {
    source: Arc<dyn BenchmarkSource + Send + Sync>,
}

impl BenchmarkEngine {
    pub fn new(source: Arc<dyn BenchmarkSource + Send + Sync>) -> Self {
        Self { source }
    }

    pub fn source_name(&self) -> &str {
        self.source.source_name()
    }

    /// Fetch the peer group for `filter`.
    ///
    /// The filter is re-applied to whatever the source returns; filtering is
    /// idempotent, so a source that already filtered is unaffected.
    pub async fn fetch(&self, filter: &BenchmarkFilter) -> Result<Vec<BenchmarkRecord>, BenchmarkError> {
        let fetched = self.source.fetch_matching(filter).await?;
        let fetched_count = fetched.len();
        let records = filter_records(fetched, filter);

        debug!(
            "Fetched {} records from {} for filter {} ({} after filtering)",
            fetched_count,
            self.source.source_name(),
            filter,
            records.len()
        );

        Ok(records)
    }

    /// Matching records as display rows, ordered by filing id.
    pub async fn list_filtered_data(&self, filter: &BenchmarkFilter) -> Result<Vec<DataRow>, BenchmarkError> {
        let mut records = self.fetch(filter).await?;
        records.sort_by(|a, b| a.ack_id.cmp(&b.ack_id));
        Ok(records.iter().map(DataRow::from).collect())
    }

    /// Latest-period bar chart and per-period line chart.
    pub async fn chart_data(&self, filter: &BenchmarkFilter) -> Result<ChartData, BenchmarkError> {
        let records = self.fetch(filter).await?;
        Ok(aggregate(&records)?.into())
    }

    pub async fn insights(
        &self,
        filter: &BenchmarkFilter,
        current_fee: Option<f64>,
    ) -> Result<InsightResult, BenchmarkError> {
        let records = self.fetch(filter).await?;
        generate_insights(&records, current_fee)
    }

    pub async fn filter_options(&self, state: Option<&str>) -> Result<FilterOptions, BenchmarkError> {
        Ok(self.source.filter_options(state).await?)
    }

    pub async fn health_check(&self) -> Result<(), BenchmarkError> {
        Ok(self.source.health_check().await?)
    }
}
