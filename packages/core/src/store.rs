//! In-memory benchmark record store.
//!
//! `InMemoryBenchmarkStore` holds an immutable list of normalized
//! `BenchmarkRecord`s, typically loaded once at startup from a JSON export
//! produced by the ingestion step. Queries filter the resident list and
//! never mutate it, so the store is shared behind a plain `Arc`.

use std::path::Path;

use async_trait::async_trait;

use crate::benchmark::{
    filter::select,
    source::{options_from_records, BenchmarkSource},
    BenchmarkFilter, BenchmarkRecord, FilterOptions, SourceError,
};

/// Read-only in-memory store of benchmark records.
#[derive(Debug, Default)]
pub struct InMemoryBenchmarkStore {
    records: Vec<BenchmarkRecord>,
}

impl InMemoryBenchmarkStore {
    /// Build a store from `records`, normalizing dimension values and
    /// skipping records whose fee is negative or not a number.
    pub fn new(records: Vec<BenchmarkRecord>) -> Self {
        let total = records.len();
        let records: Vec<BenchmarkRecord> = records
            .into_iter()
            .filter(|record| record.fee_amount.is_finite() && record.fee_amount >= 0.0)
            .map(|mut record| {
                record.dimensions.normalize();
                record
            })
            .collect();

        if records.len() < total {
            tracing::warn!(
                "Skipped {} records with an invalid fee amount",
                total - records.len()
            );
        }

        Self { records }
    }

    /// Load a JSON array of records from `path`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let records: Vec<BenchmarkRecord> = serde_json::from_str(&raw).map_err(|err| {
            SourceError::format(format!("{}: {}", path.display(), err))
        })?;

        tracing::info!("Loaded {} benchmark records from {}", records.len(), path.display());
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[BenchmarkRecord] {
        &self.records
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl BenchmarkSource for InMemoryBenchmarkStore {
    async fn fetch_matching(
        &self,
        filter: &BenchmarkFilter,
    ) -> Result<Vec<BenchmarkRecord>, SourceError> {
        Ok(select(&self.records, filter).cloned().collect())
    }

    async fn filter_options(&self, state: Option<&str>) -> Result<FilterOptions, SourceError> {
        Ok(options_from_records(&self.records, state))
    }

    fn source_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::{Dimensions, Period};

    fn make_record(ack_id: &str, state: &str, size: &str, fee_amount: f64) -> BenchmarkRecord {
        BenchmarkRecord {
            ack_id: ack_id.to_string(),
            sponsor_name: None,
            plan_name: None,
            carrier_name: None,
            dimensions: Dimensions {
                state: Some(state.to_string()),
                city: None,
                business_type: None,
                company_size: Some(size.to_string()),
            },
            period: Period::year(2024),
            fee_amount,
        }
    }

    // ---- construction ----

    #[test]
    fn new_store_is_empty() {
        let store = InMemoryBenchmarkStore::default();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn new_skips_negative_and_nan_fees() {
        let store = InMemoryBenchmarkStore::new(vec![
            make_record("a", "TX", "150", 100.0),
            make_record("b", "TX", "150", -5.0),
            make_record("c", "TX", "150", f64::NAN),
        ]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].ack_id, "a");
    }

    #[test]
    fn new_canonicalizes_numeric_dimensions() {
        let store = InMemoryBenchmarkStore::new(vec![make_record("a", " TX ", "0150", 100.0)]);
        let dims = &store.records()[0].dimensions;
        assert_eq!(dims.company_size.as_deref(), Some("150"));
        assert_eq!(dims.state.as_deref(), Some("TX"));
    }

    #[test]
    fn from_json_file_reports_format_errors() {
        let path = std::env::temp_dir().join("plan_fee_benchmark_bad_records.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = InMemoryBenchmarkStore::from_json_file(&path);
        assert!(matches!(result, Err(SourceError::Format { .. })));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn from_json_file_missing_file_is_io_error() {
        let result = InMemoryBenchmarkStore::from_json_file("/nonexistent/records.json");
        assert!(matches!(result, Err(SourceError::Io(_))));
    }

    // ---- fetch_matching ----

    #[tokio::test]
    async fn fetch_matching_preserves_load_order() {
        let store = InMemoryBenchmarkStore::new(vec![
            make_record("z", "TX", "150", 300.0),
            make_record("a", "CA", "150", 100.0),
            make_record("m", "TX", "200", 200.0),
        ]);

        let fetched = store
            .fetch_matching(&BenchmarkFilter::new().with_state("TX"))
            .await
            .unwrap();

        let ids: Vec<&str> = fetched.iter().map(|r| r.ack_id.as_str()).collect();
        assert_eq!(ids, vec!["z", "m"]);
    }

    #[tokio::test]
    async fn fetch_matching_numeric_axis_matches_canonical_value() {
        let store = InMemoryBenchmarkStore::new(vec![make_record("a", "TX", "0150", 100.0)]);
        let filter = BenchmarkFilter::new().with_company_size(150);

        assert_eq!(store.fetch_matching(&filter).await.unwrap().len(), 1);
    }

    // ---- filter_options ----

    #[tokio::test]
    async fn filter_options_sorts_sizes_numerically() {
        let store = InMemoryBenchmarkStore::new(vec![
            make_record("a", "TX", "1000", 1.0),
            make_record("b", "TX", "25", 1.0),
            make_record("c", "CA", "150", 1.0),
            make_record("d", "CA", "25", 1.0),
        ]);

        let options = store.filter_options(None).await.unwrap();
        assert_eq!(options.states, vec!["CA", "TX"]);
        assert_eq!(options.company_sizes, vec!["25", "150", "1000"]);
    }
}
