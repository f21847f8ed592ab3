//! Benchmark Record Source Interface
//!
//! Abstraction over where benchmark records live: a relational table, an
//! in-memory list loaded at startup, or the built-in fixture.

use async_trait::async_trait;

use crate::benchmark::{
    error::SourceError,
    types::{BenchmarkFilter, BenchmarkRecord, Dimension, FilterOptions},
};

/// Capability to fetch benchmark records matching a filter.
#[async_trait]
pub trait BenchmarkSource {
    /// Fetch every record matching `filter`.
    async fn fetch_matching(
        &self,
        filter: &BenchmarkFilter,
    ) -> Result<Vec<BenchmarkRecord>, SourceError>;

    /// Distinct values per axis. When `state` is given, cities are limited
    /// to that state.
    async fn filter_options(&self, state: Option<&str>) -> Result<FilterOptions, SourceError>;

    /// Name of this source for logging/debugging
    fn source_name(&self) -> &str;

    /// Check the source can answer queries.
    async fn health_check(&self) -> Result<(), SourceError> {
        self.fetch_matching(&BenchmarkFilter::new()).await.map(|_| ())
    }
}

/// Build [`FilterOptions`] from resident records.
pub fn options_from_records<'a, I>(records: I, state: Option<&str>) -> FilterOptions
where
    I: IntoIterator<Item = &'a BenchmarkRecord>,
{
    let state = state.map(str::trim).filter(|s| !s.is_empty());
    let mut options = FilterOptions::default();

    for record in records {
        let dims = &record.dimensions;
        if let Some(value) = dims.state.as_ref() {
            options.states.push(value.clone());
        }
        if let Some(value) = dims.city.as_ref() {
            if state.map_or(true, |wanted| dims.state.as_deref() == Some(wanted)) {
                options.cities.push(value.clone());
            }
        }
        if let Some(value) = dims.business_type.as_ref() {
            options.business_types.push(value.clone());
        }
        if let Some(value) = dims.company_size.as_ref() {
            options.company_sizes.push(value.clone());
        }
    }

    sort_distinct(&mut options.states, Dimension::State);
    sort_distinct(&mut options.cities, Dimension::City);
    sort_distinct(&mut options.business_types, Dimension::BusinessType);
    sort_distinct(&mut options.company_sizes, Dimension::CompanySize);
    options
}

/// Numeric axes sort by value, text axes lexically.
fn sort_distinct(values: &mut Vec<String>, axis: Dimension) {
    if axis.is_numeric() {
        values.sort_by_key(|value| (value.parse::<u64>().ok(), value.clone()));
    } else {
        values.sort();
    }
    values.dedup();
}
