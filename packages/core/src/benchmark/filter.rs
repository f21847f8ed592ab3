//! Record Filter

use crate::benchmark::types::{BenchmarkFilter, BenchmarkRecord};

/// Keep the records matching `filter`, preserving their relative order.
///
/// An empty filter keeps everything. Applying the same filter twice yields
/// the same result as applying it once.
pub fn filter_records<I>(records: I, filter: &BenchmarkFilter) -> Vec<BenchmarkRecord>
where
    I: IntoIterator<Item = BenchmarkRecord>,
{
    records
        .into_iter()
        .filter(|record| filter.matches(record))
        .collect()
}

/// Borrowing variant of [`filter_records`] for sources that keep their
/// records resident.
pub fn select<'a>(
    records: &'a [BenchmarkRecord],
    filter: &'a BenchmarkFilter,
) -> impl Iterator<Item = &'a BenchmarkRecord> + 'a {
    records.iter().filter(move |record| filter.matches(record))
}
