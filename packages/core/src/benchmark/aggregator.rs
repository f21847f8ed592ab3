//! Period Aggregator

use std::collections::BTreeMap;

use crate::benchmark::{
    error::BenchmarkError,
    percentile::percentiles,
    types::*,
};

/// Group records by period and compute the percentile bands of each group.
///
/// Returns the per-period series ascending by period, plus a snapshot of the
/// latest period present in `records`. No records yields an empty snapshot
/// and an empty series.
pub fn aggregate(records: &[BenchmarkRecord]) -> Result<Aggregation, BenchmarkError> {
    let series = period_series(records)?;
    let snapshot = series.last().map(snapshot_bands).unwrap_or_default();

    Ok(Aggregation { snapshot, series })
}

/// Per-period percentile bands, ascending by period.
pub fn period_series(records: &[BenchmarkRecord]) -> Result<Vec<PeriodStats>, BenchmarkError> {
    let mut fees_by_period: BTreeMap<Period, Vec<f64>> = BTreeMap::new();
    for record in records {
        fees_by_period
            .entry(record.period)
            .or_default()
            .push(record.fee_amount);
    }

    // Every group holds at least one fee, so `percentiles` only fails on
    // malformed amounts.
    fees_by_period
        .into_iter()
        .map(|(period, fees)| {
            let bands = percentiles(&fees)?;
            Ok(PeriodStats {
                period,
                p25: bands.p25,
                median: bands.median,
                p75: bands.p75,
                sample_count: fees.len(),
            })
        })
        .collect()
}

fn snapshot_bands(latest: &PeriodStats) -> Vec<SnapshotBand> {
    [
        (P25_LABEL, latest.p25),
        (MEDIAN_LABEL, latest.median),
        (P75_LABEL, latest.p75),
    ]
    .into_iter()
    .map(|(name, value)| SnapshotBand {
        name: name.to_string(),
        value,
    })
    .collect()
}

impl PeriodStats {
    pub fn bands(&self) -> Percentiles {
        Percentiles {
            p25: self.p25,
            median: self.median,
            p75: self.p75,
        }
    }
}
