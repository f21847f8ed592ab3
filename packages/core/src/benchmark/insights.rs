//! Trend & Insight Generator
//!
//! Turns a filtered peer group into the summary shown beside the charts:
//! average of per-period medians, raw fee range, an earliest-to-latest trend
//! sentence, and where a caller's current fee sits in the latest period.

use tracing::debug;

use crate::benchmark::{
    aggregator::period_series,
    error::BenchmarkError,
    types::*,
};

pub const INSUFFICIENT_TREND_TEXT: &str = "Insufficient data to determine trend.";
pub const NO_DATA_COMPARISON_TEXT: &str = "No data available for comparison.";
pub const NO_CURRENT_FEE_TEXT: &str = "No current fee provided for analysis.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Increased,
    Decreased,
}

/// Median change between the earliest and latest period of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendChange {
    pub from: Period,
    pub to: Period,
    pub direction: TrendDirection,
    /// Whole-number percentage, rounded half up.
    pub percent: i64,
}

impl TrendChange {
    pub fn describe(&self) -> String {
        let verb = match self.direction {
            TrendDirection::Increased => "increased",
            TrendDirection::Decreased => "decreased",
        };
        format!(
            "Fees have {} by {}% from {} to {}.",
            verb, self.percent, self.from, self.to
        )
    }
}

/// Classification of a current fee against the latest period's bands.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeComparison {
    pub status: FeeStatus,
    pub text: String,
    pub alert: Option<String>,
}

impl InsightResult {
    /// Fixed result for a peer group with no records.
    pub fn empty() -> Self {
        Self {
            average_of_medians: 0,
            fee_range: FeeRange { min: 0.0, max: 0.0 },
            trend_text: INSUFFICIENT_TREND_TEXT.to_string(),
            fee_comparison_text: NO_DATA_COMPARISON_TEXT.to_string(),
            fee_status: None,
            alerts: Vec::new(),
        }
    }
}

/// Generate insights for `records`, optionally comparing `current_fee`
/// against the latest period. A current fee that is absent or not positive
/// is not compared.
pub fn generate_insights(
    records: &[BenchmarkRecord],
    current_fee: Option<f64>,
) -> Result<InsightResult, BenchmarkError> {
    if records.is_empty() {
        return Ok(InsightResult::empty());
    }

    let series = period_series(records)?;
    let average_of_medians = average_of_medians(&series);
    let fee_range = fee_range(records);

    let trend_text = match trend_change(&series) {
        Ok(Some(change)) => change.describe(),
        Ok(None) => INSUFFICIENT_TREND_TEXT.to_string(),
        Err(err) => {
            debug!("Trend fallback: {}", err);
            INSUFFICIENT_TREND_TEXT.to_string()
        }
    };

    let comparison = match (current_fee.filter(|fee| *fee > 0.0), series.last()) {
        (Some(fee), Some(latest)) => Some(compare_fee(fee, latest)),
        _ => None,
    };

    Ok(match comparison {
        Some(comparison) => InsightResult {
            average_of_medians,
            fee_range,
            trend_text,
            fee_comparison_text: comparison.text,
            fee_status: Some(comparison.status),
            alerts: comparison.alert.into_iter().collect(),
        },
        None => InsightResult {
            average_of_medians,
            fee_range,
            trend_text,
            fee_comparison_text: NO_CURRENT_FEE_TEXT.to_string(),
            fee_status: None,
            alerts: Vec::new(),
        },
    })
}

/// Mean of per-period medians, rounded half up. Zero for an empty series.
pub fn average_of_medians(series: &[PeriodStats]) -> i64 {
    if series.is_empty() {
        return 0;
    }
    let total: f64 = series.iter().map(|stats| stats.median).sum();
    (total / series.len() as f64).round() as i64
}

/// Minimum and maximum of the raw fee amounts, not of the percentile bands.
pub fn fee_range(records: &[BenchmarkRecord]) -> FeeRange {
    let mut fees = records.iter().map(|record| record.fee_amount);
    match fees.next() {
        Some(first) => {
            let (min, max) = fees.fold((first, first), |(min, max), fee| (min.min(fee), max.max(fee)));
            FeeRange { min, max }
        }
        None => FeeRange { min: 0.0, max: 0.0 },
    }
}

/// Compare the earliest and latest medians of `series`.
///
/// `Ok(None)` when fewer than two periods are present; `InvalidComparison`
/// when the earliest median is zero.
pub fn trend_change(series: &[PeriodStats]) -> Result<Option<TrendChange>, BenchmarkError> {
    let (earliest, latest) = match (series.first(), series.last()) {
        (Some(first), Some(last)) if series.len() >= 2 => (first, last),
        _ => return Ok(None),
    };

    if earliest.median == 0.0 {
        return Err(BenchmarkError::invalid_comparison(format!(
            "median for {} is zero",
            earliest.period
        )));
    }

    let (direction, delta) = if latest.median > earliest.median {
        (TrendDirection::Increased, latest.median - earliest.median)
    } else {
        (TrendDirection::Decreased, earliest.median - latest.median)
    };

    Ok(Some(TrendChange {
        from: earliest.period,
        to: latest.period,
        direction,
        percent: ((delta / earliest.median) * 100.0).round() as i64,
    }))
}

/// Classify `current_fee` against `latest`. Only a `High` fee raises an alert.
pub fn compare_fee(current_fee: f64, latest: &PeriodStats) -> FeeComparison {
    let status = FeeStatus::classify(current_fee, &latest.bands());
    let text = format!(
        "Your current fee is {} for your selected criteria.",
        status.band_text()
    );
    let alert = (status == FeeStatus::High).then(|| {
        format!(
            "Warning: Your current fee of ${} is above the 75th percentile (${})",
            format_amount(current_fee),
            format_amount(latest.p75)
        )
    });

    FeeComparison { status, text, alert }
}

/// Whole amounts print without decimals, anything else with two.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        format!("{:.2}", amount)
    }
}
