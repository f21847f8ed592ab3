//! Percentile Calculator
//!
//! Rank-index percentiles: the value at `floor(n * q)` of the sorted sample,
//! with no interpolation. Small samples fall back to the sample extremes:
//! below four values the 25th percentile is the minimum and the 75th is the
//! maximum, and a single value is its own median.

use crate::benchmark::{error::BenchmarkError, types::Percentiles};

/// Minimum sample size for rank-indexed quartiles.
pub const MIN_SAMPLES_FOR_QUARTILES: usize = 4;
/// Minimum sample size for a rank-indexed median.
pub const MIN_SAMPLES_FOR_MEDIAN: usize = 2;

/// Compute the 25th percentile, median and 75th percentile of `fees`.
pub fn percentiles(fees: &[f64]) -> Result<Percentiles, BenchmarkError> {
    if fees.is_empty() {
        return Err(BenchmarkError::invalid_input(
            "percentiles require at least one fee amount",
        ));
    }
    if let Some((index, fee)) = fees
        .iter()
        .enumerate()
        .find(|(_, fee)| !fee.is_finite() || **fee < 0.0)
    {
        return Err(BenchmarkError::invalid_input(format!(
            "fee amount {} at index {} is not a non-negative number",
            fee, index
        )));
    }

    let mut sorted = fees.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();

    let p25 = if n >= MIN_SAMPLES_FOR_QUARTILES {
        sorted[rank_index(n, 1, 4)]
    } else {
        sorted[0]
    };
    let median = if n >= MIN_SAMPLES_FOR_MEDIAN {
        sorted[rank_index(n, 1, 2)]
    } else {
        sorted[0]
    };
    let p75 = if n >= MIN_SAMPLES_FOR_QUARTILES {
        sorted[rank_index(n, 3, 4)]
    } else {
        sorted[n - 1]
    };

    Ok(Percentiles { p25, median, p75 })
}

/// `floor(n * numerator / denominator)` in integer arithmetic.
fn rank_index(n: usize, numerator: usize, denominator: usize) -> usize {
    n * numerator / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_index_floors() {
        assert_eq!(rank_index(5, 1, 4), 1);
        assert_eq!(rank_index(5, 1, 2), 2);
        assert_eq!(rank_index(5, 3, 4), 3);
        assert_eq!(rank_index(7, 3, 4), 5);
    }

    #[test]
    fn negative_fee_is_rejected() {
        let result = percentiles(&[10.0, -1.0]);
        assert!(matches!(result, Err(BenchmarkError::InvalidInput { .. })));
    }

    #[test]
    fn nan_fee_is_rejected() {
        let result = percentiles(&[f64::NAN]);
        assert!(matches!(result, Err(BenchmarkError::InvalidInput { .. })));
    }
}
