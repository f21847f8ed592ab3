//! Core data types for benchmark analytics

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::benchmark::error::BenchmarkError;

/// Reporting period of a filing: a plan year, optionally narrowed to a quarter.
///
/// Ordering is by year, then year-level before any quarter of that year,
/// then by quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    #[serde(default)]
    pub quarter: Option<u8>,
}

impl Period {
    pub fn year(year: i32) -> Self {
        Self { year, quarter: None }
    }

    /// Returns `None` when `quarter` is outside 1..=4.
    pub fn quarter(year: i32, quarter: u8) -> Option<Self> {
        (1..=4).contains(&quarter).then_some(Self {
            year,
            quarter: Some(quarter),
        })
    }

    /// Quarter label shown in the data table. Year-level filings cover the
    /// whole plan year and are labelled with its closing quarter.
    pub fn display_quarter(&self) -> String {
        format!("{} Q{}", self.year, self.quarter.unwrap_or(4))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quarter {
            Some(q) => write!(f, "{} Q{}", self.year, q),
            None => write!(f, "{}", self.year),
        }
    }
}

/// Categorical axes a peer group can be pinned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    State,
    City,
    BusinessType,
    CompanySize,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::State,
        Dimension::City,
        Dimension::BusinessType,
        Dimension::CompanySize,
    ];

    /// Query-string key used by the HTTP API.
    pub fn query_key(&self) -> &'static str {
        match self {
            Dimension::State => "state",
            Dimension::City => "city",
            Dimension::BusinessType => "businessType",
            Dimension::CompanySize => "companySize",
        }
    }

    /// Business code and participant count are integer columns in the
    /// filing data.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Dimension::BusinessType | Dimension::CompanySize)
    }

    /// Trim the value and, for numeric axes, reduce it to its canonical
    /// integer form so `"0150"` and `"150"` select the same peer group.
    ///
    /// Numeric values must lie in `0..=i64::MAX`, the range an SQLite
    /// `INTEGER` column holds.
    pub fn canonicalize(&self, raw: &str) -> Result<String, BenchmarkError> {
        let trimmed = raw.trim();
        if !self.is_numeric() {
            return Ok(trimmed.to_string());
        }
        trimmed
            .parse::<i64>()
            .ok()
            .filter(|value| *value >= 0)
            .map(|value| value.to_string())
            .ok_or_else(|| BenchmarkError::malformed_filter_value(self.query_key(), raw))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_key())
    }
}

/// Dimension values of a single benchmark record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub company_size: Option<String>,
}

impl Dimensions {
    pub fn get(&self, axis: Dimension) -> Option<&str> {
        match axis {
            Dimension::State => self.state.as_deref(),
            Dimension::City => self.city.as_deref(),
            Dimension::BusinessType => self.business_type.as_deref(),
            Dimension::CompanySize => self.company_size.as_deref(),
        }
    }

    fn slot_mut(&mut self, axis: Dimension) -> &mut Option<String> {
        match axis {
            Dimension::State => &mut self.state,
            Dimension::City => &mut self.city,
            Dimension::BusinessType => &mut self.business_type,
            Dimension::CompanySize => &mut self.company_size,
        }
    }

    /// Canonicalize numeric axes in place. Values that are not integers are
    /// left untouched; they can never match a numeric filter.
    pub fn normalize(&mut self) {
        for axis in Dimension::ALL {
            let slot = self.slot_mut(axis);
            let normalized = slot
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(|value| axis.canonicalize(value).unwrap_or_else(|_| value.to_string()));
            *slot = normalized;
        }
    }
}

/// One employer filing's fee observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkRecord {
    /// Filing acknowledgment id.
    pub ack_id: String,
    #[serde(default)]
    pub sponsor_name: Option<String>,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub carrier_name: Option<String>,
    #[serde(default)]
    pub dimensions: Dimensions,
    pub period: Period,
    pub fee_amount: f64,
}

/// Raw filter parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub state: Option<String>,
    pub city: Option<String>,
    pub business_type: Option<String>,
    pub company_size: Option<String>,
}

/// Equality predicate over dimension axes. Absent axis means unconstrained;
/// all present axes must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchmarkFilter {
    constraints: BTreeMap<Dimension, String>,
}

impl BenchmarkFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a validated filter from query parameters. Empty values are
    /// ignored; numeric axes must hold an unsigned integer.
    pub fn from_params(params: &FilterParams) -> Result<Self, BenchmarkError> {
        let raw = [
            (Dimension::State, params.state.as_deref()),
            (Dimension::City, params.city.as_deref()),
            (Dimension::BusinessType, params.business_type.as_deref()),
            (Dimension::CompanySize, params.company_size.as_deref()),
        ];

        raw.into_iter()
            .try_fold(Self::new(), |filter, (axis, value)| match value {
                Some(value) => filter.try_with(axis, value),
                None => Ok(filter),
            })
    }

    /// Add a constraint on `axis`. A blank value leaves the axis unconstrained.
    pub fn try_with(mut self, axis: Dimension, value: &str) -> Result<Self, BenchmarkError> {
        if value.trim().is_empty() {
            return Ok(self);
        }
        let canonical = axis.canonicalize(value)?;
        self.constraints.insert(axis, canonical);
        Ok(self)
    }

    pub fn with_state(self, state: &str) -> Self {
        self.with_text(Dimension::State, state)
    }

    pub fn with_city(self, city: &str) -> Self {
        self.with_text(Dimension::City, city)
    }

    pub fn with_business_type(mut self, code: u64) -> Self {
        self.constraints.insert(Dimension::BusinessType, code.to_string());
        self
    }

    pub fn with_company_size(mut self, participants: u64) -> Self {
        self.constraints.insert(Dimension::CompanySize, participants.to_string());
        self
    }

    fn with_text(mut self, axis: Dimension, value: &str) -> Self {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            self.constraints.insert(axis, trimmed.to_string());
        }
        self
    }

    pub fn get(&self, axis: Dimension) -> Option<&str> {
        self.constraints.get(&axis).map(String::as_str)
    }

    /// Constrained axes and their required values, in axis order.
    pub fn constraints(&self) -> impl Iterator<Item = (Dimension, &str)> {
        self.constraints.iter().map(|(axis, value)| (*axis, value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn matches(&self, record: &BenchmarkRecord) -> bool {
        self.constraints()
            .all(|(axis, value)| record.dimensions.get(axis) == Some(value))
    }
}

impl fmt::Display for BenchmarkFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("<all>");
        }
        let parts: Vec<String> = self
            .constraints()
            .map(|(axis, value)| format!("{}={}", axis, value))
            .collect();
        f.write_str(&parts.join("&"))
    }
}

/// 25th percentile, median and 75th percentile of a fee sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
}

/// Percentile bands of one reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodStats {
    pub period: Period,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub sample_count: usize,
}

pub const P25_LABEL: &str = "25th Percentile";
pub const MEDIAN_LABEL: &str = "Median";
pub const P75_LABEL: &str = "75th Percentile";

/// One named quantity of the latest-period snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotBand {
    pub name: String,
    pub value: f64,
}

/// Output of the period aggregator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Bands of the most recent period present; empty when there is no data.
    pub snapshot: Vec<SnapshotBand>,
    /// Per-period bands, ascending by period.
    pub series: Vec<PeriodStats>,
}

/// One point of the trend line chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    pub period: String,
    #[serde(rename = "25th Percentile")]
    pub p25: f64,
    #[serde(rename = "Median")]
    pub median: f64,
    #[serde(rename = "75th Percentile")]
    pub p75: f64,
}

impl From<&PeriodStats> for LinePoint {
    fn from(stats: &PeriodStats) -> Self {
        Self {
            period: stats.period.to_string(),
            p25: stats.p25,
            median: stats.median,
            p75: stats.p75,
        }
    }
}

/// Chart-ready view of an aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(rename = "barChart")]
    pub bar_chart: Vec<SnapshotBand>,
    #[serde(rename = "lineChart")]
    pub line_chart: Vec<LinePoint>,
}

impl From<Aggregation> for ChartData {
    fn from(aggregation: Aggregation) -> Self {
        Self {
            line_chart: aggregation.series.iter().map(LinePoint::from).collect(),
            bar_chart: aggregation.snapshot,
        }
    }
}

/// Where a current fee sits relative to the latest period's bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeStatus {
    #[serde(rename = "competitive")]
    Competitive,
    #[serde(rename = "average")]
    Average,
    #[serde(rename = "above average")]
    AboveAverage,
    #[serde(rename = "high")]
    High,
}

impl FeeStatus {
    /// Bands are inclusive at the lower bound and exclusive at the upper;
    /// a fee equal to the 75th percentile is `High`.
    pub fn classify(fee: f64, bands: &Percentiles) -> Self {
        if fee < bands.p25 {
            FeeStatus::Competitive
        } else if fee < bands.median {
            FeeStatus::Average
        } else if fee < bands.p75 {
            FeeStatus::AboveAverage
        } else {
            FeeStatus::High
        }
    }

    pub fn band_text(&self) -> &'static str {
        match self {
            FeeStatus::Competitive => "below the 25th percentile",
            FeeStatus::Average => "between the 25th percentile and median",
            FeeStatus::AboveAverage => "between the median and 75th percentile",
            FeeStatus::High => "above the 75th percentile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeRange {
    pub min: f64,
    pub max: f64,
}

/// Insights for a filtered peer group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResult {
    #[serde(rename = "averageMedian")]
    pub average_of_medians: i64,
    #[serde(rename = "feeRange")]
    pub fee_range: FeeRange,
    #[serde(rename = "trendAnalysis")]
    pub trend_text: String,
    #[serde(rename = "feeAnalysis")]
    pub fee_comparison_text: String,
    #[serde(rename = "feeStatus")]
    pub fee_status: Option<FeeStatus>,
    pub alerts: Vec<String>,
}

/// Row returned by the filtered data listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRow {
    pub ack_id: String,
    pub company: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub business_type: Option<String>,
    pub company_size: Option<String>,
    pub period: String,
    pub quarter: String,
    pub fee: f64,
}

impl From<&BenchmarkRecord> for DataRow {
    fn from(record: &BenchmarkRecord) -> Self {
        Self {
            ack_id: record.ack_id.clone(),
            company: record.sponsor_name.clone(),
            state: record.dimensions.state.clone(),
            city: record.dimensions.city.clone(),
            business_type: record.dimensions.business_type.clone(),
            company_size: record.dimensions.company_size.clone(),
            period: record.period.to_string(),
            quarter: record.period.display_quarter(),
            fee: record.fee_amount,
        }
    }
}

/// Distinct values available for each filter axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub states: Vec<String>,
    pub cities: Vec<String>,
    pub business_types: Vec<String>,
    pub company_sizes: Vec<String>,
}
