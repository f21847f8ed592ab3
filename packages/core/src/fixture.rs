//! Built-in sample benchmark data.
//!
//! Used for demos and local development when no database or data file is
//! configured. The records are fixed; the fixture answers queries exactly
//! like the in-memory store does.

use async_trait::async_trait;

use crate::benchmark::{
    filter::select,
    source::{options_from_records, BenchmarkSource},
    BenchmarkFilter, BenchmarkRecord, Dimensions, FilterOptions, Period, SourceError,
};

/// NAICS-style business code for educational services.
pub const EDUCATIONAL_SERVICES: u64 = 611000;
/// NAICS-style business code for offices of physicians.
pub const HEALTHCARE: u64 = 621111;

// (ack_id, state, city, business code, active participants, year, quarter, fee)
const SAMPLE_ROWS: &[(&str, &str, &str, u64, u64, i32, u8, f64)] = &[
    ("FX-0001", "TX", "Dallas", EDUCATIONAL_SERVICES, 150, 2024, 1, 3200.0),
    ("FX-0002", "TX", "Dallas", EDUCATIONAL_SERVICES, 150, 2024, 2, 3300.0),
    ("FX-0003", "TX", "Dallas", EDUCATIONAL_SERVICES, 150, 2024, 3, 3400.0),
    ("FX-0004", "TX", "Dallas", HEALTHCARE, 150, 2024, 1, 3900.0),
    ("FX-0005", "TX", "Dallas", HEALTHCARE, 150, 2024, 2, 4000.0),
    ("FX-0006", "TX", "Dallas", HEALTHCARE, 150, 2024, 3, 4100.0),
    ("FX-0007", "TX", "Dallas", EDUCATIONAL_SERVICES, 200, 2024, 1, 4100.0),
    ("FX-0008", "TX", "Dallas", EDUCATIONAL_SERVICES, 200, 2024, 2, 4200.0),
    ("FX-0009", "TX", "Dallas", EDUCATIONAL_SERVICES, 200, 2024, 3, 4300.0),
    ("FX-0010", "TX", "Houston", EDUCATIONAL_SERVICES, 150, 2024, 1, 3000.0),
    ("FX-0011", "TX", "Houston", EDUCATIONAL_SERVICES, 150, 2024, 2, 3100.0),
    ("FX-0012", "TX", "Houston", EDUCATIONAL_SERVICES, 150, 2024, 3, 3200.0),
    ("FX-0013", "CA", "Los Angeles", EDUCATIONAL_SERVICES, 150, 2024, 1, 4100.0),
    ("FX-0014", "CA", "San Francisco", HEALTHCARE, 200, 2024, 2, 5200.0),
];

/// The sample records, in fixture order.
pub fn sample_records() -> Vec<BenchmarkRecord> {
    SAMPLE_ROWS
        .iter()
        .map(
            |&(ack_id, state, city, business_code, participants, year, quarter, fee_amount)| {
                BenchmarkRecord {
                    ack_id: ack_id.to_string(),
                    sponsor_name: Some(format!("{} Sponsor {}", city, &ack_id[3..])),
                    plan_name: Some("401(k) Retirement Plan".to_string()),
                    carrier_name: None,
                    dimensions: Dimensions {
                        state: Some(state.to_string()),
                        city: Some(city.to_string()),
                        business_type: Some(business_code.to_string()),
                        company_size: Some(participants.to_string()),
                    },
                    period: Period {
                        year,
                        quarter: Some(quarter),
                    },
                    fee_amount,
                }
            },
        )
        .collect()
}

/// Static sample-data source.
pub struct FixtureSource {
    records: Vec<BenchmarkRecord>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self {
            records: sample_records(),
        }
    }
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BenchmarkSource for FixtureSource {
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
        "fixture"
    }
}
