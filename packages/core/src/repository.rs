//! Database repository for benchmark records.
//!
//! All SQLite read/write logic lives here. Ingestion calls
//! [`BenchmarkRepository::insert_records`]; the HTTP layer reaches the table
//! through the [`BenchmarkSource`] implementation, which turns a
//! [`BenchmarkFilter`] into a parameterised `WHERE` clause.
//!
//! Each query acquires a pooled connection for its own duration and hands it
//! back when done; nothing holds a connection between requests.

use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::benchmark::{
    source::BenchmarkSource, BenchmarkFilter, BenchmarkRecord, Dimension, Dimensions,
    FilterOptions, Period, SourceError,
};

const SELECT_RECORDS: &str = "SELECT ack_id, sponsor_name, plan_name, carrier_name, state, city,
        business_code, active_participants, plan_year, plan_quarter, fee_amount
     FROM benchmark_records";

/// Repository for reading and writing benchmark records to SQLite.
pub struct BenchmarkRepository {
    pool: SqlitePool,
}

impl BenchmarkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert records by filing id in a single transaction.
    /// Returns the number of rows written.
    pub async fn insert_records(&self, records: &[BenchmarkRecord]) -> Result<u64, sqlx::Error> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for record in records {
            let dims = &record.dimensions;
            let result = sqlx::query(
                "INSERT INTO benchmark_records
                 (ack_id, sponsor_name, plan_name, carrier_name, state, city,
                  business_code, active_participants, plan_year, plan_quarter, fee_amount)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(ack_id) DO UPDATE SET
                    sponsor_name = excluded.sponsor_name,
                    plan_name = excluded.plan_name,
                    carrier_name = excluded.carrier_name,
                    state = excluded.state,
                    city = excluded.city,
                    business_code = excluded.business_code,
                    active_participants = excluded.active_participants,
                    plan_year = excluded.plan_year,
                    plan_quarter = excluded.plan_quarter,
                    fee_amount = excluded.fee_amount",
            )
            .bind(&record.ack_id)
            .bind(&record.sponsor_name)
            .bind(&record.plan_name)
            .bind(&record.carrier_name)
            .bind(&dims.state)
            .bind(&dims.city)
            .bind(integer_column(dims.business_type.as_deref()))
            .bind(integer_column(dims.company_size.as_deref()))
            .bind(record.period.year)
            .bind(record.period.quarter.map(i64::from))
            .bind(record.fee_amount)
            .execute(&mut *tx)
            .await?;

            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    /// Fetch records matching `filter`, ordered by filing id.
    pub async fn fetch_matching(
        &self,
        filter: &BenchmarkFilter,
    ) -> Result<Vec<BenchmarkRecord>, SourceError> {
        // WHERE 1=1 lets every constraint append as "AND col = ?".
        let mut sql = format!("{} WHERE 1=1", SELECT_RECORDS);
        for (axis, _) in filter.constraints() {
            sql.push_str(" AND ");
            sql.push_str(column_for(axis));
            sql.push_str(" = ?");
        }
        sql.push_str(" ORDER BY ack_id ASC");

        let mut query = sqlx::query(&sql);
        for (axis, value) in filter.constraints() {
            query = if axis.is_numeric() {
                // INTEGER columns cannot hold the value, so nothing matches.
                let Ok(number) = value.parse::<i64>() else {
                    tracing::debug!("{} value '{}' is outside the stored range", axis, value);
                    return Ok(Vec::new());
                };
                query.bind(number)
            } else {
                query.bind(value.to_string())
            };
        }

        let mut conn = self.pool.acquire().await?;
        let rows = query.fetch_all(&mut *conn).await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let record = record_from_row(row);
                if record.is_none() {
                    let ack_id: String = row.try_get("ack_id").unwrap_or_default();
                    tracing::warn!("Skipping benchmark record '{}': row could not be decoded", ack_id);
                }
                record
            })
            .collect())
    }

    /// Distinct non-null values of every filter axis.
    pub async fn distinct_options(&self, state: Option<&str>) -> Result<FilterOptions, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let states = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT state FROM benchmark_records WHERE state IS NOT NULL ORDER BY state",
        )
        .fetch_all(&mut *conn)
        .await?;

        let cities = match state.map(str::trim).filter(|s| !s.is_empty()) {
            Some(state) => {
                sqlx::query_scalar::<_, String>(
                    "SELECT DISTINCT city FROM benchmark_records
                     WHERE state = ? AND city IS NOT NULL ORDER BY city",
                )
                .bind(state)
                .fetch_all(&mut *conn)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, String>(
                    "SELECT DISTINCT city FROM benchmark_records WHERE city IS NOT NULL ORDER BY city",
                )
                .fetch_all(&mut *conn)
                .await?
            }
        };

        let business_types = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT business_code FROM benchmark_records
             WHERE business_code IS NOT NULL ORDER BY business_code",
        )
        .fetch_all(&mut *conn)
        .await?;

        let company_sizes = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT active_participants FROM benchmark_records
             WHERE active_participants IS NOT NULL ORDER BY active_participants",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(FilterOptions {
            states,
            cities,
            business_types: business_types.iter().map(i64::to_string).collect(),
            company_sizes: company_sizes.iter().map(i64::to_string).collect(),
        })
    }

    /// Total number of stored records.
    pub async fn count_records(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM benchmark_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("cnt").unwrap_or(0))
    }
}

#[async_trait]
impl BenchmarkSource for BenchmarkRepository {
    async fn fetch_matching(
        &self,
        filter: &BenchmarkFilter,
    ) -> Result<Vec<BenchmarkRecord>, SourceError> {
        BenchmarkRepository::fetch_matching(self, filter).await
    }

    async fn filter_options(&self, state: Option<&str>) -> Result<FilterOptions, SourceError> {
        Ok(self.distinct_options(state).await?)
    }

    fn source_name(&self) -> &str {
        "sqlite"
    }

    async fn health_check(&self) -> Result<(), SourceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn column_for(axis: Dimension) -> &'static str {
    match axis {
        Dimension::State => "state",
        Dimension::City => "city",
        Dimension::BusinessType => "business_code",
        Dimension::CompanySize => "active_participants",
    }
}

fn integer_column(value: Option<&str>) -> Option<i64> {
    let value = value?;
    match value.trim().parse::<i64>() {
        Ok(number) => Some(number),
        Err(_) => {
            tracing::warn!("Dropping non-numeric dimension value '{}'", value);
            None
        }
    }
}

fn record_from_row(row: &SqliteRow) -> Option<BenchmarkRecord> {
    let ack_id: String = row.try_get("ack_id").ok()?;
    let sponsor_name: Option<String> = row.try_get("sponsor_name").ok()?;
    let plan_name: Option<String> = row.try_get("plan_name").ok()?;
    let carrier_name: Option<String> = row.try_get("carrier_name").ok()?;
    let state: Option<String> = row.try_get("state").ok()?;
    let city: Option<String> = row.try_get("city").ok()?;
    let business_code: Option<i64> = row.try_get("business_code").ok()?;
    let participants: Option<i64> = row.try_get("active_participants").ok()?;
    let plan_year: i64 = row.try_get("plan_year").ok()?;
    let plan_quarter: Option<i64> = row.try_get("plan_quarter").ok()?;
    let fee_amount: f64 = row.try_get("fee_amount").ok()?;

    let year = i32::try_from(plan_year).ok()?;
    let period = match plan_quarter {
        Some(quarter) => Period::quarter(year, u8::try_from(quarter).ok()?)?,
        None => Period::year(year),
    };

    Some(BenchmarkRecord {
        ack_id,
        sponsor_name,
        plan_name,
        carrier_name,
        dimensions: Dimensions {
            state,
            city,
            business_type: business_code.map(|code| code.to_string()),
            company_size: participants.map(|count| count.to_string()),
        },
        period,
        fee_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::db::create_pool;

    async fn make_repo() -> BenchmarkRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        BenchmarkRepository::new(pool)
    }

    fn make_record(
        ack_id: &str,
        state: &str,
        city: &str,
        business_code: u64,
        participants: u64,
        period: Period,
        fee_amount: f64,
    ) -> BenchmarkRecord {
        BenchmarkRecord {
            ack_id: ack_id.to_string(),
            sponsor_name: Some(format!("Sponsor {}", ack_id)),
            plan_name: None,
            carrier_name: Some("Acme Life".to_string()),
            dimensions: Dimensions {
                state: Some(state.to_string()),
                city: Some(city.to_string()),
                business_type: Some(business_code.to_string()),
                company_size: Some(participants.to_string()),
            },
            period,
            fee_amount,
        }
    }

    async fn seeded_repo() -> BenchmarkRepository {
        let repo = make_repo().await;
        let records = vec![
            make_record("A3", "TX", "Dallas", 611000, 150, Period::year(2023), 1200.0),
            make_record("A1", "TX", "Dallas", 611000, 150, Period::year(2024), 1500.0),
            make_record("A2", "TX", "Houston", 621111, 200, Period::year(2024), 2500.0),
            make_record("B1", "CA", "Fresno", 611000, 150, Period::quarter(2024, 2).unwrap(), 900.0),
        ];
        repo.insert_records(&records).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn insert_and_fetch_roundtrip() {
        let repo = seeded_repo().await;
        let fetched = repo.fetch_matching(&BenchmarkFilter::new()).await.unwrap();

        assert_eq!(fetched.len(), 4);
        // ordered by ack_id
        assert_eq!(fetched[0].ack_id, "A1");
        assert_eq!(fetched[3].ack_id, "B1");
        assert_eq!(fetched[3].period, Period::quarter(2024, 2).unwrap());
        assert_eq!(fetched[0].dimensions.business_type.as_deref(), Some("611000"));
        assert_eq!(fetched[0].carrier_name.as_deref(), Some("Acme Life"));
    }

    #[tokio::test]
    async fn insert_empty_slice_is_ok() {
        let repo = make_repo().await;
        assert_eq!(repo.insert_records(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn insert_upserts_on_ack_id() {
        let repo = seeded_repo().await;
        let updated = make_record("A1", "TX", "Dallas", 611000, 150, Period::year(2024), 1750.0);
        repo.insert_records(&[updated]).await.unwrap();

        assert_eq!(repo.count_records().await.unwrap(), 4);
        let fetched = repo
            .fetch_matching(&BenchmarkFilter::new().with_city("Dallas"))
            .await
            .unwrap();
        let a1 = fetched.iter().find(|r| r.ack_id == "A1").unwrap();
        assert_eq!(a1.fee_amount, 1750.0);
    }

    #[tokio::test]
    async fn fetch_matching_combines_constraints_with_and() {
        let repo = seeded_repo().await;
        let filter = BenchmarkFilter::new()
            .with_state("TX")
            .with_business_type(611000)
            .with_company_size(150);

        let fetched = repo.fetch_matching(&filter).await.unwrap();
        let ids: Vec<&str> = fetched.iter().map(|r| r.ack_id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A3"]);
    }

    #[tokio::test]
    async fn fetch_matching_is_exact_match() {
        let repo = seeded_repo().await;
        let fetched = repo
            .fetch_matching(&BenchmarkFilter::new().with_state("tx"))
            .await
            .unwrap();
        assert!(fetched.is_empty());
    }

    #[tokio::test]
    async fn fetch_matching_returns_empty_when_no_data() {
        let repo = make_repo().await;
        let fetched = repo.fetch_matching(&BenchmarkFilter::new()).await.unwrap();
        assert!(fetched.is_empty());
    }

    #[tokio::test]
    async fn distinct_options_limits_cities_by_state() {
        let repo = seeded_repo().await;

        let all = repo.distinct_options(None).await.unwrap();
        assert_eq!(all.states, vec!["CA", "TX"]);
        assert_eq!(all.cities, vec!["Dallas", "Fresno", "Houston"]);
        assert_eq!(all.business_types, vec!["611000", "621111"]);
        assert_eq!(all.company_sizes, vec!["150", "200"]);

        let texas = repo.distinct_options(Some("TX")).await.unwrap();
        assert_eq!(texas.cities, vec!["Dallas", "Houston"]);
    }

    #[tokio::test]
    async fn fetch_matching_out_of_range_numeric_value_matches_nothing() {
        let repo = seeded_repo().await;
        let filter = BenchmarkFilter::new().with_company_size(u64::MAX);

        let fetched = repo.fetch_matching(&filter).await.unwrap();
        assert!(fetched.is_empty());
    }

    #[tokio::test]
    async fn fetch_matching_skips_undecodable_rows() {
        let repo = seeded_repo().await;
        // plan_year does not fit the i32 year of a Period
        sqlx::query(
            "INSERT INTO benchmark_records (ack_id, state, plan_year, fee_amount)
             VALUES ('Z9', 'TX', 10000000000, 10.0)",
        )
        .execute(&repo.pool)
        .await
        .unwrap();

        let fetched = repo
            .fetch_matching(&BenchmarkFilter::new().with_state("TX"))
            .await
            .unwrap();
        assert_eq!(repo.count_records().await.unwrap(), 5);
        assert_eq!(fetched.len(), 3);
        assert!(fetched.iter().all(|r| r.ack_id != "Z9"));
    }

    #[tokio::test]
    async fn health_check_succeeds_on_open_pool() {
        let repo = make_repo().await;
        assert!(BenchmarkSource::health_check(&repo).await.is_ok());
    }
}
