//! SQLite connection pool and schema setup.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const MIGRATIONS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS benchmark_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ack_id TEXT NOT NULL UNIQUE,
        sponsor_name TEXT,
        plan_name TEXT,
        carrier_name TEXT,
        state TEXT,
        city TEXT,
        business_code INTEGER,
        active_participants INTEGER,
        plan_year INTEGER NOT NULL,
        plan_quarter INTEGER CHECK (plan_quarter BETWEEN 1 AND 4),
        fee_amount REAL NOT NULL CHECK (fee_amount >= 0)
    )",
    "CREATE INDEX IF NOT EXISTS idx_benchmark_records_peer_group
        ON benchmark_records (state, city, business_code, active_participants)",
    "CREATE INDEX IF NOT EXISTS idx_benchmark_records_period
        ON benchmark_records (plan_year, plan_quarter)",
];

/// Open a pool for `database_url` and apply the schema.
///
/// `sqlite::memory:` databases live inside a single connection, so the pool
/// is pinned to one connection that is never recycled.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let in_memory = database_url.contains(":memory:");

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options.connect_with(options).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in MIGRATIONS {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_pool_applies_schema() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'benchmark_records'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(row.0, 1);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        assert!(run_migrations(&pool).await.is_ok());
    }
}
