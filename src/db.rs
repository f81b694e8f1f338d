//! Database module
//!
//! Connection and schema utilities.
//! Schema is applied from the raw SQL files in migrations/.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;

/// Tables the ledger store reads and writes
const REQUIRED_TABLES: [&str; 2] = ["accounts", "ledger_entries"];

/// Open the connection pool, retrying a bounded number of times.
///
/// Gives up with the last error once `database_connect_attempts` is spent.
pub async fn connect_with_retry(config: &Config) -> Result<PgPool, sqlx::Error> {
    let attempts = config.database_connect_attempts.max(1);
    let mut attempt = 1;

    loop {
        let result = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await;

        match result {
            Ok(pool) => {
                verify_connection(&pool).await?;
                tracing::info!(attempt, "Database connection established");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    "Database connection failed (attempt {}/{}): {}",
                    attempt,
                    attempts,
                    e
                );
                tokio::time::sleep(config.database_retry_delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!("Giving up on database after {} attempts: {}", attempts, e);
                return Err(e);
            }
        }
    }
}

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}
