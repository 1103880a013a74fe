//! SQLite adapters.

mod subscription_store;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::domain::foundation::DomainError;

pub use subscription_store::SqliteSubscriptionStore;

/// Open a pool for a `sqlite:` URL, creating the file when missing.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, DomainError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| DomainError::database(format!("Invalid database url: {}", e)))?
        .create_if_missing(true);
    connect_with(options, max_connections).await
}

/// Open a pool from explicit options.
pub async fn connect_with(
    options: SqliteConnectOptions,
    max_connections: u32,
) -> Result<SqlitePool, DomainError> {
    let options = options
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await
        .map_err(|e| DomainError::database(format!("Failed to connect: {}", e)))?;

    info!(max_connections, "SQLite connection pool established");
    Ok(pool)
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DomainError> {
    info!("Running database migrations");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::database(format!("Migration failed: {}", e)))?;
    info!("Database migrations completed");
    Ok(())
}
