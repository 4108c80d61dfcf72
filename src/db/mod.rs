pub mod models;
pub mod queries;
pub mod store;
pub mod writer;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::info;

use crate::config::{Config, DB_BUSY_TIMEOUT_SECS};
use crate::error::Result;

pub use store::{MemoryStore, RecordStore};
pub use writer::SqliteStore;

/// Open (creating if needed) the SQLite database and apply migrations.
/// WAL lets the API read while a scrape writes; writers wait on the busy
/// timeout instead of failing with "database is locked".
pub async fn connect(cfg: &Config) -> Result<sqlx::SqlitePool> {
    let options = SqliteConnectOptions::from_str(&cfg.database_url())?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(DB_BUSY_TIMEOUT_SECS));
    let pool = SqlitePoolOptions::new()
        .max_connections((cfg.max_workers as u32).max(1) + 1)
        .connect_with(options)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", cfg.db_path);
    Ok(pool)
}

/// Migrated in-memory database. One connection: every connection to
/// `:memory:` would otherwise see its own empty database.
#[cfg(test)]
pub async fn memory_pool() -> sqlx::SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}
