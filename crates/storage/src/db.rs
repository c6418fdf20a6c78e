use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{self, SqliteConnectOptions, SqlitePool};

/// Opens (or creates) the relay database and applies the schema. One durable
/// file; the nonce table inside it is the only ephemeral content.
pub async fn open_pool(data_folder: &str) -> Result<SqlitePool, sqlx::Error> {
    std::fs::create_dir_all(data_folder)?;
    let db_filename = format!("{}/relay.db", data_folder);

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_filename))?
        .create_if_missing(true)
        .journal_mode(sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlite::SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30))
        .foreign_keys(true)
        .statement_cache_capacity(100);

    let pool = SqlitePool::connect_with(options).await?;
    apply_schema(&pool).await?;
    Ok(pool)
}

/// In-memory pool for tests. A single connection, so every query sees the
/// same database.
pub async fn open_test_pool() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    apply_schema(&pool).await?;
    Ok(pool)
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let schema = include_str!("../sql/schema.sql");
    sqlx::query(schema).execute(pool).await?;
    Ok(())
}
