use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use crate::config::constant::DEFAULT_DATABASE_URL;

pub async fn db_connection() -> Result<SqlitePool, sqlx::Error> {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        tracing::warn!("DATABASE_URL not set, using default SQLite file");
        DEFAULT_DATABASE_URL.to_string()
    });

    let options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    info!("Connected to SQLite database at {database_url}");

    Ok(pool)
}

/// Single-connection in-memory database. Each connection of a pool gets its
/// own `:memory:` instance, so the pool is capped at one.
pub async fn memory_connection() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .connect_with(options)
        .await
}
