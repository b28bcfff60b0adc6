pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
use std::str::FromStr;

pub async fn create_connection(database_url: &str) -> Result<SqlitePool> {
    let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePool::connect_with(connect_options).await?;

    // Run migrations
    migrations::run_migrations(&pool).await?;

    Ok(pool)
}

/// In-memory database with the real schema. Each SQLite memory connection is
/// its own database, so the pool is capped at one connection.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect_with(connect_options)
        .await
        .unwrap();

    migrations::run_migrations(&pool).await.unwrap();
    pool
}
