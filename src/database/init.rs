//! Pool creation and schema bootstrap.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use tracing::instrument;

/// A type alias for the database connection pool (`Pool<Postgres>`).
pub type DbPool = Pool<Postgres>;

const MAX_CONNECTIONS: u32 = 5;

/// Connects to `url`, switching to `database_name` when one is given.
#[instrument(level = "info", skip_all, fields(database = ?database_name))]
pub async fn connect(url: &str, database_name: Option<&str>) -> Result<DbPool, sqlx::Error> {
    let mut options = PgConnectOptions::from_str(url)?;
    if let Some(name) = database_name {
        options = options.database(name);
    }
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;
    tracing::info!(target: "database", "connected");
    Ok(pool)
}

/// Creates the `data_maps` table if it does not exist yet.
#[instrument(level = "debug", skip(pool))]
pub async fn ensure_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS data_maps (
            name TEXT NOT NULL,
            key TEXT NOT NULL,
            value JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            PRIMARY KEY (name, key)
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}
