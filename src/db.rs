//! Read-only access to the back-office `settings` table.

use std::collections::HashMap;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::LOYALTY_KEYS;

pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new().max_connections(5).connect(database_url).await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Loyalty-related rows, keyed by setting id. Rows with a NULL value are skipped.
pub async fn load_loyalty_settings(pool: &PgPool) -> Result<HashMap<String, String>, sqlx::Error> {
    let keys: Vec<String> = LOYALTY_KEYS.iter().map(|k| k.to_string()).collect();
    let rows: Vec<(String, Option<String>)> = sqlx::query_as("SELECT id, value FROM settings WHERE id = ANY($1)")
        .bind(keys)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().filter_map(|(id, value)| value.map(|v| (id, v))).collect())
}
