//! Database initialization
//!
//! Opens the sample database (creating the file if needed) and makes sure the
//! sample collection table exists.

use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Connect to `database_url` and create the `collection` table if needed
pub async fn init_database(database_url: &str, collection: &str) -> Result<SqlitePool> {
    if !is_valid_collection_name(collection) {
        return Err(Error::Config(format!("Invalid collection name: {}", collection)));
    }

    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

    let mut options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_millis(5000));
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    // Every connection to ":memory:" is its own database, so pin the pool to one
    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?
    };

    create_samples_table(&pool, collection).await?;
    info!(collection = %collection, "Sample database ready");

    Ok(pool)
}

/// Create the sample collection table and its review-status index
pub async fn create_samples_table(pool: &SqlitePool, collection: &str) -> Result<()> {
    if !is_valid_collection_name(collection) {
        return Err(Error::Config(format!("Invalid collection name: {}", collection)));
    }

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {collection} (
            blob_id TEXT PRIMARY KEY NOT NULL,
            display_name TEXT,
            review_status TEXT CHECK (review_status IN ('labeled', 'obstructed')),
            labels TEXT,
            reviewer TEXT,
            obstructed INTEGER NOT NULL DEFAULT 0,
            reviewed_at TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{collection}_review_status ON {collection}(review_status)"
    ))
    .execute(pool)
    .await?;

    Ok(())
}

/// Collection names are interpolated into SQL, so only plain identifiers pass
pub fn is_valid_collection_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() < 64
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}
