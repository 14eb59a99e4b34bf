//! Database initialization
//!
//! Opens (creating if needed) the SQLite file, applies connection pragmas
//! and creates the schema. Every statement is idempotent, so calling
//! `init_database` on an existing file is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Checkpoint column prefixes in the `people` table, in journey order
pub const CHECKPOINT_COLUMN_PREFIXES: [&str; 4] = ["arrival", "hostel", "documents", "kit"];

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets full-scan readers run alongside the single writer
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    // Concurrent conditional updates queue on the write lock instead of failing
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema_version_table(&pool).await?;
    create_people_table(&pool).await?;

    Ok(pool)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the people table
///
/// One row per tracked person. Each checkpoint owns three columns:
/// `<c>_done` (0/1), `<c>_at` (RFC 3339 text) and `<c>_by` (attribution).
pub async fn create_people_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS people (
            person_id TEXT PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            group_tag TEXT,
            visitor_count INTEGER NOT NULL DEFAULT 0 CHECK (visitor_count >= 0),
            arrival_done INTEGER NOT NULL DEFAULT 0,
            arrival_at TEXT,
            arrival_by TEXT,
            hostel_done INTEGER NOT NULL DEFAULT 0,
            hostel_at TEXT,
            hostel_by TEXT,
            documents_done INTEGER NOT NULL DEFAULT 0,
            documents_at TEXT,
            documents_by TEXT,
            kit_done INTEGER NOT NULL DEFAULT 0,
            kit_at TEXT,
            kit_by TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
