//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Local bookmark collection, keyed by URL
CREATE TABLE IF NOT EXISTS bookmarks (
    url TEXT PRIMARY KEY,
    tags_json TEXT NOT NULL,
    meta_json TEXT NOT NULL,
    deleted_meta_json TEXT,
    stored_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Remote collections served to sync clients, one per target
CREATE TABLE IF NOT EXISTS remote_collections (
    target TEXT PRIMARY KEY,
    data_json TEXT NOT NULL,
    version INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- Last successful sync per target
CREATE TABLE IF NOT EXISTS sync_state (
    target TEXT PRIMARY KEY,
    last_sync INTEGER NOT NULL,
    last_report TEXT
);
"#;
