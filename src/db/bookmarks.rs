//! Bookmark database operations

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::sync::{BookmarkRecord, BookmarkStore, BookmarksData, Result, SyncError};

/// Largest number of URLs bound into one `IN (...)` clause
const DELETE_CHUNK_SIZE: usize = 500;

/// Bookmark repository
pub struct BookmarkRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BookmarkRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a single bookmark
    pub async fn get(&self, url: &str) -> Result<Option<BookmarkRecord>> {
        let row = sqlx::query_as::<_, BookmarkRow>(
            r#"
            SELECT url, tags_json, meta_json, deleted_meta_json
            FROM bookmarks
            WHERE url = ?
            "#,
        )
        .bind(url)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| r.into_record().map(|(_, record)| record))
            .transpose()
    }

    /// Get the whole collection
    pub async fn list(&self) -> Result<BookmarksData> {
        let rows = sqlx::query_as::<_, BookmarkRow>(
            r#"
            SELECT url, tags_json, meta_json, deleted_meta_json
            FROM bookmarks
            ORDER BY url ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_record()).collect()
    }

    /// Insert or replace bookmarks
    pub async fn save_all(&self, records: &BookmarksData) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for (url, record) in records {
            let tags_json = serde_json::to_string(&record.tags)?;
            let meta_json = serde_json::to_string(&record.meta)?;
            let deleted_meta_json = record
                .deleted_meta
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;

            sqlx::query(
                r#"
                INSERT INTO bookmarks (url, tags_json, meta_json, deleted_meta_json, stored_at)
                VALUES (?, ?, ?, ?, datetime('now'))
                ON CONFLICT(url) DO UPDATE SET
                    tags_json = excluded.tags_json,
                    meta_json = excluded.meta_json,
                    deleted_meta_json = excluded.deleted_meta_json,
                    stored_at = excluded.stored_at
                "#,
            )
            .bind(url)
            .bind(&tags_json)
            .bind(&meta_json)
            .bind(&deleted_meta_json)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    /// Permanently remove bookmarks, returning how many existed
    pub async fn remove_all(&self, urls: &[String]) -> Result<u64> {
        if urls.is_empty() {
            return Ok(0);
        }

        let mut removed = 0;
        let mut tx = self.pool.begin().await?;
        for chunk in urls.chunks(DELETE_CHUNK_SIZE) {
            let placeholders: Vec<&str> = chunk.iter().map(|_| "?").collect();
            let query = format!(
                "DELETE FROM bookmarks WHERE url IN ({})",
                placeholders.join(", ")
            );

            let mut q = sqlx::query(&query);
            for url in chunk {
                q = q.bind(url);
            }
            removed += q.execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        Ok(removed)
    }

    /// Number of stored bookmarks
    pub async fn count(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookmarks")
            .fetch_one(self.pool)
            .await?;

        Ok(row.0 as u64)
    }
}

#[async_trait]
impl<'a> BookmarkStore for BookmarkRepository<'a> {
    async fn get_all(&self) -> std::result::Result<BookmarksData, SyncError> {
        self.list().await
    }

    async fn upsert(&self, records: &BookmarksData) -> std::result::Result<(), SyncError> {
        self.save_all(records).await
    }

    async fn delete(&self, urls: &[String]) -> std::result::Result<(), SyncError> {
        self.remove_all(urls).await.map(|_| ())
    }
}

#[derive(sqlx::FromRow)]
struct BookmarkRow {
    url: String,
    tags_json: String,
    meta_json: String,
    deleted_meta_json: Option<String>,
}

impl BookmarkRow {
    fn into_record(self) -> Result<(String, BookmarkRecord)> {
        let deleted_meta = self
            .deleted_meta_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        let record = BookmarkRecord {
            tags: serde_json::from_str(&self.tags_json)?,
            meta: serde_json::from_str(&self.meta_json)?,
            deleted_meta,
        };

        Ok((self.url, record))
    }
}
