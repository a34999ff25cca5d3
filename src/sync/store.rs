//! Sync state persistence
//!
//! SQLite storage for remote collections and per-target sync bookkeeping.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use super::error::{Result, SyncError};
use super::traits::SyncTransport;
use super::types::{BookmarksData, RemoteMeta, RemoteSnapshot, SyncReport, SyncStatus, Timestamp};

/// Repository for per-target sync state
pub struct SyncRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SyncRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Time of the last successful sync with `target`
    pub async fn last_sync_time(&self, target: &str) -> Result<Option<Timestamp>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT last_sync FROM sync_state WHERE target = ?")
            .bind(target)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|(t,)| t))
    }

    /// Record a finished sync cycle
    pub async fn record_sync(&self, report: &SyncReport) -> Result<()> {
        let report_json = serde_json::to_string(report)?;

        sqlx::query(
            r#"
            INSERT INTO sync_state (target, last_sync, last_report)
            VALUES (?, ?, ?)
            ON CONFLICT(target) DO UPDATE SET
                last_sync = excluded.last_sync,
                last_report = excluded.last_report
            "#,
        )
        .bind(&report.target)
        .bind(report.sync_time)
        .bind(&report_json)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Get sync status for a target
    pub async fn get_status(&self, target: &str) -> Result<SyncStatus> {
        let row: Option<SyncStateRow> = sqlx::query_as(
            r#"
            SELECT last_sync, last_report
            FROM sync_state
            WHERE target = ?
            "#,
        )
        .bind(target)
        .fetch_optional(self.pool)
        .await?;

        Ok(match row {
            Some(r) => SyncStatus {
                target: target.to_string(),
                last_sync: Some(r.last_sync),
                last_report: r
                    .last_report
                    .as_deref()
                    .map(serde_json::from_str)
                    .transpose()?,
                in_progress: false,
            },
            None => SyncStatus {
                target: target.to_string(),
                ..Default::default()
            },
        })
    }

    /// Forget the sync history of a target, so the next sync starts fresh
    pub async fn reset(&self, target: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sync_state WHERE target = ?")
            .bind(target)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct SyncStateRow {
    last_sync: i64,
    last_report: Option<String>,
}

/// A remote collection stored in this server's database
///
/// Uploads use optimistic concurrency: the caller passes the meta it
/// downloaded and the upload is rejected if the stored version moved on.
pub struct RemoteCollectionRepository<'a> {
    pool: &'a SqlitePool,
    target: String,
}

impl<'a> RemoteCollectionRepository<'a> {
    pub fn new(pool: &'a SqlitePool, target: &str) -> Self {
        Self {
            pool,
            target: target.to_string(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    async fn current_meta<'e, E>(&self, executor: E) -> Result<Option<RemoteMeta>>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let row: Option<(i64, i64)> = sqlx::query_as(
            "SELECT version, updated_at FROM remote_collections WHERE target = ?",
        )
        .bind(&self.target)
        .fetch_optional(executor)
        .await?;

        Ok(row.map(|(version, updated_at)| RemoteMeta {
            version: version as u64,
            updated_at,
        }))
    }
}

#[async_trait]
impl<'a> SyncTransport for RemoteCollectionRepository<'a> {
    async fn download(&self) -> std::result::Result<RemoteSnapshot, SyncError> {
        let row: Option<RemoteCollectionRow> = sqlx::query_as(
            r#"
            SELECT data_json, version, updated_at
            FROM remote_collections
            WHERE target = ?
            "#,
        )
        .bind(&self.target)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(RemoteSnapshot {
                data: serde_json::from_str(&r.data_json)?,
                meta: Some(RemoteMeta {
                    version: r.version as u64,
                    updated_at: r.updated_at,
                }),
            }),
            None => Ok(RemoteSnapshot::default()),
        }
    }

    async fn upload(
        &self,
        data: &BookmarksData,
        expected: Option<&RemoteMeta>,
    ) -> std::result::Result<RemoteMeta, SyncError> {
        let data_json = serde_json::to_string(data)?;

        let mut tx = self.pool.begin().await?;
        let actual = self.current_meta(&mut *tx).await?;
        if actual.as_ref() != expected {
            tracing::warn!(
                remote = %self.target,
                ?expected,
                ?actual,
                "Rejected upload of stale remote collection"
            );
            return Err(SyncError::RemoteConflict {
                expected: expected.copied(),
                actual,
            });
        }

        let meta = RemoteMeta {
            version: actual.map(|m| m.version + 1).unwrap_or(1),
            updated_at: Utc::now().timestamp_millis(),
        };

        sqlx::query(
            r#"
            INSERT INTO remote_collections (target, data_json, version, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(target) DO UPDATE SET
                data_json = excluded.data_json,
                version = excluded.version,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.target)
        .bind(&data_json)
        .bind(meta.version as i64)
        .bind(meta.updated_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::debug!(
            remote = %self.target,
            version = meta.version,
            bookmarks = data.len(),
            "Stored remote collection"
        );

        Ok(meta)
    }
}

#[derive(sqlx::FromRow)]
struct RemoteCollectionRow {
    data_json: String,
    version: i64,
    updated_at: i64,
}
