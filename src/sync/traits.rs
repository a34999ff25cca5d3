//! Collaborator interfaces for sync cycles

use async_trait::async_trait;

use super::error::SyncError;
use super::types::{BookmarksData, RemoteMeta, RemoteSnapshot};

/// A replica that stores bookmarks by URL
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Read the whole collection
    async fn get_all(&self) -> Result<BookmarksData, SyncError>;

    /// Insert or replace records
    async fn upsert(&self, records: &BookmarksData) -> Result<(), SyncError>;

    /// Remove records by URL
    async fn delete(&self, urls: &[String]) -> Result<(), SyncError>;
}

/// Where the remote replica lives
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Fetch the remote collection and its version stamp
    async fn download(&self) -> Result<RemoteSnapshot, SyncError>;

    /// Replace the remote collection if it still matches `expected`
    ///
    /// Fails with [`SyncError::RemoteConflict`] when someone else uploaded
    /// in between.
    async fn upload(
        &self,
        data: &BookmarksData,
        expected: Option<&RemoteMeta>,
    ) -> Result<RemoteMeta, SyncError>;
}
