//! Sync data types
//!
//! Defines types for two-way bookmark synchronization including:
//! - Bookmark records with tags, metadata and tombstones
//! - Merge strategies and sync windows
//! - Merge results and remote collection metadata

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Reserved tag marking a soft-deleted bookmark
pub const DELETED_BOOKMARK_TAG: &str = "._DELETED_";

/// Bookmark collection keyed by absolute URL
pub type BookmarksData = BTreeMap<String, BookmarkRecord>;

/// A single bookmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    /// Tags in insertion order
    #[serde(default)]
    pub tags: Vec<String>,
    /// Timestamps, title and arbitrary extra fields
    pub meta: BookmarkMeta,
    /// Present iff `tags` contains [`DELETED_BOOKMARK_TAG`]
    #[serde(rename = "deletedMeta", default, skip_serializing_if = "Option::is_none")]
    pub deleted_meta: Option<DeletedMeta>,
}

impl BookmarkRecord {
    /// Create a new record with both timestamps set to `now`
    pub fn new(tags: Vec<String>, now: Timestamp) -> Self {
        Self {
            tags,
            meta: BookmarkMeta::new(now, now),
            deleted_meta: None,
        }
    }

    /// Whether the record carries the tombstone tag
    pub fn is_deleted(&self) -> bool {
        self.tags.iter().any(|tag| tag == DELETED_BOOKMARK_TAG)
    }

    /// Soft-delete: add the tombstone tag and deletion metadata
    pub fn mark_deleted(&mut self, action_type: DeleteActionType, now: Timestamp) {
        if !self.is_deleted() {
            self.tags.push(DELETED_BOOKMARK_TAG.to_string());
        }
        self.deleted_meta = Some(DeletedMeta {
            deleted: now,
            action_type,
        });
        self.meta.updated2 = Some(now);
    }

    /// Undo a soft-delete
    pub fn restore(&mut self, now: Timestamp) {
        self.tags.retain(|tag| tag != DELETED_BOOKMARK_TAG);
        self.deleted_meta = None;
        self.meta.updated2 = Some(now);
    }

    /// Structural equality ignoring the `updated3` logical clock
    pub fn content_eq(&self, other: &BookmarkRecord) -> bool {
        self.tags == other.tags
            && self.deleted_meta == other.deleted_meta
            && self.meta.content_eq(&other.meta)
    }
}

/// Bookmark metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkMeta {
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created: Timestamp,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated: Timestamp,
    /// Set by tag edits, may be newer than `updated`
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional_timestamp"
    )]
    pub updated2: Option<Timestamp>,
    /// Logical clock set by merges
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional_timestamp"
    )]
    pub updated3: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Fields this server does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BookmarkMeta {
    pub fn new(created: Timestamp, updated: Timestamp) -> Self {
        Self {
            created,
            updated,
            updated2: None,
            updated3: None,
            title: None,
            extra: Map::new(),
        }
    }

    /// Overlay `newer` on top of `self`: shared fields take the newer value,
    /// fields only present here survive
    pub fn overlay(&self, newer: &BookmarkMeta) -> BookmarkMeta {
        let mut extra = self.extra.clone();
        for (key, value) in &newer.extra {
            extra.insert(key.clone(), value.clone());
        }

        BookmarkMeta {
            created: newer.created,
            updated: newer.updated,
            updated2: newer.updated2.or(self.updated2),
            updated3: newer.updated3.or(self.updated3),
            title: newer.title.clone().or_else(|| self.title.clone()),
            extra,
        }
    }

    fn content_eq(&self, other: &BookmarkMeta) -> bool {
        self.created == other.created
            && self.updated == other.updated
            && self.updated2 == other.updated2
            && self.title == other.title
            && self.extra == other.extra
    }
}

/// Deletion metadata attached to a tombstone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedMeta {
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub deleted: Timestamp,
    #[serde(rename = "actionType")]
    pub action_type: DeleteActionType,
}

/// What caused a deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeleteActionType {
    Delete,
    BatchDelete,
    Import,
    Sync,
    #[serde(other)]
    Unknown,
}

/// How to resolve bookmark metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum MetaStrategy {
    /// Keep the local metadata
    Local,
    /// Keep the remote metadata
    Remote,
    /// Keep the metadata of the most recently updated side
    Newer,
    /// Overlay the newer side on the older one
    #[default]
    Merge,
}

impl MetaStrategy {
    /// Parse a strategy name, falling back to [`MetaStrategy::Merge`]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "local" => Self::Local,
            "remote" => Self::Remote,
            "newer" => Self::Newer,
            _ => Self::Merge,
        }
    }
}

impl From<Option<String>> for MetaStrategy {
    fn from(name: Option<String>) -> Self {
        name.as_deref().map(Self::from_name).unwrap_or_default()
    }
}

/// How to resolve bookmark tags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum TagStrategy {
    /// Keep the local tags
    Local,
    /// Keep the remote tags
    Remote,
    /// Keep the tags of the most recently updated side
    Newer,
    /// Local tags followed by unseen remote tags
    #[default]
    Union,
}

impl TagStrategy {
    /// Parse a strategy name, falling back to [`TagStrategy::Union`]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "local" => Self::Local,
            "remote" => Self::Remote,
            "newer" => Self::Newer,
            _ => Self::Union,
        }
    }
}

impl From<Option<String>> for TagStrategy {
    fn from(name: Option<String>) -> Self {
        name.as_deref().map(Self::from_name).unwrap_or_default()
    }
}

/// Per-field merge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStrategy {
    #[serde(default)]
    pub meta: MetaStrategy,
    #[serde(default)]
    pub tags: TagStrategy,
    /// Fallback for records with no valid timestamp at all
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub default_date: Timestamp,
    #[serde(default = "default_true")]
    pub prefer_oldest_created: bool,
    #[serde(default = "default_true")]
    pub prefer_newest_updated: bool,
}

impl Default for MergeStrategy {
    fn default() -> Self {
        Self {
            meta: MetaStrategy::default(),
            tags: TagStrategy::default(),
            default_date: 0,
            prefer_oldest_created: true,
            prefer_newest_updated: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// The sync window a merge runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOption {
    pub current_sync_time: Timestamp,
    pub last_sync_time: Timestamp,
}

/// Deltas and converged snapshots produced by a merge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResult {
    pub updates_for_local: BookmarksData,
    pub updates_for_remote: BookmarksData,
    pub local_deletions: Vec<String>,
    pub remote_deletions: Vec<String>,
    pub final_local_data: BookmarksData,
    pub final_remote_data: BookmarksData,
}

impl MergeResult {
    /// Whether applying this result changes the local replica
    pub fn local_changed(&self) -> bool {
        !self.updates_for_local.is_empty() || !self.local_deletions.is_empty()
    }

    /// Whether applying this result changes the remote replica
    pub fn remote_changed(&self) -> bool {
        !self.updates_for_remote.is_empty() || !self.remote_deletions.is_empty()
    }
}

/// Version stamp of a stored remote collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMeta {
    pub version: u64,
    pub updated_at: Timestamp,
}

/// A downloaded remote collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteSnapshot {
    pub data: BookmarksData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<RemoteMeta>,
}

/// Outcome of one sync cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub target: String,
    pub sync_time: Timestamp,
    pub local_updates: usize,
    pub local_deletions: usize,
    pub remote_updates: usize,
    pub remote_deletions: usize,
    /// `None` when nothing needed uploading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_meta: Option<RemoteMeta>,
}

/// Sync status for a target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub target: String,
    /// Last successful sync timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<Timestamp>,
    /// Report of the last successful sync
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_report: Option<SyncReport>,
    /// Whether sync is in progress
    pub in_progress: bool,
}

/// Read a timestamp, mapping anything that is not a number to `0` (invalid)
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(timestamp_from_value(&value))
}

fn lenient_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(timestamp_from_value(&other)),
    })
}

fn timestamp_from_value(value: &Value) -> Timestamp {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserialization_keeps_extra_fields() {
        let json = serde_json::json!({
            "tags": ["rust", "sync"],
            "meta": {
                "created": 1_700_000_000_000_i64,
                "updated": 1_700_000_100_000_i64,
                "title": "Example",
                "favicon": "https://example.com/favicon.ico"
            }
        });

        let record: BookmarkRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.tags, vec!["rust", "sync"]);
        assert_eq!(record.meta.title.as_deref(), Some("Example"));
        assert_eq!(
            record.meta.extra.get("favicon"),
            Some(&Value::from("https://example.com/favicon.ico"))
        );
        assert!(record.deleted_meta.is_none());

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["meta"]["favicon"], "https://example.com/favicon.ico");
        assert!(back.get("deletedMeta").is_none());
        assert!(back["meta"].get("updated3").is_none());
    }

    #[test]
    fn test_invalid_timestamps_read_as_zero() {
        let json = serde_json::json!({
            "tags": [],
            "meta": { "created": "yesterday", "updated": null, "updated2": 12.9 }
        });

        let record: BookmarkRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.meta.created, 0);
        assert_eq!(record.meta.updated, 0);
        assert_eq!(record.meta.updated2, Some(12));
        assert_eq!(record.meta.updated3, None);
    }

    #[test]
    fn test_strategy_falls_back_on_unknown_values() {
        let strategy: MergeStrategy =
            serde_json::from_value(serde_json::json!({ "meta": "", "tags": "bogus" })).unwrap();
        assert_eq!(strategy.meta, MetaStrategy::Merge);
        assert_eq!(strategy.tags, TagStrategy::Union);
        assert!(strategy.prefer_oldest_created);
        assert!(strategy.prefer_newest_updated);

        let strategy: MergeStrategy = serde_json::from_value(serde_json::json!({
            "meta": "newer",
            "tags": "REMOTE",
            "defaultDate": 42,
            "preferOldestCreated": false
        }))
        .unwrap();
        assert_eq!(strategy.meta, MetaStrategy::Newer);
        assert_eq!(strategy.tags, TagStrategy::Remote);
        assert_eq!(strategy.default_date, 42);
        assert!(!strategy.prefer_oldest_created);
    }

    #[test]
    fn test_mark_deleted_and_restore() {
        let mut record = BookmarkRecord::new(vec!["news".to_string()], 100);

        record.mark_deleted(DeleteActionType::Delete, 200);
        assert!(record.is_deleted());
        assert_eq!(record.tags, vec!["news", DELETED_BOOKMARK_TAG]);
        assert_eq!(record.deleted_meta.as_ref().unwrap().deleted, 200);
        assert_eq!(record.meta.updated2, Some(200));

        // Deleting twice does not duplicate the tag
        record.mark_deleted(DeleteActionType::Sync, 300);
        assert_eq!(record.tags.len(), 2);

        record.restore(400);
        assert!(!record.is_deleted());
        assert!(record.deleted_meta.is_none());
        assert_eq!(record.tags, vec!["news"]);
    }

    #[test]
    fn test_content_eq_ignores_logical_clock() {
        let a = BookmarkRecord::new(vec!["a".to_string()], 100);
        let mut b = a.clone();
        b.meta.updated3 = Some(500);
        assert!(a.content_eq(&b));

        b.meta.title = Some("changed".to_string());
        assert!(!a.content_eq(&b));
    }

    #[test]
    fn test_unknown_action_type() {
        let meta: DeletedMeta =
            serde_json::from_value(serde_json::json!({ "deleted": 5, "actionType": "MERGE" }))
                .unwrap();
        assert_eq!(meta.action_type, DeleteActionType::Unknown);

        let meta: DeletedMeta = serde_json::from_value(
            serde_json::json!({ "deleted": 5, "actionType": "BATCH_DELETE" }),
        )
        .unwrap();
        assert_eq!(meta.action_type, DeleteActionType::BatchDelete);
    }
}
