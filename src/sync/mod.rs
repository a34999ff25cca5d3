//! Sync module for two-way bookmark synchronization
//!
//! Provides:
//! - A pure merge engine for two bookmark replicas
//! - Remote collections with optimistic-concurrency uploads
//! - Sync cycles between the local store and a remote target
//!
//! # Sync Protocol
//!
//! 1. Read the local collection and download the remote one
//! 2. Merge both against the time of the last successful sync
//! 3. Upload the merged remote snapshot, rejected if the remote moved on
//! 4. Apply local updates and deletions
//! 5. Remember the sync time for the next cycle
//!
//! # Conflict Resolution
//!
//! - Metadata: local, remote, newer, or newer overlaid on older (default)
//! - Tags: local, remote, newer, or union (default)
//! - Deletions are tombstones: a reserved tag plus `deletedMeta`
//! - A record untouched since the last sync that is missing on the other
//!   side was deleted there

mod assemble;
mod conflict;
mod error;
mod manager;
mod merge;
mod store;
mod timestamp;
mod tombstone;
mod traits;
mod types;
mod validate;
mod validity;

pub use assemble::apply_changes;
pub use conflict::{resolve_meta, resolve_record, resolve_tags, union_tags, Side};
pub use error::{MergeError, Result, SyncError};
pub use manager::SyncManager;
pub use merge::{merge, merge_async, MERGE_YIELD_INTERVAL};
pub use store::{RemoteCollectionRepository, SyncRepository};
pub use timestamp::{
    is_valid_timestamp, normalize_meta, normalize_record, normalize_timestamps, DEFAULT_DATE,
};
pub use tombstone::reconcile_tombstone;
pub use traits::{BookmarkStore, SyncTransport};
pub use types::{
    BookmarkMeta, BookmarkRecord, BookmarksData, DeleteActionType, DeletedMeta, MergeResult,
    MergeStrategy, MetaStrategy, RemoteMeta, RemoteSnapshot, SyncOption, SyncReport, SyncStatus,
    TagStrategy, Timestamp, DELETED_BOOKMARK_TAG,
};
pub use validate::is_valid_bookmark_url;
pub use validity::{effective_updated, is_changed_since_sync};
