//! Two-way merge of bookmark collections
//!
//! Every URL of either replica falls into one of these cases:
//!
//! | local | remote | outcome                                                    |
//! |-------|--------|------------------------------------------------------------|
//! | new   | -      | upload to remote, stamped with the sync time               |
//! | stale | -      | remote deleted it since the last sync: delete locally      |
//! | -     | new    | download to local, stamped with the sync time              |
//! | -     | stale  | local deleted it since the last sync: delete remotely      |
//! | stale | stale  | left alone on both sides                                   |
//! | either new     || resolve both records, write to the sides that differ   |
//!
//! A one-sided record whose timestamps had to be repaired is also written
//! back to its own side, so both replicas hold the same repaired copy.
//!
//! "new" means the effective update time is after `last_sync_time`.
//! Keys that are not absolute http(s) URLs are skipped with a warning.

use std::collections::BTreeSet;

use super::assemble::{assemble, MergeDeltas};
use super::conflict::resolve_record;
use super::error::MergeError;
use super::timestamp::{normalize_record, resolve_default_date};
use super::types::{
    BookmarkRecord, BookmarksData, MergeResult, MergeStrategy, SyncOption, Timestamp,
};
use super::validate::check_bookmark_url;
use super::validity::{effective_updated, is_changed_since_sync, logical_clock};

/// Number of keys merged between scheduler yields in [`merge_async`]
pub const MERGE_YIELD_INTERVAL: usize = 500;

/// Merge two replicas
///
/// `None` for either collection is treated as empty. A missing strategy is a
/// caller error.
pub fn merge(
    local: Option<&BookmarksData>,
    remote: Option<&BookmarksData>,
    strategy: Option<&MergeStrategy>,
    sync_option: &SyncOption,
) -> Result<MergeResult, MergeError> {
    let strategy = strategy.ok_or(MergeError::MissingStrategy)?;
    let empty = BookmarksData::new();
    let local = local.unwrap_or(&empty);
    let remote = remote.unwrap_or(&empty);

    let merger = Merger::new(strategy, sync_option);
    let mut deltas = MergeDeltas::default();
    for url in union_keys(local, remote) {
        merger.merge_key(url, local.get(url), remote.get(url), &mut deltas);
    }

    Ok(finish(local, remote, deltas))
}

/// Async variant of [`merge`] that yields between keys on large collections
pub async fn merge_async(
    local: Option<&BookmarksData>,
    remote: Option<&BookmarksData>,
    strategy: Option<&MergeStrategy>,
    sync_option: &SyncOption,
) -> Result<MergeResult, MergeError> {
    let strategy = strategy.ok_or(MergeError::MissingStrategy)?;
    let empty = BookmarksData::new();
    let local = local.unwrap_or(&empty);
    let remote = remote.unwrap_or(&empty);

    let merger = Merger::new(strategy, sync_option);
    let mut deltas = MergeDeltas::default();
    for (index, url) in union_keys(local, remote).into_iter().enumerate() {
        if index > 0 && index % MERGE_YIELD_INTERVAL == 0 {
            tokio::task::yield_now().await;
        }
        merger.merge_key(url, local.get(url), remote.get(url), &mut deltas);
    }

    Ok(finish(local, remote, deltas))
}

fn union_keys<'a>(local: &'a BookmarksData, remote: &'a BookmarksData) -> BTreeSet<&'a String> {
    local.keys().chain(remote.keys()).collect()
}

fn finish(local: &BookmarksData, remote: &BookmarksData, deltas: MergeDeltas) -> MergeResult {
    let result = assemble(local, remote, deltas);
    tracing::debug!(
        local = local.len(),
        remote = remote.len(),
        updates_for_local = result.updates_for_local.len(),
        updates_for_remote = result.updates_for_remote.len(),
        local_deletions = result.local_deletions.len(),
        remote_deletions = result.remote_deletions.len(),
        "Merged bookmark collections"
    );
    result
}

/// Per-call merge context
struct Merger<'a> {
    strategy: &'a MergeStrategy,
    sync_option: &'a SyncOption,
    default_date: Timestamp,
}

impl<'a> Merger<'a> {
    fn new(strategy: &'a MergeStrategy, sync_option: &'a SyncOption) -> Self {
        Self {
            strategy,
            sync_option,
            default_date: resolve_default_date(strategy.default_date),
        }
    }

    /// Decide one key; never leaves `deltas` half-updated for that key
    fn merge_key(
        &self,
        url: &str,
        local: Option<&BookmarkRecord>,
        remote: Option<&BookmarkRecord>,
        deltas: &mut MergeDeltas,
    ) {
        if !check_bookmark_url(url) {
            return;
        }

        match (local, remote) {
            (Some(local), None) => match self.one_sided(local) {
                Some(record) => {
                    // Repaired timestamps go back to the side they came from
                    if !local.content_eq(&record) {
                        deltas
                            .updates_for_local
                            .insert(url.to_string(), record.clone());
                    }
                    deltas.updates_for_remote.insert(url.to_string(), record);
                }
                None => deltas.local_deletions.push(url.to_string()),
            },
            (None, Some(remote)) => match self.one_sided(remote) {
                Some(record) => {
                    if !remote.content_eq(&record) {
                        deltas
                            .updates_for_remote
                            .insert(url.to_string(), record.clone());
                    }
                    deltas.updates_for_local.insert(url.to_string(), record);
                }
                None => deltas.remote_deletions.push(url.to_string()),
            },
            (Some(local), Some(remote)) => {
                let normalized_local = normalize_record(local, self.default_date);
                let normalized_remote = normalize_record(remote, self.default_date);

                if !is_changed_since_sync(&normalized_local.meta, self.sync_option)
                    && !is_changed_since_sync(&normalized_remote.meta, self.sync_option)
                {
                    // Untouched on both sides since the last sync
                    tracing::trace!(url, "Skipping bookmark stale on both sides");
                    return;
                }

                let merged = resolve_record(
                    &normalized_local,
                    &normalized_remote,
                    self.strategy,
                    self.sync_option,
                );

                // Raising `updated` to a record's own effective time is not a change
                if self.settled_eq(local, &merged) && self.settled_eq(remote, &merged) {
                    return;
                }

                if !local.content_eq(&merged) {
                    deltas
                        .updates_for_local
                        .insert(url.to_string(), merged.clone());
                }
                if !remote.content_eq(&merged) {
                    deltas.updates_for_remote.insert(url.to_string(), merged);
                }
            }
            (None, None) => {}
        }
    }

    /// Whether `merged` only differs from `stored` by the `updated3` clock and,
    /// with `prefer_newest_updated`, by `updated` catching up with the stored
    /// record's effective update time
    fn settled_eq(&self, stored: &BookmarkRecord, merged: &BookmarkRecord) -> bool {
        if !self.strategy.prefer_newest_updated {
            return stored.content_eq(merged);
        }

        let mut settled = stored.clone();
        settled.meta.updated = effective_updated(&stored.meta);
        settled.content_eq(merged)
    }

    /// A key present on one side only: the record to copy over, or `None`
    /// if it is stale and should be deleted instead
    fn one_sided(&self, record: &BookmarkRecord) -> Option<BookmarkRecord> {
        let mut normalized = normalize_record(record, self.default_date);
        if !is_changed_since_sync(&normalized.meta, self.sync_option) {
            return None;
        }

        normalized.meta.updated3 = Some(logical_clock(
            Some(effective_updated(&normalized.meta)),
            None,
            self.sync_option,
        ));
        Some(normalized)
    }
}
