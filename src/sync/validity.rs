//! Change detection relative to the last successful sync

use super::types::{BookmarkMeta, SyncOption, Timestamp};

/// Most recent of `updated`, `updated2` and `updated3`
pub fn effective_updated(meta: &BookmarkMeta) -> Timestamp {
    let updated = meta.updated;
    updated
        .max(meta.updated2.unwrap_or(updated))
        .max(meta.updated3.unwrap_or(Timestamp::MIN))
}

/// Whether a (normalized) record changed after the last sync
pub fn is_changed_since_sync(meta: &BookmarkMeta, sync_option: &SyncOption) -> bool {
    effective_updated(meta) > sync_option.last_sync_time
}

/// Logical clock for a merged record
///
/// A key seen on one side only is stamped with the sync time; a key merged
/// from both sides gets a value newer than anything either side has seen.
pub fn logical_clock(
    local_effective: Option<Timestamp>,
    remote_effective: Option<Timestamp>,
    sync_option: &SyncOption,
) -> Timestamp {
    match (local_effective, remote_effective) {
        (Some(local), Some(remote)) => local.max(remote).saturating_add(1),
        _ => sync_option.current_sync_time,
    }
}
