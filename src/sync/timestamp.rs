//! Timestamp normalization
//!
//! Repairs missing or invalid `created`/`updated` pairs so that every record
//! entering a merge satisfies `created <= updated`.

use super::types::{BookmarkMeta, BookmarkRecord, Timestamp};

/// Fallback used when neither the record nor the strategy has a usable date
pub const DEFAULT_DATE: Timestamp = 1_700_000_000_000;

/// A timestamp is valid iff it is strictly positive
pub fn is_valid_timestamp(timestamp: Timestamp) -> bool {
    timestamp > 0
}

/// The configured default date, or [`DEFAULT_DATE`] if it is invalid
pub fn resolve_default_date(default_date: Timestamp) -> Timestamp {
    if is_valid_timestamp(default_date) {
        default_date
    } else {
        DEFAULT_DATE
    }
}

/// Normalize a `(created, updated)` pair
pub fn normalize_timestamps(
    created: Timestamp,
    updated: Timestamp,
    default_date: Timestamp,
) -> (Timestamp, Timestamp) {
    match (is_valid_timestamp(created), is_valid_timestamp(updated)) {
        (false, false) => {
            let fallback = resolve_default_date(default_date);
            (fallback, fallback)
        }
        (false, true) => (updated, updated),
        (true, false) => (created, created),
        (true, true) => (created.min(updated), updated),
    }
}

pub fn normalize_meta(meta: &BookmarkMeta, default_date: Timestamp) -> BookmarkMeta {
    let (created, updated) = normalize_timestamps(meta.created, meta.updated, default_date);
    BookmarkMeta {
        created,
        updated,
        ..meta.clone()
    }
}

/// Copy of `record` with normalized timestamps
pub fn normalize_record(record: &BookmarkRecord, default_date: Timestamp) -> BookmarkRecord {
    BookmarkRecord {
        tags: record.tags.clone(),
        meta: normalize_meta(&record.meta, default_date),
        deleted_meta: record.deleted_meta.clone(),
    }
}
