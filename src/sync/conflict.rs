//! Conflict resolution for bookmarks present on both replicas
//!
//! Metadata and tags are resolved independently, each with its own strategy.
//! Every resolver reports which side it picked so the tombstone can follow
//! the same decision.

use super::tombstone::reconcile_tombstone;
use super::types::{
    BookmarkMeta, BookmarkRecord, MergeStrategy, MetaStrategy, SyncOption, TagStrategy,
    Timestamp,
};
use super::validity::{effective_updated, logical_clock};

/// Which replica a resolver picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

impl Side {
    /// The more recently updated side; ties go to local
    pub fn newer(local_effective: Timestamp, remote_effective: Timestamp) -> Self {
        if local_effective >= remote_effective {
            Side::Local
        } else {
            Side::Remote
        }
    }

    pub fn other(self) -> Self {
        match self {
            Side::Local => Side::Remote,
            Side::Remote => Side::Local,
        }
    }

    pub fn pick<'a, T>(self, local: &'a T, remote: &'a T) -> &'a T {
        match self {
            Side::Local => local,
            Side::Remote => remote,
        }
    }
}

/// Merged metadata and the side it was based on
#[derive(Debug, Clone)]
pub struct ResolvedMeta {
    pub meta: BookmarkMeta,
    pub side: Side,
}

/// Merged tags and the side they came from (`None` for a union)
#[derive(Debug, Clone)]
pub struct ResolvedTags {
    pub tags: Vec<String>,
    pub side: Option<Side>,
}

/// Resolve metadata of two normalized records
pub fn resolve_meta(
    local: &BookmarkMeta,
    remote: &BookmarkMeta,
    strategy: &MergeStrategy,
    sync_option: &SyncOption,
) -> ResolvedMeta {
    let local_effective = effective_updated(local);
    let remote_effective = effective_updated(remote);
    let newer = Side::newer(local_effective, remote_effective);

    let (mut meta, side) = match strategy.meta {
        MetaStrategy::Local => (local.clone(), Side::Local),
        MetaStrategy::Remote => (remote.clone(), Side::Remote),
        MetaStrategy::Newer => (newer.pick(local, remote).clone(), newer),
        MetaStrategy::Merge => {
            let older = newer.other().pick(local, remote);
            (older.overlay(newer.pick(local, remote)), newer)
        }
    };

    let selected = side.pick(local, remote);

    meta.created = if strategy.prefer_oldest_created {
        local.created.min(remote.created)
    } else {
        selected.created
    };

    meta.updated = if strategy.prefer_newest_updated {
        local_effective.max(remote_effective)
    } else {
        selected.updated
    };

    meta.updated3 = Some(logical_clock(
        Some(local_effective),
        Some(remote_effective),
        sync_option,
    ));

    ResolvedMeta { meta, side }
}

/// Resolve tags of two normalized records
pub fn resolve_tags(
    local: &BookmarkRecord,
    remote: &BookmarkRecord,
    strategy: TagStrategy,
) -> ResolvedTags {
    match strategy {
        TagStrategy::Local => ResolvedTags {
            tags: local.tags.clone(),
            side: Some(Side::Local),
        },
        TagStrategy::Remote => ResolvedTags {
            tags: remote.tags.clone(),
            side: Some(Side::Remote),
        },
        TagStrategy::Newer => {
            let side = Side::newer(effective_updated(&local.meta), effective_updated(&remote.meta));
            ResolvedTags {
                tags: side.pick(local, remote).tags.clone(),
                side: Some(side),
            }
        }
        TagStrategy::Union => ResolvedTags {
            tags: union_tags(&local.tags, &remote.tags),
            side: None,
        },
    }
}

/// Local tags in order, then remote tags not seen yet, without duplicates
pub fn union_tags(local: &[String], remote: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(local.len() + remote.len());
    for tag in local.iter().chain(remote) {
        if !merged.contains(tag) {
            merged.push(tag.clone());
        }
    }
    merged
}

/// Resolve a bookmark present on both replicas
///
/// Both records must already be normalized.
pub fn resolve_record(
    local: &BookmarkRecord,
    remote: &BookmarkRecord,
    strategy: &MergeStrategy,
    sync_option: &SyncOption,
) -> BookmarkRecord {
    let meta = resolve_meta(&local.meta, &remote.meta, strategy, sync_option);
    let tags = resolve_tags(local, remote, strategy.tags);
    let deleted_meta = reconcile_tombstone(&tags, meta.side, local, remote);

    BookmarkRecord {
        tags: tags.tags,
        meta: meta.meta,
        deleted_meta,
    }
}
