//! Deletion metadata for merged records

use super::conflict::{ResolvedTags, Side};
use super::types::{BookmarkRecord, DeletedMeta, DELETED_BOOKMARK_TAG};

/// Derive `deletedMeta` for a merged record from its resolved tags
///
/// Lookup order: the side the tag strategy picked, the side the meta strategy
/// picked, then the remaining side. Tags without the tombstone tag mean the
/// bookmark was restored, so no deletion metadata is kept.
pub fn reconcile_tombstone(
    tags: &ResolvedTags,
    meta_side: Side,
    local: &BookmarkRecord,
    remote: &BookmarkRecord,
) -> Option<DeletedMeta> {
    if !tags.tags.iter().any(|tag| tag == DELETED_BOOKMARK_TAG) {
        return None;
    }

    tags.side
        .into_iter()
        .chain([meta_side, meta_side.other()])
        .find_map(|side| side.pick(local, remote).deleted_meta.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::conflict::resolve_record;
    use crate::sync::types::{
        DeleteActionType, MergeStrategy, MetaStrategy, SyncOption, TagStrategy, Timestamp,
    };

    const T: Timestamp = 1_710_000_000_000;

    fn deleted(updated: Timestamp, deleted_at: Timestamp) -> BookmarkRecord {
        let mut record = BookmarkRecord::new(vec!["a".to_string()], updated);
        record.tags.push(DELETED_BOOKMARK_TAG.to_string());
        record.deleted_meta = Some(DeletedMeta {
            deleted: deleted_at,
            action_type: DeleteActionType::Delete,
        });
        record
    }

    fn window() -> SyncOption {
        SyncOption {
            current_sync_time: T + 1_000,
            last_sync_time: T - 1_000,
        }
    }

    #[test]
    fn test_union_of_two_tombstones_follows_newer_side() {
        let local = deleted(T, T - 5);
        let remote = deleted(T + 10, T - 50);

        let merged = resolve_record(&local, &remote, &MergeStrategy::default(), &window());
        assert_eq!(merged.deleted_meta.unwrap().deleted, T - 50);

        let local = deleted(T + 20, T - 5);
        let merged = resolve_record(&local, &remote, &MergeStrategy::default(), &window());
        assert_eq!(merged.deleted_meta.unwrap().deleted, T - 5);
    }

    #[test]
    fn test_union_takes_tombstone_from_deleting_side() {
        // Local is newer but only remote deleted the bookmark
        let local = BookmarkRecord::new(vec!["a".to_string()], T + 20);
        let remote = deleted(T, T - 5);

        let merged = resolve_record(&local, &remote, &MergeStrategy::default(), &window());
        assert!(merged.is_deleted());
        assert_eq!(merged.deleted_meta.unwrap().deleted, T - 5);
    }

    #[test]
    fn test_falls_back_to_the_remaining_side() {
        // Neither the tag union nor the local meta side carries deletedMeta
        let local = BookmarkRecord::new(vec!["a".to_string()], T + 20);
        let remote = deleted(T + 30, T - 5);
        let strategy = MergeStrategy {
            meta: MetaStrategy::Local,
            tags: TagStrategy::Union,
            ..Default::default()
        };

        let merged = resolve_record(&local, &remote, &strategy, &window());
        assert!(merged.is_deleted());
        assert_eq!(merged.deleted_meta.unwrap().deleted, T - 5);
    }

    #[test]
    fn test_tag_strategy_side_wins() {
        let local = deleted(T + 20, T - 5);
        let remote = deleted(T, T - 50);
        let strategy = MergeStrategy {
            meta: MetaStrategy::Newer,
            tags: TagStrategy::Remote,
            ..Default::default()
        };

        let merged = resolve_record(&local, &remote, &strategy, &window());
        assert_eq!(merged.deleted_meta.unwrap().deleted, T - 50);
    }

    #[test]
    fn test_restored_tags_drop_tombstone() {
        let local = BookmarkRecord::new(vec!["a".to_string()], T + 20);
        let remote = deleted(T, T - 5);
        let strategy = MergeStrategy {
            tags: TagStrategy::Newer,
            ..Default::default()
        };

        let merged = resolve_record(&local, &remote, &strategy, &window());
        assert!(!merged.is_deleted());
        assert!(merged.deleted_meta.is_none());
    }

    #[test]
    fn test_tag_without_any_deleted_meta() {
        let mut local = BookmarkRecord::new(vec![DELETED_BOOKMARK_TAG.to_string()], T);
        local.deleted_meta = None;
        let remote = BookmarkRecord::new(vec![DELETED_BOOKMARK_TAG.to_string()], T + 1);

        let merged = resolve_record(&local, &remote, &MergeStrategy::default(), &window());
        assert!(merged.is_deleted());
        assert!(merged.deleted_meta.is_none());
    }
}
