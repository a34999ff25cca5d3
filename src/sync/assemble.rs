//! Assembly of merge results

use super::types::{BookmarksData, MergeResult};

/// Deltas collected while merging, before snapshots are built
#[derive(Debug, Default)]
pub struct MergeDeltas {
    pub updates_for_local: BookmarksData,
    pub updates_for_remote: BookmarksData,
    pub local_deletions: Vec<String>,
    pub remote_deletions: Vec<String>,
}

/// Apply upserts and deletions to a copy of `data`
pub fn apply_changes(
    data: &BookmarksData,
    updates: &BookmarksData,
    deletions: &[String],
) -> BookmarksData {
    let mut result = data.clone();
    for (url, record) in updates {
        result.insert(url.clone(), record.clone());
    }
    for url in deletions {
        result.remove(url);
    }
    result
}

/// Build the final result, including converged snapshots of both replicas
pub fn assemble(local: &BookmarksData, remote: &BookmarksData, deltas: MergeDeltas) -> MergeResult {
    let final_local_data = apply_changes(local, &deltas.updates_for_local, &deltas.local_deletions);
    let final_remote_data =
        apply_changes(remote, &deltas.updates_for_remote, &deltas.remote_deletions);

    MergeResult {
        updates_for_local: deltas.updates_for_local,
        updates_for_remote: deltas.updates_for_remote,
        local_deletions: deltas.local_deletions,
        remote_deletions: deltas.remote_deletions,
        final_local_data,
        final_remote_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::types::BookmarkRecord;

    #[test]
    fn test_apply_changes() {
        let mut data = BookmarksData::new();
        data.insert("https://a.example/".to_string(), BookmarkRecord::new(vec![], 1));
        data.insert("https://b.example/".to_string(), BookmarkRecord::new(vec![], 1));

        let mut updates = BookmarksData::new();
        updates.insert(
            "https://a.example/".to_string(),
            BookmarkRecord::new(vec!["new".to_string()], 2),
        );
        updates.insert("https://c.example/".to_string(), BookmarkRecord::new(vec![], 2));

        let result = apply_changes(&data, &updates, &["https://b.example/".to_string()]);
        assert_eq!(result.len(), 2);
        assert_eq!(result["https://a.example/"].tags, vec!["new"]);
        assert!(result.contains_key("https://c.example/"));
        assert!(!result.contains_key("https://b.example/"));
        // Input untouched
        assert_eq!(data.len(), 2);
    }
}
