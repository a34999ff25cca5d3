//! Sync cycles between the local store and a remote target
//!
//! A cycle downloads the remote collection, merges it with the local one,
//! uploads the merged remote snapshot and then applies the local deltas.
//! Only one cycle per target may run at a time.

use std::collections::HashSet;

use chrono::Utc;
use parking_lot::Mutex;

use super::error::{Result, SyncError};
use super::merge::merge_async;
use super::store::SyncRepository;
use super::traits::{BookmarkStore, SyncTransport};
use super::types::{MergeStrategy, SyncOption, SyncReport, Timestamp};

/// Runs sync cycles and tracks which targets are busy
#[derive(Default)]
pub struct SyncManager {
    in_flight: Mutex<HashSet<String>>,
}

/// Releases a target when the cycle ends, including on error
struct InFlightGuard<'a> {
    manager: &'a SyncManager,
    target: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.manager.in_flight.lock().remove(&self.target);
    }
}

impl SyncManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a cycle for `target` is running
    pub fn is_in_progress(&self, target: &str) -> bool {
        self.in_flight.lock().contains(target)
    }

    fn claim(&self, target: &str) -> Result<InFlightGuard<'_>> {
        if !self.in_flight.lock().insert(target.to_string()) {
            return Err(SyncError::InProgress(target.to_string()));
        }

        Ok(InFlightGuard {
            manager: self,
            target: target.to_string(),
        })
    }

    /// Run a sync cycle now
    pub async fn sync<S, T>(
        &self,
        target: &str,
        store: &S,
        transport: &T,
        state: &SyncRepository<'_>,
        strategy: &MergeStrategy,
    ) -> Result<SyncReport>
    where
        S: BookmarkStore + ?Sized,
        T: SyncTransport + ?Sized,
    {
        let now = Utc::now().timestamp_millis();
        self.sync_at(target, store, transport, state, strategy, now)
            .await
    }

    /// Run a sync cycle with an explicit sync time
    pub async fn sync_at<S, T>(
        &self,
        target: &str,
        store: &S,
        transport: &T,
        state: &SyncRepository<'_>,
        strategy: &MergeStrategy,
        current_sync_time: Timestamp,
    ) -> Result<SyncReport>
    where
        S: BookmarkStore + ?Sized,
        T: SyncTransport + ?Sized,
    {
        let _guard = self.claim(target)?;

        let local = store.get_all().await?;
        let remote = transport.download().await?;
        let last_sync_time = state.last_sync_time(target).await?.unwrap_or(0);
        let sync_option = SyncOption {
            current_sync_time,
            last_sync_time,
        };

        tracing::info!(
            target_name = %target,
            local = local.len(),
            remote = remote.data.len(),
            last_sync_time,
            "Starting sync"
        );

        let result = merge_async(
            Some(&local),
            Some(&remote.data),
            Some(strategy),
            &sync_option,
        )
        .await?;

        // Upload first: if the remote moved on, local data stays untouched
        let remote_meta = if result.remote_changed() {
            Some(
                transport
                    .upload(&result.final_remote_data, remote.meta.as_ref())
                    .await?,
            )
        } else {
            None
        };

        if !result.updates_for_local.is_empty() {
            store.upsert(&result.updates_for_local).await?;
        }
        if !result.local_deletions.is_empty() {
            store.delete(&result.local_deletions).await?;
        }

        let report = SyncReport {
            target: target.to_string(),
            sync_time: current_sync_time,
            local_updates: result.updates_for_local.len(),
            local_deletions: result.local_deletions.len(),
            remote_updates: result.updates_for_remote.len(),
            remote_deletions: result.remote_deletions.len(),
            remote_meta,
        };
        state.record_sync(&report).await?;

        tracing::info!(
            target_name = %target,
            local_updates = report.local_updates,
            local_deletions = report.local_deletions,
            remote_updates = report.remote_updates,
            remote_deletions = report.remote_deletions,
            "Sync complete"
        );

        Ok(report)
    }
}
