//! Two-way sync between the local store and the remote table.
//!
//! Every mutation the engine makes to the local store happens while holding
//! the engine's single-flight guard and the store's cross-process lock, so a
//! reconcile never interleaves with another reconcile, a delete, or a create,
//! even when those run in another process against the same database. Manual
//! triggers wait for both; automatic triggers give up when either is taken.
//!
//! Known limitation: the remote table has no locking primitive. A device that
//! writes between our fetch and our rewrite loses that write.

mod auto;
mod merge;

use std::sync::{Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;

use crate::auth::Session;
use crate::config::TripConfig;
use crate::error::{Error, Result};
use crate::models::{NewRecord, Record, RecordId};
use crate::remote::RemoteTable;
use crate::services::LocalStore;
use crate::state::SyncState;
use crate::util::now_unix_millis;

pub use auto::{run_auto_sync, DEFAULT_AUTO_SYNC_INTERVAL};
pub use merge::{merge_records, Merged};

/// Counts from one successful reconcile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records in the merged set
    pub total: usize,
    /// Local records that were newer than (or missing from) the remote copy
    pub local_wins: usize,
    /// Remote rows dropped because they were deleted here
    pub suppressed: usize,
    /// Tombstones cleared after the remote rewrite
    pub tombstones_cleared: usize,
}

/// What happened to the remote half of a local change.
#[derive(Debug)]
pub enum RemoteOutcome<T> {
    /// Not signed in; the change is picked up by the next reconcile
    Skipped,
    Completed(T),
    /// Local change kept; remote is stale until the next successful reconcile
    Failed(Error),
}

impl<T> RemoteOutcome<T> {
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Merge engine over a local store and a remote table.
pub struct SyncEngine<R> {
    store: LocalStore,
    remote: R,
    guard: AsyncMutex<()>,
    state: Mutex<SyncState>,
}

impl<R: RemoteTable> SyncEngine<R> {
    pub fn new(store: LocalStore, remote: R) -> Self {
        Self {
            store,
            remote,
            guard: AsyncMutex::new(()),
            state: Mutex::new(SyncState::Idle),
        }
    }

    pub const fn store(&self) -> &LocalStore {
        &self.store
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge local and remote, waiting for any in-flight run first.
    pub async fn reconcile(&self, session: &Session) -> Result<SyncReport> {
        let _guard = self.guard.lock().await;
        let _lock = self.store.lock_exclusive().await?;
        self.reconcile_locked(session).await
    }

    /// Merge unless a run is already in flight (here or in another process),
    /// in which case nothing happens and `None` is returned.
    pub async fn try_reconcile(&self, session: &Session) -> Option<Result<SyncReport>> {
        let Ok(_guard) = self.guard.try_lock() else {
            tracing::warn!("Dropping sync trigger: a sync is already running");
            return None;
        };
        let _lock = match self.store.try_lock_exclusive() {
            Ok(Some(lock)) => lock,
            Ok(None) => {
                tracing::warn!("Dropping sync trigger: another process holds the store");
                return None;
            }
            Err(error) => return Some(Err(error)),
        };
        Some(self.reconcile_locked(session).await)
    }

    /// Tombstone and remove a record locally, then reconcile when signed in.
    ///
    /// Local failures are returned as `Err`; remote failures are reported in
    /// the outcome since the deletion itself already succeeded.
    pub async fn record_deleted(
        &self,
        id: &RecordId,
        session: &Session,
    ) -> Result<(Record, RemoteOutcome<SyncReport>)> {
        let _guard = self.guard.lock().await;
        let _lock = self.store.lock_exclusive().await?;
        let removed = self.store.delete_record(id).await?;
        tracing::info!("Deleted record {}", id);

        if !session.is_signed_in() {
            return Ok((removed, RemoteOutcome::Skipped));
        }
        let outcome = match self.reconcile_locked(session).await {
            Ok(report) => RemoteOutcome::Completed(report),
            Err(error) => RemoteOutcome::Failed(error),
        };
        Ok((removed, outcome))
    }

    /// Store a record locally, then append it to the remote table when signed in.
    pub async fn record_created(
        &self,
        record: Record,
        session: &Session,
    ) -> Result<RemoteOutcome<()>> {
        let _guard = self.guard.lock().await;
        let _lock = self.store.lock_exclusive().await?;
        self.record_created_locked(&record, session).await
    }

    /// Validate a new record against the trip config, stamp it, and store it.
    ///
    /// The stamp is taken under the same locks as the insert, so concurrent
    /// creates never share a `created_at`.
    pub async fn create_record(
        &self,
        new_record: NewRecord,
        config: &TripConfig,
        session: &Session,
    ) -> Result<(Record, RemoteOutcome<()>)> {
        let _guard = self.guard.lock().await;
        let _lock = self.store.lock_exclusive().await?;
        let created_at = self.store.next_created_at(now_unix_millis()).await?;
        let record = new_record.build(&config.window, created_at)?;
        let outcome = self.record_created_locked(&record, session).await?;
        Ok((record, outcome))
    }

    async fn record_created_locked(
        &self,
        record: &Record,
        session: &Session,
    ) -> Result<RemoteOutcome<()>> {
        self.store.insert_record(record.clone()).await?;
        tracing::info!("Saved record {} ({})", record.id, record.category);

        if !session.is_signed_in() {
            return Ok(RemoteOutcome::Skipped);
        }
        Ok(match self.remote.append_one(session, record).await {
            Ok(()) => RemoteOutcome::Completed(()),
            Err(error) => {
                tracing::warn!("Could not append record {} remotely: {}", record.id, error);
                RemoteOutcome::Failed(error)
            }
        })
    }

    async fn reconcile_locked(&self, session: &Session) -> Result<SyncReport> {
        self.set_state(SyncState::Syncing);
        let result = self.run_reconcile(session).await;
        match &result {
            Ok(report) => {
                self.set_state(SyncState::Synced);
                tracing::info!(
                    "Sync complete: {} records, {} local wins, {} deletions propagated",
                    report.total,
                    report.local_wins,
                    report.tombstones_cleared
                );
            }
            Err(error) => {
                self.set_state(if error.requires_sign_in() {
                    SyncState::Offline
                } else {
                    SyncState::Error
                });
                tracing::warn!("Sync failed: {}", error);
            }
        }
        result
    }

    async fn run_reconcile(&self, session: &Session) -> Result<SyncReport> {
        let remote = self.remote.fetch_all(session).await?;
        let tombstones = self.store.load_tombstones().await?;
        let local = self.store.load_records().await?;

        let merged = merge_records(remote, &tombstones, local);
        self.store.save_records(&merged.records).await?;

        self.remote
            .replace_all(session, &merged.oldest_first())
            .await?;

        if !tombstones.is_empty() {
            self.store.remove_tombstones(&tombstones).await?;
        }

        Ok(SyncReport {
            total: merged.records.len(),
            local_wins: merged.local_wins,
            suppressed: merged.suppressed,
            tombstones_cleared: tombstones.len(),
        })
    }

    fn set_state(&self, state: SyncState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}
