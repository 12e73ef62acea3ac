//! Periodic background sync.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use super::SyncEngine;
use crate::auth::SessionManager;
use crate::remote::RemoteTable;

pub const DEFAULT_AUTO_SYNC_INTERVAL: Duration = Duration::from_secs(60);

/// Reconcile every `period` until `shutdown` resolves.
///
/// Each tick runs on its own task; a tick that finds a run in flight is
/// dropped. Failures are logged and the loop keeps going. Runs already in
/// flight at shutdown are awaited, not cancelled.
pub async fn run_auto_sync<R, F>(
    engine: Arc<SyncEngine<R>>,
    sessions: Arc<SessionManager>,
    period: Duration,
    shutdown: F,
) where
    R: RemoteTable + 'static,
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight = JoinSet::new();
    tokio::pin!(shutdown);

    tracing::info!("Auto sync every {}s", period.as_secs_f64());
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = ticker.tick() => {
                let engine = Arc::clone(&engine);
                let sessions = Arc::clone(&sessions);
                in_flight.spawn(async move { tick(&engine, &sessions).await });
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }

    while in_flight.join_next().await.is_some() {}
    tracing::info!("Auto sync stopped");
}

async fn tick<R: RemoteTable>(engine: &SyncEngine<R>, sessions: &SessionManager) {
    let session = match sessions.ensure_signed_in().await {
        Ok(session) => session,
        Err(error) => {
            tracing::warn!("Skipping auto sync, sign-in failed: {}", error);
            return;
        }
    };

    if let Some(Err(error)) = engine.try_reconcile(&session).await {
        tracing::debug!("Auto sync attempt failed: {}", error);
    }
}
