use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use trip_budget_core::auth::SessionManager;
use trip_budget_core::state::SyncState;
use trip_budget_core::sync::{run_auto_sync, SyncReport};

use crate::commands::common::{open_engine, ProfileContext};
use crate::error::CliError;

pub fn format_sync_report(report: &SyncReport) -> String {
    format!(
        "Sync completed: {} records ({} pushed from this device, {} deletions propagated)",
        report.total, report.local_wins, report.tombstones_cleared
    )
}

/// Last line printed when `sync --watch` stops.
pub fn format_watch_stopped(state: SyncState, profile: &str) -> String {
    match state {
        SyncState::Idle => "Stopped before the first sync ran".to_string(),
        SyncState::Offline => format!(
            "Stopped; last sync needed sign-in. Run `trip-budget auth login --profile {profile}`."
        ),
        state => format!("Stopped; last sync state: {state}"),
    }
}

fn require_sync_setup(context: &ProfileContext) -> Result<SessionManager, CliError> {
    if context.profile.spreadsheet_id().is_none() {
        return Err(CliError::SyncNotConfigured);
    }
    context.session_manager()?.ok_or(CliError::SyncNotConfigured)
}

pub async fn run_sync(db_path: &Path, context: &ProfileContext) -> Result<(), CliError> {
    let sessions = require_sync_setup(context)?;
    let engine = open_engine(db_path, context)?;

    let session = sessions
        .ensure_signed_in()
        .await
        .map_err(|error| CliError::Auth(error.to_string()))?;
    let report = engine.reconcile(&session).await.map_err(|error| {
        if error.requires_sign_in() {
            CliError::Auth(format!(
                "{error}. Run `trip-budget auth login --profile {}`.",
                context.name
            ))
        } else {
            error.into()
        }
    })?;

    println!("{}", format_sync_report(&report));
    Ok(())
}

pub async fn run_sync_watch(
    interval: Option<Duration>,
    db_path: &Path,
    context: &ProfileContext,
) -> Result<(), CliError> {
    let sessions = Arc::new(require_sync_setup(context)?);
    let engine = Arc::new(open_engine(db_path, context)?);
    let period = interval
        .filter(|period| !period.is_zero())
        .unwrap_or_else(|| context.profile.auto_sync_interval());

    println!(
        "Syncing every {}s, press Ctrl-C to stop",
        period.as_secs()
    );
    run_auto_sync(Arc::clone(&engine), sessions, period, async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", error);
            std::future::pending::<()>().await;
        }
    })
    .await;

    println!("{}", format_watch_stopped(engine.state(), &context.name));
    Ok(())
}
