use std::env;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use trip_budget_core::auth::{Session, SessionManager};
use trip_budget_core::config::{parse_iso_date, TripConfig, TripWindow};
use trip_budget_core::remote::{RemoteTable, SheetsClient, UnconfiguredRemote};
use trip_budget_core::services::LocalStore;
use trip_budget_core::summary::format_amount;
use trip_budget_core::sync::{RemoteOutcome, SyncEngine};
use trip_budget_core::{Category, Record, RecordId};

use crate::auth::session_manager_for_profile;
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub type CliEngine = SyncEngine<Box<dyn RemoteTable>>;

/// Resolved profile for commands that touch records.
#[derive(Debug, Clone, Default)]
pub struct ProfileContext {
    pub name: String,
    pub profile: CliProfile,
}

impl ProfileContext {
    pub fn load(explicit: Option<&str>) -> Result<Self, CliError> {
        let config = CliProfilesConfig::load().map_err(CliError::Config)?;
        let name = config.resolve_profile_name(explicit);
        let profile = config.profile(&name).cloned().unwrap_or_default();
        Ok(Self { name, profile })
    }

    pub fn trip_config(&self) -> Result<TripConfig, CliError> {
        self.profile
            .trip_config()
            .map_err(|error| CliError::Config(format!("profile '{}': {error}", self.name)))
    }

    /// Spreadsheet client, or `None` when the profile has no spreadsheet.
    pub fn sheets_client(&self) -> Result<Option<SheetsClient>, CliError> {
        let Some(spreadsheet_id) = self.profile.spreadsheet_id() else {
            return Ok(None);
        };
        let client = SheetsClient::new(spreadsheet_id).map_err(trip_budget_core::Error::from)?;
        let client = match self.profile.sheet_name() {
            Some(sheet_name) => client
                .with_sheet_name(sheet_name)
                .map_err(trip_budget_core::Error::from)?,
            None => client,
        };
        Ok(Some(client))
    }

    pub fn session_manager(&self) -> Result<Option<SessionManager>, CliError> {
        session_manager_for_profile(&self.name, &self.profile)
            .map_err(|error| CliError::Auth(error.to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct RecordListItem {
    pub id: String,
    pub date: String,
    pub category: Category,
    pub category_label: String,
    pub amount_primary: u64,
    pub amount_secondary: Option<f64>,
    pub conversion_rate: Option<f64>,
    pub note: String,
    pub created_at: i64,
    pub created_at_iso: String,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os("TRIP_BUDGET_DB_PATH").map(PathBuf::from))
    {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("trip-budget").join("trip-budget.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

pub fn open_store(path: &Path) -> Result<LocalStore, CliError> {
    Ok(LocalStore::open_path(path)?)
}

/// Engine over the local store and the profile's spreadsheet, if any.
pub fn open_engine(db_path: &Path, context: &ProfileContext) -> Result<CliEngine, CliError> {
    let remote: Box<dyn RemoteTable> = match context.sheets_client()? {
        Some(client) => Box::new(client),
        None => Box::new(UnconfiguredRemote),
    };
    Ok(SyncEngine::new(open_store(db_path)?, remote))
}

/// Best-effort sign-in for commands that work offline.
///
/// Returns `SignedOut` when no spreadsheet or credentials are configured, or
/// when the token request fails.
pub async fn best_effort_session(context: &ProfileContext) -> Session {
    if context.profile.spreadsheet_id().is_none() {
        return Session::SignedOut;
    }
    let manager = match context.session_manager() {
        Ok(Some(manager)) => manager,
        Ok(None) => return Session::SignedOut,
        Err(error) => {
            tracing::warn!("Working offline: {}", error);
            return Session::SignedOut;
        }
    };
    match manager.ensure_signed_in().await {
        Ok(session) => session,
        Err(error) => {
            tracing::warn!("Working offline, sign-in failed: {}", error);
            Session::SignedOut
        }
    }
}

pub fn describe_remote_outcome<T>(outcome: &RemoteOutcome<T>, action: &str) -> Option<String> {
    match outcome {
        RemoteOutcome::Skipped => Some(format!("{action} locally only (not signed in)")),
        RemoteOutcome::Completed(_) => None,
        RemoteOutcome::Failed(error) if error.requires_sign_in() => Some(format!(
            "{action} locally; spreadsheet needs sign-in: {error}. Run `trip-budget auth login`."
        )),
        RemoteOutcome::Failed(error) => Some(format!(
            "{action} locally; spreadsheet update failed: {error}. Run `trip-budget sync` to retry."
        )),
    }
}

/// Accept `YYYY-MM-DD` or a trip day label like `9/14`.
pub fn resolve_trip_date(input: &str, window: &TripWindow) -> Result<NaiveDate, CliError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CliError::InvalidDate("date cannot be empty".to_string()));
    }

    let date = if trimmed.contains('/') {
        window
            .dates()
            .into_iter()
            .find(|day| day.label == trimmed)
            .map(|day| parse_iso_date(&day.iso))
            .transpose()?
            .ok_or_else(|| {
                CliError::InvalidDate(format!("'{trimmed}' is not a day of the trip"))
            })?
    } else {
        parse_iso_date(trimmed).map_err(|error| CliError::InvalidDate(error.to_string()))?
    };

    if !window.contains(date) {
        return Err(CliError::InvalidDate(format!(
            "{date} is outside the trip ({}..{})",
            window.start, window.end
        )));
    }
    Ok(date)
}

pub fn parse_category(input: &str) -> Result<Category, CliError> {
    input
        .parse::<Category>()
        .map_err(|_| CliError::InvalidCategory(input.trim().to_string()))
}

pub fn normalize_record_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyRecordId)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Resolve a full id or a unique id prefix against the stored records.
pub fn resolve_record_id(query: &str, records: &[Record]) -> Result<RecordId, CliError> {
    let query = normalize_record_identifier(query)?;
    if let Some(record) = records.iter().find(|record| record.id.as_str() == query) {
        return Ok(record.id.clone());
    }

    let matching = records
        .iter()
        .filter(|record| record.id.as_str().starts_with(&query))
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::RecordNotFound(query)),
        [record] => Ok(record.id.clone()),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|record| short_id(&record.id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousRecordId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &RecordId) -> String {
    id.as_str().chars().take(13).collect()
}

pub fn filter_records(
    records: Vec<Record>,
    date: Option<NaiveDate>,
    category: Option<Category>,
    limit: Option<usize>,
) -> Vec<Record> {
    let iso = date.map(|date| date.format("%Y-%m-%d").to_string());
    records
        .into_iter()
        .filter(|record| iso.as_deref().map_or(true, |iso| record.date == iso))
        .filter(|record| category.map_or(true, |category| record.category == category))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

pub fn format_record_lines(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let amount = format_amount(record.amount_primary);
            let line = format!(
                "{:<13}  {:<6}  {:<11}  {:>10}",
                short_id(&record.id),
                display_date(&record.date),
                record.category.label(),
                amount
            );
            let foreign = match (record.amount_secondary, record.conversion_rate) {
                (Some(amount), Some(rate)) => format!("  ({amount} @ {rate})"),
                _ => String::new(),
            };
            if record.note.is_empty() {
                format!("{line}{foreign}")
            } else {
                format!("{line}{foreign}  {}", record.note)
            }
        })
        .collect()
}

pub fn record_to_list_item(record: &Record) -> RecordListItem {
    RecordListItem {
        id: record.id.to_string(),
        date: record.date.clone(),
        category: record.category,
        category_label: record.category.label().to_string(),
        amount_primary: record.amount_primary,
        amount_secondary: record.amount_secondary,
        conversion_rate: record.conversion_rate,
        note: record.note.clone(),
        created_at: record.created_at,
        created_at_iso: format_timestamp(record.created_at),
    }
}

/// `2025-09-14` as `9/14`; anything unparseable is returned unchanged.
pub fn display_date(iso: &str) -> String {
    parse_iso_date(iso).map_or_else(
        |_| iso.to_string(),
        |date| format!("{}/{}", date.month(), date.day()),
    )
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}
