use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] trip_budget_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Record ID cannot be empty")]
    EmptyRecordId,
    #[error("Record not found for id/prefix: {0}")]
    RecordNotFound(String),
    #[error("{0}")]
    AmbiguousRecordId(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Unknown category: {0}")]
    InvalidCategory(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error(
        "Sync is not configured. Run `trip-budget config init --spreadsheet-id <ID>` + `trip-budget auth login`, or set TRIP_BUDGET_ACCESS_TOKEN for advanced env mode."
    )]
    SyncNotConfigured,
}
