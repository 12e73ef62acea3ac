//! Remote tabular store access.
//!
//! The remote table is a shared, ownerless replica with no conflict detection
//! of its own. Accessors only read and write rows; merging is the sync
//! engine's job. No accessor touches local state.

mod memory;
mod row;
mod sheets;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Session;
use crate::error::Result;
use crate::models::Record;

pub use memory::MemoryRemoteTable;
pub use row::{record_to_row, row_to_record, rows_to_records, HEADER};
pub use sheets::SheetsClient;

/// Failures of the remote table (network, API, quota).
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Spreadsheet API error: {0}")]
    Api(String),
    #[error("Invalid spreadsheet payload: {0}")]
    InvalidPayload(String),
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote table unavailable: {0}")]
    Unavailable(String),
}

/// Fetch/overwrite primitives against the remote table.
#[async_trait]
pub trait RemoteTable: Send + Sync {
    /// Every record row after the optional header; rows without an id are dropped.
    async fn fetch_all(&self, session: &Session) -> Result<Vec<Record>>;

    /// Clear the table, write the header row, then append `records` in the given order.
    async fn replace_all(&self, session: &Session, records: &[Record]) -> Result<()>;

    /// Append a single row, leaving existing rows untouched.
    async fn append_one(&self, session: &Session, record: &Record) -> Result<()>;
}

#[async_trait]
impl<T: RemoteTable + ?Sized> RemoteTable for Box<T> {
    async fn fetch_all(&self, session: &Session) -> Result<Vec<Record>> {
        (**self).fetch_all(session).await
    }

    async fn replace_all(&self, session: &Session, records: &[Record]) -> Result<()> {
        (**self).replace_all(session, records).await
    }

    async fn append_one(&self, session: &Session, record: &Record) -> Result<()> {
        (**self).append_one(session, record).await
    }
}

/// Stand-in when no remote table is configured. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredRemote;

impl UnconfiguredRemote {
    fn error() -> crate::Error {
        RemoteError::InvalidConfiguration("no spreadsheet is configured".to_string()).into()
    }
}

#[async_trait]
impl RemoteTable for UnconfiguredRemote {
    async fn fetch_all(&self, _session: &Session) -> Result<Vec<Record>> {
        Err(Self::error())
    }

    async fn replace_all(&self, _session: &Session, _records: &[Record]) -> Result<()> {
        Err(Self::error())
    }

    async fn append_one(&self, _session: &Session, _record: &Record) -> Result<()> {
        Err(Self::error())
    }
}
