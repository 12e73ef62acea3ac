//! In-process remote table for tests and offline runs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::row::{record_to_row, rows_to_records, HEADER};
use super::{RemoteError, RemoteTable};
use crate::auth::Session;
use crate::error::Result;
use crate::models::Record;

/// Rows held in memory, marshaled the same way as the spreadsheet.
#[derive(Debug, Default)]
pub struct MemoryRemoteTable {
    rows: Mutex<Vec<Vec<Value>>>,
    fail_fetch: AtomicBool,
    fail_replace: AtomicBool,
    fail_append: AtomicBool,
    fetch_calls: AtomicUsize,
    replace_calls: AtomicUsize,
}

impl MemoryRemoteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-filled with a header and the given records, in order.
    pub fn with_records(records: &[Record]) -> Self {
        let table = Self::new();
        table.set_rows(with_header(records));
        table
    }

    /// Overwrite the raw rows, header included if desired.
    pub fn set_rows(&self, rows: Vec<Vec<Value>>) {
        *self.rows.lock().unwrap_or_else(PoisonError::into_inner) = rows;
    }

    pub fn rows(&self) -> Vec<Vec<Value>> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Decoded records, in table order.
    pub fn records(&self) -> Vec<Record> {
        rows_to_records(&self.rows())
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn fail_replace(&self, fail: bool) {
        self.fail_replace.store(fail, Ordering::SeqCst);
    }

    pub fn fail_append(&self, fail: bool) {
        self.fail_append.store(fail, Ordering::SeqCst);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn replace_calls(&self) -> usize {
        self.replace_calls.load(Ordering::SeqCst)
    }
}

fn with_header(records: &[Record]) -> Vec<Vec<Value>> {
    std::iter::once(HEADER.iter().map(|cell| Value::from(*cell)).collect())
        .chain(records.iter().map(record_to_row))
        .collect()
}

fn unavailable(operation: &str) -> crate::Error {
    RemoteError::Unavailable(format!("{operation} failed")).into()
}

#[async_trait]
impl RemoteTable for MemoryRemoteTable {
    async fn fetch_all(&self, session: &Session) -> Result<Vec<Record>> {
        session.access_token()?;
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(unavailable("fetch"));
        }
        Ok(self.records())
    }

    async fn replace_all(&self, session: &Session, records: &[Record]) -> Result<()> {
        session.access_token()?;
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(unavailable("replace"));
        }
        self.set_rows(with_header(records));
        Ok(())
    }

    async fn append_one(&self, session: &Session, record: &Record) -> Result<()> {
        session.access_token()?;
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(unavailable("append"));
        }
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record_to_row(record));
        Ok(())
    }
}
