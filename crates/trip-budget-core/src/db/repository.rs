//! Record and tombstone repositories
//!
//! Both collections are stored as JSON documents under fixed keys of the
//! key-value table. Malformed documents read as empty collections; only
//! failures of the database itself are reported as errors.

use std::collections::BTreeSet;

use crate::db::kv_repository::{KeyValueRepository, SqliteKeyValueRepository};
use crate::error::Result;
use crate::models::{Record, RecordId};
use rusqlite::Connection;

/// Key holding the JSON-encoded record list
pub const RECORDS_KEY: &str = "trip-budget-records-v1";

/// Key holding the JSON-encoded array of deleted record ids
pub const TOMBSTONES_KEY: &str = "trip-budget-deleted-ids";

/// Trait for record list storage operations
pub trait RecordRepository {
    /// Load all records in stored order (empty on malformed data)
    fn load(&self) -> Result<Vec<Record>>;

    /// Replace the stored records, preserving the given order
    fn save(&self, records: &[Record]) -> Result<()>;
}

/// Trait for tombstone set storage operations
pub trait TombstoneRepository {
    /// Load the set of deleted ids pending propagation (empty on malformed data)
    fn load(&self) -> Result<BTreeSet<RecordId>>;

    /// Replace the stored set
    fn save(&self, ids: &BTreeSet<RecordId>) -> Result<()>;

    /// Add one id to the set
    fn add(&self, id: &RecordId) -> Result<()> {
        let mut ids = self.load()?;
        if ids.insert(id.clone()) {
            self.save(&ids)?;
        }
        Ok(())
    }
}

/// `SQLite` implementation of `RecordRepository`
pub struct SqliteRecordRepository<'a> {
    kv: SqliteKeyValueRepository<'a>,
}

impl<'a> SqliteRecordRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self {
            kv: SqliteKeyValueRepository::new(conn),
        }
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn load(&self) -> Result<Vec<Record>> {
        Ok(decode_or_default(self.kv.get(RECORDS_KEY)?, RECORDS_KEY))
    }

    fn save(&self, records: &[Record]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        self.kv.set(RECORDS_KEY, &raw)
    }
}

/// `SQLite` implementation of `TombstoneRepository`
pub struct SqliteTombstoneRepository<'a> {
    kv: SqliteKeyValueRepository<'a>,
}

impl<'a> SqliteTombstoneRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self {
            kv: SqliteKeyValueRepository::new(conn),
        }
    }
}

impl TombstoneRepository for SqliteTombstoneRepository<'_> {
    fn load(&self) -> Result<BTreeSet<RecordId>> {
        let ids: Vec<RecordId> = decode_or_default(self.kv.get(TOMBSTONES_KEY)?, TOMBSTONES_KEY);
        Ok(ids.into_iter().collect())
    }

    fn save(&self, ids: &BTreeSet<RecordId>) -> Result<()> {
        let raw = serde_json::to_string(&ids.iter().collect::<Vec<_>>())?;
        self.kv.set(TOMBSTONES_KEY, &raw)
    }
}

fn decode_or_default<T>(raw: Option<String>, key: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    let Some(raw) = raw else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!("Ignoring malformed local data under '{}': {}", key, error);
            T::default()
        }
    }
}
