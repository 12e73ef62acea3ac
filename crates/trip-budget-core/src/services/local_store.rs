//! Shared local store service used across clients.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{
    Database, RecordRepository, SqliteRecordRepository, SqliteTombstoneRepository,
    TombstoneRepository,
};
use crate::models::{Record, RecordId};
use crate::services::store_lock::{lock_path_for, StoreLock};
use crate::{Error, Result};

/// Thread-safe service over the record store and the tombstone queue.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl LocalStore {
    /// Open a local store at the given filesystem path.
    pub fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path)?;
        tracing::debug!("Opened local store at {}", db_path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory local store (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Filesystem path of the backing database, if any.
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Wait for the exclusive lock shared by every process using this database.
    pub async fn lock_exclusive(&self) -> Result<StoreLock> {
        match &self.db_path {
            Some(path) => StoreLock::acquire(&lock_path_for(path)).await,
            None => Ok(StoreLock::unshared()),
        }
    }

    /// Take the exclusive lock only if no other holder has it.
    pub fn try_lock_exclusive(&self) -> Result<Option<StoreLock>> {
        match &self.db_path {
            Some(path) => StoreLock::try_acquire(&lock_path_for(path)),
            None => Ok(Some(StoreLock::unshared())),
        }
    }

    /// Load all records, newest first as last saved.
    pub async fn load_records(&self) -> Result<Vec<Record>> {
        let db = self.db.lock().await;
        SqliteRecordRepository::new(db.connection()).load()
    }

    /// Replace all records.
    pub async fn save_records(&self, records: &[Record]) -> Result<()> {
        let db = self.db.lock().await;
        SqliteRecordRepository::new(db.connection()).save(records)
    }

    /// Load the tombstone set.
    pub async fn load_tombstones(&self) -> Result<BTreeSet<RecordId>> {
        let db = self.db.lock().await;
        SqliteTombstoneRepository::new(db.connection()).load()
    }

    #[cfg(test)]
    pub(crate) async fn add_tombstone(&self, id: &RecordId) -> Result<()> {
        let db = self.db.lock().await;
        SqliteTombstoneRepository::new(db.connection()).add(id)
    }

    /// Remove the given ids from the tombstone set, keeping any added since.
    pub async fn remove_tombstones(&self, ids: &BTreeSet<RecordId>) -> Result<()> {
        let db = self.db.lock().await;
        let repo = SqliteTombstoneRepository::new(db.connection());
        let current = repo.load()?;
        let remaining: BTreeSet<RecordId> = current.difference(ids).cloned().collect();
        if remaining.len() != current.len() {
            repo.save(&remaining)?;
        }
        Ok(())
    }

    /// Prepend a new record to the stored list.
    pub async fn insert_record(&self, record: Record) -> Result<()> {
        let db = self.db.lock().await;
        let repo = SqliteRecordRepository::new(db.connection());
        let mut records = repo.load()?;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(Error::InvalidInput(format!(
                "record {} already exists",
                record.id
            )));
        }
        records.insert(0, record);
        repo.save(&records)
    }

    /// Tombstone a record and remove it from the stored list.
    ///
    /// The tombstone is written first so a crash between the two writes can
    /// never let a remote copy resurrect the record.
    pub async fn delete_record(&self, id: &RecordId) -> Result<Record> {
        let db = self.db.lock().await;
        let records_repo = SqliteRecordRepository::new(db.connection());
        let mut records = records_repo.load()?;
        let position = records
            .iter()
            .position(|record| &record.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        SqliteTombstoneRepository::new(db.connection()).add(id)?;
        let removed = records.remove(position);
        records_repo.save(&records)?;
        Ok(removed)
    }

    /// Timestamp for a record created now, strictly after every stored record.
    pub async fn next_created_at(&self, now_ms: i64) -> Result<i64> {
        let records = self.load_records().await?;
        let newest = records.iter().map(|record| record.created_at).max();
        Ok(match newest {
            Some(newest) if newest >= now_ms => newest.saturating_add(1),
            _ => now_ms,
        })
    }

    /// Raw persisted documents (records, tombstones), for byte-level comparisons.
    #[cfg(test)]
    pub(crate) async fn raw_snapshot(&self) -> Result<(Option<String>, Option<String>)> {
        use crate::db::{KeyValueRepository, SqliteKeyValueRepository, RECORDS_KEY, TOMBSTONES_KEY};

        let db = self.db.lock().await;
        let kv = SqliteKeyValueRepository::new(db.connection());
        Ok((kv.get(RECORDS_KEY)?, kv.get(TOMBSTONES_KEY)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use pretty_assertions::assert_eq;

    fn record(id: &str, created_at: i64) -> Record {
        Record {
            id: RecordId::parse(id).unwrap(),
            date: "2025-09-15".to_string(),
            category: Category::Souvenirs,
            amount_primary: 3000,
            amount_secondary: None,
            conversion_rate: None,
            conversion_markup: None,
            note: "tea".to_string(),
            created_at,
        }
    }

    #[tokio::test]
    async fn insert_record_prepends() {
        let store = LocalStore::open_in_memory().unwrap();
        store.insert_record(record("a", 1)).await.unwrap();
        store.insert_record(record("b", 2)).await.unwrap();

        let ids = store
            .load_records()
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id.to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn insert_record_rejects_duplicate_id() {
        let store = LocalStore::open_in_memory().unwrap();
        store.insert_record(record("a", 1)).await.unwrap();
        assert!(store.insert_record(record("a", 5)).await.is_err());
    }

    #[tokio::test]
    async fn delete_record_tombstones_and_removes() {
        let store = LocalStore::open_in_memory().unwrap();
        store.insert_record(record("a", 1)).await.unwrap();
        store.insert_record(record("b", 2)).await.unwrap();

        let id = RecordId::parse("a").unwrap();
        let removed = store.delete_record(&id).await.unwrap();
        assert_eq!(removed.id, id);

        let remaining = store.load_records().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(store.load_tombstones().await.unwrap().contains(&id));
    }

    #[tokio::test]
    async fn delete_missing_record_leaves_tombstones_alone() {
        let store = LocalStore::open_in_memory().unwrap();
        let error = store
            .delete_record(&RecordId::parse("ghost").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
        assert!(store.load_tombstones().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_tombstones_keeps_newer_entries() {
        let store = LocalStore::open_in_memory().unwrap();
        let old = RecordId::parse("old").unwrap();
        let new = RecordId::parse("new").unwrap();
        store.add_tombstone(&old).await.unwrap();
        let propagated = store.load_tombstones().await.unwrap();
        store.add_tombstone(&new).await.unwrap();

        store.remove_tombstones(&propagated).await.unwrap();

        let remaining = store.load_tombstones().await.unwrap();
        assert_eq!(remaining.into_iter().collect::<Vec<_>>(), vec![new]);
    }

    #[tokio::test]
    async fn next_created_at_is_strictly_increasing() {
        let store = LocalStore::open_in_memory().unwrap();
        assert_eq!(store.next_created_at(100).await.unwrap(), 100);

        store.insert_record(record("a", 500)).await.unwrap();
        assert_eq!(store.next_created_at(100).await.unwrap(), 501);
        assert_eq!(store.next_created_at(900).await.unwrap(), 900);
    }

    #[tokio::test]
    async fn open_path_persists_between_opens() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("trip-budget.db");

        {
            let store = LocalStore::open_path(&path).unwrap();
            store.insert_record(record("kept", 7)).await.unwrap();
            store
                .add_tombstone(&RecordId::parse("gone").unwrap())
                .await
                .unwrap();
        }

        let reopened = LocalStore::open_path(&path).unwrap();
        assert_eq!(reopened.path(), Some(path.as_path()));
        assert_eq!(reopened.load_records().await.unwrap(), vec![record("kept", 7)]);
        assert_eq!(reopened.load_tombstones().await.unwrap().len(), 1);
    }
}
