//! Key-value repository over the `kv_store` table

use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

/// Trait for raw key-value storage operations
pub trait KeyValueRepository {
    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// `SQLite` implementation of `KeyValueRepository`
pub struct SqliteKeyValueRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteKeyValueRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl KeyValueRepository for SqliteKeyValueRepository<'_> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_get_missing_key() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteKeyValueRepository::new(db.connection());
        assert_eq!(repo.get("nope").unwrap(), None);
    }

    #[test]
    fn test_set_replaces_value() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteKeyValueRepository::new(db.connection());

        repo.set("k", "one").unwrap();
        repo.set("k", "two").unwrap();
        assert_eq!(repo.get("k").unwrap().as_deref(), Some("two"));
    }
}
