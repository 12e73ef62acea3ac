//! Database layer for Trip Budget

mod connection;
mod kv_repository;
mod migrations;
mod repository;

pub use connection::Database;
pub use kv_repository::{KeyValueRepository, SqliteKeyValueRepository};
pub use repository::{
    RecordRepository, SqliteRecordRepository, SqliteTombstoneRepository, TombstoneRepository,
    RECORDS_KEY, TOMBSTONES_KEY,
};
