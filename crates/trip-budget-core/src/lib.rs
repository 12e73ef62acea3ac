//! trip-budget-core - Core library for Trip Budget
//!
//! Local record store, tombstone queue, remote spreadsheet access and the
//! merge engine that reconciles them. The CLI is a thin layer over this crate.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod summary;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Category, NewRecord, Record, RecordId};
