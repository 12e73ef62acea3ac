//! Cross-process exclusive lock beside the database file.
//!
//! Every process that syncs against the same database serializes on this
//! lock, so a reconcile in one process never interleaves with a delete or a
//! create in another.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::Result;

/// Held lock. Released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: Option<File>,
}

impl StoreLock {
    /// Lock for a store with no backing file; nothing to share.
    pub(crate) const fn unshared() -> Self {
        Self { file: None }
    }

    /// Block (on the blocking pool) until the lock is ours.
    pub(crate) async fn acquire(lock_path: &Path) -> Result<Self> {
        let file = open_lock_file(lock_path)?;
        let file = tokio::task::spawn_blocking(move || file.lock_exclusive().map(|()| file))
            .await
            .map_err(io::Error::other)??;
        Ok(Self { file: Some(file) })
    }

    /// Take the lock if it is free; `None` when another holder has it.
    pub(crate) fn try_acquire(lock_path: &Path) -> Result<Option<Self>> {
        let file = open_lock_file(lock_path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file: Some(file) })),
            Err(error) if error.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            if let Err(error) = FileExt::unlock(file) {
                tracing::warn!("Failed to release store lock: {}", error);
            }
        }
    }
}

/// `trip-budget.db` locks through `trip-budget.db.lock`.
pub(crate) fn lock_path_for(db_path: &Path) -> PathBuf {
    let mut name = OsString::from(db_path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

fn open_lock_file(path: &Path) -> Result<File> {
    Ok(OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?)
}
