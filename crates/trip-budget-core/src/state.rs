//! Sync status shared with clients.

use std::fmt;

/// Where the sync engine currently stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    /// No sync attempted yet
    #[default]
    Idle,
    Syncing,
    Synced,
    /// Last attempt needed a sign-in
    Offline,
    /// Last attempt failed; local data is still usable
    Error,
}

impl SyncState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Offline => "offline",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
