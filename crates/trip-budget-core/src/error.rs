//! Error types for trip-budget-core

use thiserror::Error;

use crate::auth::AuthError;
use crate::remote::RemoteError;

/// Result type alias using trip-budget-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in trip-budget-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote table failure (network, API, quota)
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Remote operation attempted without a signed-in session
    #[error("Sign-in required: {0}")]
    AuthRequired(String),

    /// Token acquisition failure
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

impl Error {
    /// Whether the caller should start a sign-in flow rather than retry.
    #[must_use]
    pub const fn requires_sign_in(&self) -> bool {
        matches!(self, Self::AuthRequired(_))
    }
}
