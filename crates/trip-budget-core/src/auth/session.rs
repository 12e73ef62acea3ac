//! Explicit sign-in session state.

use std::sync::{Arc, Mutex, PoisonError};

use super::{AccessToken, AuthResult, TokenSource};
use crate::error::{Error, Result};

/// Sign-in state handed by reference to the sync engine and remote accessor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    SignedOut,
    Signing,
    Signed(AccessToken),
}

impl Session {
    /// Whether a non-expired token is held.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::Signed(token) if !token.is_expired())
    }

    /// Token for a remote call, or `AuthRequired` when none is usable.
    pub fn access_token(&self) -> Result<&AccessToken> {
        match self {
            Self::Signed(token) if !token.is_expired() => Ok(token),
            Self::Signed(_) => Err(Error::AuthRequired("access token has expired".to_string())),
            Self::Signing => Err(Error::AuthRequired("sign-in is in progress".to_string())),
            Self::SignedOut => Err(Error::AuthRequired("not signed in".to_string())),
        }
    }
}

/// Owns the current [`Session`] and serializes token requests.
///
/// Every sign-in attempt awaits its own request future. Concurrent callers
/// queue on the gate, so the second caller sees the first caller's token
/// instead of issuing a competing request.
pub struct SessionManager {
    source: Arc<dyn TokenSource>,
    state: Mutex<Session>,
    sign_in_gate: tokio::sync::Mutex<()>,
}

impl SessionManager {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            state: Mutex::new(Session::SignedOut),
            sign_in_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Snapshot of the current state.
    pub fn current(&self) -> Session {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return a signed-in session, requesting a token if needed.
    pub async fn ensure_signed_in(&self) -> AuthResult<Session> {
        let _gate = self.sign_in_gate.lock().await;

        let current = self.current();
        if current.is_signed_in() {
            return Ok(current);
        }

        self.set(Session::Signing);
        match self.source.request_token().await {
            Ok(token) => {
                tracing::debug!("Obtained access token expiring at {}", token.expires_at);
                let session = Session::Signed(token);
                self.set(session.clone());
                Ok(session)
            }
            Err(error) => {
                self.set(Session::SignedOut);
                Err(error)
            }
        }
    }

    /// Forget the current token.
    pub fn sign_out(&self) {
        self.set(Session::SignedOut);
    }

    fn set(&self, session: Session) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = session;
    }
}
