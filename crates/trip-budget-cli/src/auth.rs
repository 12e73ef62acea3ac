//! CLI Google auth helpers with secure keychain persistence.

#[cfg(test)]
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use crate::config_profiles::CliProfile;

use trip_budget_core::auth::{
    resolve_optional_oauth_config, AuthResult, GoogleOAuthClient, RefreshTokenPersistence,
    SessionManager, StaticTokenSource, TokenSource,
};
use trip_budget_core::util::non_blank;
pub use trip_budget_core::auth::{AccessToken, AuthError};

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "trip-budget-cli";

/// Env var holding a ready-made access token (advanced mode).
pub const ACCESS_TOKEN_ENV: &str = "TRIP_BUDGET_ACCESS_TOKEN";

#[derive(Clone)]
struct RefreshTokenStore {
    username: String,
}

impl RefreshTokenStore {
    fn new(profile_name: &str) -> Self {
        Self {
            username: format!("google_refresh_token:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl RefreshTokenPersistence for RefreshTokenStore {
    #[cfg(not(test))]
    fn load_refresh_token(&self) -> AuthResult<Option<String>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(raw) => Ok(non_blank(Some(raw))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_refresh_token(&self) -> AuthResult<Option<String>> {
        let store = Self::test_store();
        let guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(guard.get(&self.username).cloned())
    }

    #[cfg(not(test))]
    fn save_refresh_token(&self, refresh_token: &str) -> AuthResult<()> {
        self.entry()?
            .set_password(refresh_token)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(())
    }

    #[cfg(test)]
    fn save_refresh_token(&self, refresh_token: &str) -> AuthResult<()> {
        let store = Self::test_store();
        let mut guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.insert(self.username.clone(), refresh_token.to_string());
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_refresh_token(&self) -> AuthResult<()> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_refresh_token(&self) -> AuthResult<()> {
        let store = Self::test_store();
        let mut guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

#[derive(Clone)]
pub struct GoogleAuthService {
    inner: GoogleOAuthClient<RefreshTokenStore>,
}

impl GoogleAuthService {
    pub fn new_for_profile(profile_name: &str, profile: &CliProfile) -> AuthResult<Option<Self>> {
        let Some((client_id, client_secret)) = resolve_optional_oauth_config(
            profile.oauth_client_id(),
            profile.oauth_client_secret(),
        )?
        else {
            return Ok(None);
        };

        Ok(Some(Self {
            inner: GoogleOAuthClient::new(
                client_id,
                client_secret,
                RefreshTokenStore::new(profile_name),
            )?,
        }))
    }

    pub async fn sign_in(&self, refresh_token: &str) -> AuthResult<AccessToken> {
        self.inner.sign_in(refresh_token).await
    }

    pub fn has_stored_credentials(&self) -> AuthResult<bool> {
        self.inner.has_stored_credentials()
    }

    pub async fn sign_out(&self) -> AuthResult<()> {
        self.inner.sign_out().await
    }

    fn into_token_source(self) -> Arc<dyn TokenSource> {
        Arc::new(self.inner)
    }
}

pub fn has_stored_refresh_token(profile_name: &str) -> AuthResult<bool> {
    Ok(RefreshTokenStore::new(profile_name)
        .load_refresh_token()?
        .is_some())
}

pub fn clear_stored_refresh_token(profile_name: &str) -> AuthResult<()> {
    RefreshTokenStore::new(profile_name).clear_refresh_token()
}

/// Static token from the environment, if set.
pub fn env_access_token() -> Option<AccessToken> {
    non_blank(std::env::var(ACCESS_TOKEN_ENV).ok()).map(AccessToken::non_expiring)
}

/// Session manager for a profile: env token first, then the stored refresh token.
pub fn session_manager_for_profile(
    profile_name: &str,
    profile: &CliProfile,
) -> AuthResult<Option<SessionManager>> {
    session_manager_with_env_token(env_access_token(), profile_name, profile)
}

fn session_manager_with_env_token(
    env_token: Option<AccessToken>,
    profile_name: &str,
    profile: &CliProfile,
) -> AuthResult<Option<SessionManager>> {
    if let Some(token) = env_token {
        tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
        return Ok(Some(SessionManager::new(Arc::new(StaticTokenSource::new(
            token,
        )))));
    }

    let Some(service) = GoogleAuthService::new_for_profile(profile_name, profile)? else {
        return Ok(None);
    };
    if !service.has_stored_credentials()? {
        return Ok(None);
    }
    Ok(Some(SessionManager::new(service.into_token_source())))
}
