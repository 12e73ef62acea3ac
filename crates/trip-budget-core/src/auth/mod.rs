//! Google OAuth access-token acquisition for spreadsheet sync.

mod session;

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::util::{has_http_scheme, non_blank, now_unix_secs};

pub use session::{Session, SessionManager};

const EXPIRY_SKEW_SECONDS: i64 = 60;
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

/// Bearer token for the spreadsheet API.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    /// Expiry as Unix seconds
    pub expires_at: i64,
}

impl AccessToken {
    /// Token with no known expiry (supplied out of band).
    #[must_use]
    pub fn non_expiring(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: i64::MAX,
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= now_unix_secs().saturating_add(EXPIRY_SKEW_SECONDS)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Google OAuth is not configured for this profile.")]
    NotConfigured,
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("OAuth API error: {0}")]
    Api(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Produces a fresh access token. Each call is an independent request.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn request_token(&self) -> AuthResult<AccessToken>;
}

/// Where the long-lived refresh token is kept between runs.
pub trait RefreshTokenPersistence: Clone + Send + Sync + 'static {
    fn load_refresh_token(&self) -> AuthResult<Option<String>>;
    fn save_refresh_token(&self, refresh_token: &str) -> AuthResult<()>;
    fn clear_refresh_token(&self) -> AuthResult<()>;
}

/// Token source for a token provided by the environment.
#[derive(Clone)]
pub struct StaticTokenSource {
    token: AccessToken,
}

impl StaticTokenSource {
    #[must_use]
    pub const fn new(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn request_token(&self) -> AuthResult<AccessToken> {
        if self.token.is_expired() {
            return Err(AuthError::Api("static access token has expired".to_string()));
        }
        Ok(self.token.clone())
    }
}

/// OAuth client exchanging a stored refresh token for access tokens.
#[derive(Clone)]
pub struct GoogleOAuthClient<S: RefreshTokenPersistence> {
    token_url: String,
    revoke_url: String,
    client_id: String,
    client_secret: String,
    client: Client,
    store: S,
}

impl<S: RefreshTokenPersistence> GoogleOAuthClient<S> {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        store: S,
    ) -> AuthResult<Self> {
        let client_id = client_id.into().trim().to_string();
        if client_id.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "OAuth client id must not be empty",
            ));
        }
        let client_secret = client_secret.into().trim().to_string();
        if client_secret.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "OAuth client secret must not be empty",
            ));
        }

        Ok(Self {
            token_url: GOOGLE_TOKEN_URL.to_string(),
            revoke_url: GOOGLE_REVOKE_URL.to_string(),
            client_id,
            client_secret,
            client: Client::builder().build()?,
            store,
        })
    }

    /// Point the client at different OAuth endpoints.
    pub fn with_endpoints(
        mut self,
        token_url: impl AsRef<str>,
        revoke_url: impl AsRef<str>,
    ) -> AuthResult<Self> {
        self.token_url = normalize_endpoint(token_url.as_ref())?;
        self.revoke_url = normalize_endpoint(revoke_url.as_ref())?;
        Ok(self)
    }

    /// Validate a refresh token by exchanging it once, then persist it.
    pub async fn sign_in(&self, refresh_token: &str) -> AuthResult<AccessToken> {
        let refresh_token = refresh_token.trim();
        if refresh_token.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Refresh token must not be empty",
            ));
        }

        let token = self.exchange_refresh_token(refresh_token).await?;
        self.store.save_refresh_token(refresh_token)?;
        Ok(token)
    }

    /// Whether a refresh token is stored.
    pub fn has_stored_credentials(&self) -> AuthResult<bool> {
        Ok(self.store.load_refresh_token()?.is_some())
    }

    /// Revoke the stored refresh token (best effort) and forget it.
    pub async fn sign_out(&self) -> AuthResult<()> {
        if let Some(refresh_token) = self.store.load_refresh_token()? {
            let response = self
                .client
                .post(&self.revoke_url)
                .form(&[("token", refresh_token.as_str())])
                .send()
                .await?;
            let status = response.status();
            if !(status.is_success() || status == StatusCode::BAD_REQUEST) {
                let body = response.text().await.unwrap_or_default();
                return Err(AuthError::Api(parse_api_error(status, &body)));
            }
        }

        self.store.clear_refresh_token()
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> AuthResult<AccessToken> {
        let response = self
            .client
            .post(&self.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }

        let payload = response.json::<TokenResponse>().await?;
        if let Some(rotated) = payload.refresh_token.as_deref() {
            self.store.save_refresh_token(rotated)?;
        }
        payload.into_access_token()
    }
}

#[async_trait]
impl<S: RefreshTokenPersistence> TokenSource for GoogleOAuthClient<S> {
    async fn request_token(&self) -> AuthResult<AccessToken> {
        let refresh_token = self
            .store
            .load_refresh_token()?
            .ok_or(AuthError::NotConfigured)?;
        self.exchange_refresh_token(&refresh_token).await
    }
}

/// Resolve a client id/secret pair where both or neither must be set.
pub fn resolve_optional_oauth_config(
    client_id: Option<String>,
    client_secret: Option<String>,
) -> AuthResult<Option<(String, String)>> {
    let client_id = non_blank(client_id);
    let client_secret = non_blank(client_secret);

    match (client_id, client_secret) {
        (None, None) => Ok(None),
        (Some(client_id), Some(client_secret)) => Ok(Some((client_id, client_secret))),
        _ => Err(AuthError::NotConfigured),
    }
}

fn normalize_endpoint(url: &str) -> AuthResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AuthError::InvalidConfiguration(
            "OAuth endpoint must not be empty",
        ));
    }
    if !has_http_scheme(trimmed) {
        return Err(AuthError::InvalidConfiguration(
            "OAuth endpoint must include http:// or https://",
        ));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

impl TokenResponse {
    fn into_access_token(self) -> AuthResult<AccessToken> {
        let token = self
            .access_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::Api("response did not include access_token".to_string()))?;
        let expires_in = self
            .expires_in
            .ok_or_else(|| AuthError::Api("response did not include expires_in".to_string()))?;

        Ok(AccessToken {
            token,
            expires_at: now_unix_secs().saturating_add(expires_in),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<OAuthErrorResponse>(body) {
        if let Some(message) = payload.error_description.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct NoStore;

    impl RefreshTokenPersistence for NoStore {
        fn load_refresh_token(&self) -> AuthResult<Option<String>> {
            Ok(None)
        }
        fn save_refresh_token(&self, _refresh_token: &str) -> AuthResult<()> {
            Ok(())
        }
        fn clear_refresh_token(&self) -> AuthResult<()> {
            Ok(())
        }
    }

    #[test]
    fn access_token_debug_redacts_token() {
        let token = AccessToken {
            token: "secret-access-token".to_string(),
            expires_at: 1_700_000_000,
        };
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("secret-access-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn access_token_expiry_uses_skew() {
        let now = now_unix_secs();
        assert!(AccessToken {
            token: "t".to_string(),
            expires_at: now + 30,
        }
        .is_expired());
        assert!(!AccessToken {
            token: "t".to_string(),
            expires_at: now + 3600,
        }
        .is_expired());
        assert!(!AccessToken::non_expiring("t").is_expired());
    }

    #[test]
    fn token_response_requires_access_token() {
        let response = TokenResponse {
            access_token: Some("  ".to_string()),
            expires_in: Some(3600),
            refresh_token: None,
        };
        assert!(response.into_access_token().is_err());
    }

    #[test]
    fn token_response_computes_expiry() {
        let response = TokenResponse {
            access_token: Some("abc".to_string()),
            expires_in: Some(3600),
            refresh_token: None,
        };
        let token = response.into_access_token().unwrap();
        assert_eq!(token.token, "abc");
        assert!(token.expires_at >= now_unix_secs() + 3500);
    }

    #[test]
    fn parse_api_error_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Token has been expired or revoked."}"#;
        assert_eq!(
            parse_api_error(StatusCode::BAD_REQUEST, body),
            "Token has been expired or revoked. (400)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
    }

    #[test]
    fn client_rejects_blank_credentials() {
        assert!(GoogleOAuthClient::new(" ", "secret", NoStore).is_err());
        assert!(GoogleOAuthClient::new("id", "", NoStore).is_err());
    }

    #[test]
    fn with_endpoints_requires_http_scheme() {
        let client = GoogleOAuthClient::new("id", "secret", NoStore).unwrap();
        assert!(client
            .clone()
            .with_endpoints("localhost/token", "https://example.com/revoke")
            .is_err());
        assert!(client
            .with_endpoints("http://localhost/token/", "http://localhost/revoke")
            .is_ok());
    }

    #[tokio::test]
    async fn request_token_without_stored_credentials_is_not_configured() {
        let client = GoogleOAuthClient::new("id", "secret", NoStore).unwrap();
        let error = client.request_token().await.unwrap_err();
        assert!(matches!(error, AuthError::NotConfigured));
    }

    #[test]
    fn resolve_optional_oauth_config_requires_both_values() {
        assert!(resolve_optional_oauth_config(None, None).unwrap().is_none());
        assert!(resolve_optional_oauth_config(Some("id".to_string()), None).is_err());
        assert_eq!(
            resolve_optional_oauth_config(Some(" id ".to_string()), Some("s".to_string()))
                .unwrap(),
            Some(("id".to_string(), "s".to_string()))
        );
    }
}
