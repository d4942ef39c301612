//! Identity provider client
//!
//! Implements the OAuth2 native-app flow against the identity provider's
//! authorize/token/revoke endpoints with plain form POSTs. The provider is a
//! trait so the credential manager can be exercised against a scripted fake.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::error::AuthError;

/// Scope required for calls to the optrun service
pub const SERVICE_SCOPE: &str = "https://auth.optrun.io/scopes/optrun_service/all";

/// Redirect target for native apps: the provider displays the code for the
/// user to copy back into the terminal
const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Fallback access-token lifetime when the provider omits `expires_in`
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Identity provider endpoints and client registration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub authorize_url: String,
    pub token_url: String,
    pub revoke_url: String,
    pub client_id: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            authorize_url: "https://auth.optrun.io/v2/oauth2/authorize".to_string(),
            token_url: "https://auth.optrun.io/v2/oauth2/token".to_string(),
            revoke_url: "https://auth.optrun.io/v2/oauth2/token/revoke".to_string(),
            client_id: "8e96a38c-2f89-4e35-92ec-7e41c6a0e94d".to_string(),
        }
    }
}

/// Tokens returned by a code exchange or a refresh
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl TokenGrant {
    /// Absolute expiry of the access token, in unix seconds
    pub fn expires_at(&self) -> u64 {
        unix_now() + self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
    }
}

/// Current unix time in seconds
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// The identity provider seam used by the credential manager and authorizer
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the user visits to authorize this client
    fn authorize_url(&self, scope: &str) -> String;

    /// Exchanges an authorization code for tokens
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AuthError>;

    /// Obtains a fresh access token from a refresh token
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthError>;

    /// Revokes a token remotely
    async fn revoke(&self, token: &str) -> Result<(), AuthError>;
}

/// HTTP client for the identity provider
pub struct AuthClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl AuthClient {
    pub fn new(config: ProviderConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { config, http }
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenGrant, AuthError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(form)
            .send()
            .await
            .map_err(|err| AuthError::Network(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AuthError::Network(err.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::Provider {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|err| AuthError::MalformedGrant(err.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for AuthClient {
    fn authorize_url(&self, scope: &str) -> String {
        format!(
            "{}?client_id={}&response_type=code&scope={}&access_type=offline&redirect_uri={}",
            self.config.authorize_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(scope),
            urlencoding::encode(OOB_REDIRECT_URI),
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AuthError> {
        debug!("exchanging authorization code for tokens");
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", OOB_REDIRECT_URI),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthError> {
        debug!("refreshing access token");
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
        ])
        .await
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(&self.config.revoke_url)
            .form(&[
                ("token", token),
                ("client_id", self.config.client_id.as_str()),
            ])
            .send()
            .await
            .map_err(|err| AuthError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_carries_scope_and_redirect() {
        let client = AuthClient::new(ProviderConfig::default());
        let url = client.authorize_url(SERVICE_SCOPE);

        assert!(url.starts_with("https://auth.optrun.io/v2/oauth2/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains(&*urlencoding::encode(SERVICE_SCOPE)));
        assert!(url.contains(&*urlencoding::encode(OOB_REDIRECT_URI)));
    }

    #[test]
    fn test_grant_expiry_uses_default_lifetime() {
        let grant = TokenGrant {
            access_token: "at".to_string(),
            refresh_token: None,
            expires_in: None,
        };
        let now = unix_now();
        assert!(grant.expires_at() >= now + DEFAULT_TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn test_grant_parses_with_optional_fields() {
        let grant: TokenGrant =
            serde_json::from_str(r#"{"access_token": "at-1", "token_type": "Bearer"}"#).unwrap();
        assert_eq!(grant.access_token, "at-1");
        assert!(grant.refresh_token.is_none());
        assert!(grant.expires_in.is_none());
    }
}
