//! Refreshing authorizer
//!
//! Produces bearer tokens for service calls, silently obtaining a fresh
//! access token through the refresh-token grant when the cached one has
//! expired. Refreshed tokens are written through to the token store so the
//! next invocation starts from the newest record.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::AuthError;
use crate::provider::{IdentityProvider, unix_now};
use crate::store::{ACCESS_TOKEN_EXPIRES_OPT, ACCESS_TOKEN_OPT, REFRESH_TOKEN_OPT, TokenStore};

/// Anything that can produce valid request credentials
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// A currently-valid access token for the service
    async fn bearer_token(&self) -> Result<String, AuthError>;
}

/// Authorizer backed by a refresh token and a cached access token
pub struct Authorizer<S: TokenStore, P: IdentityProvider> {
    provider: P,
    inner: Mutex<TokenState<S>>,
}

struct TokenState<S> {
    store: S,
    refresh_token: String,
    access_token: String,
    expires_at: u64,
}

impl<S: TokenStore, P: IdentityProvider> Authorizer<S, P> {
    pub fn new(
        provider: P,
        store: S,
        refresh_token: String,
        access_token: String,
        expires_at: u64,
    ) -> Self {
        Self {
            provider,
            inner: Mutex::new(TokenState {
                store,
                refresh_token,
                access_token,
                expires_at,
            }),
        }
    }
}

#[async_trait]
impl<S: TokenStore, P: IdentityProvider> TokenSource for Authorizer<S, P> {
    async fn bearer_token(&self) -> Result<String, AuthError> {
        let mut state = self.inner.lock().await;

        if unix_now() < state.expires_at {
            return Ok(state.access_token.clone());
        }

        debug!("cached access token expired, refreshing");
        let grant = self.provider.refresh(&state.refresh_token).await?;

        let access_token = grant.access_token.clone();
        let expires_at = grant.expires_at();
        state.access_token = access_token.clone();
        state.expires_at = expires_at;

        // Some providers rotate the refresh token on use
        if let Some(rotated) = grant.refresh_token {
            state.refresh_token = rotated.clone();
            state.store.set(REFRESH_TOKEN_OPT, &rotated)?;
        }
        state.store.set(ACCESS_TOKEN_OPT, &access_token)?;
        state
            .store
            .set(ACCESS_TOKEN_EXPIRES_OPT, &expires_at.to_string())?;

        Ok(access_token)
    }
}
