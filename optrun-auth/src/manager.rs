//! Credential manager
//!
//! Owns the token lifecycle: interactive login, logout with remote
//! revocation, and construction of the refreshing authorizer. The token
//! record is all-or-nothing; a record with missing or unparseable fields is
//! treated as logged out.

use dialoguer::Input;
use tracing::{info, warn};

use crate::authorizer::Authorizer;
use crate::error::AuthError;
use crate::provider::{IdentityProvider, SERVICE_SCOPE};
use crate::store::{ACCESS_TOKEN_EXPIRES_OPT, ACCESS_TOKEN_OPT, REFRESH_TOKEN_OPT, TokenStore};

/// Manages the stored token record against the identity provider
pub struct CredentialManager<S: TokenStore, P: IdentityProvider> {
    store: S,
    provider: P,
}

impl<S: TokenStore, P: IdentityProvider> CredentialManager<S, P> {
    pub fn new(store: S, provider: P) -> Self {
        Self { store, provider }
    }

    /// Whether a complete, well-formed token record is stored
    pub fn is_logged_in(&self) -> Result<bool, AuthError> {
        let refresh = self.store.get(REFRESH_TOKEN_OPT)?;
        let access = self.store.get(ACCESS_TOKEN_OPT)?;
        let expires = self.store.get(ACCESS_TOKEN_EXPIRES_OPT)?;

        Ok(match (refresh, access, expires) {
            (Some(_), Some(_), Some(expires)) => expires.parse::<u64>().is_ok(),
            _ => false,
        })
    }

    /// Builds a refreshing authorizer, logging in interactively first if no
    /// valid session exists
    pub async fn ensure_authorizer(mut self) -> Result<Authorizer<S, P>, AuthError> {
        if !self.is_logged_in()? {
            println!("No authorization credentials present. You must log in");
            self.login().await?;
        }

        let refresh_token = self
            .store
            .get(REFRESH_TOKEN_OPT)?
            .ok_or(AuthError::IncompleteTokenRecord)?;
        let access_token = self
            .store
            .get(ACCESS_TOKEN_OPT)?
            .ok_or(AuthError::IncompleteTokenRecord)?;
        let expires_at = self
            .store
            .get(ACCESS_TOKEN_EXPIRES_OPT)?
            .and_then(|expires| expires.parse::<u64>().ok())
            .ok_or(AuthError::IncompleteTokenRecord)?;

        Ok(Authorizer::new(
            self.provider,
            self.store,
            refresh_token,
            access_token,
            expires_at,
        ))
    }

    /// Runs the interactive native-app login flow
    ///
    /// Presents the authorize URL, prompts for the resulting code, exchanges
    /// it for tokens, and persists the new token record.
    pub async fn login(&mut self) -> Result<(), AuthError> {
        let url = self.provider.authorize_url(SERVICE_SCOPE);
        let prompt = "Please log into the optrun identity provider here";
        let rule = "-".repeat(prompt.len());
        println!("{prompt}:\n{rule}\n{url}\n{rule}\n");

        let code: String = Input::new()
            .with_prompt("Enter the resulting Authorization Code")
            .interact_text()?;

        self.login_with_code(code.trim()).await
    }

    /// Exchanges an authorization code and stores the resulting token record
    ///
    /// Any previously stored tokens are revoked best-effort before the new
    /// record is written; failures there are logged, not fatal.
    pub async fn login_with_code(&mut self, code: &str) -> Result<(), AuthError> {
        let grant = self.provider.exchange_code(code).await?;

        self.revoke_current_tokens().await;

        let refresh_token = grant
            .refresh_token
            .as_deref()
            .ok_or(AuthError::MissingRefreshToken)?;
        let expires_at = grant.expires_at();

        self.store.set(REFRESH_TOKEN_OPT, refresh_token)?;
        self.store.set(ACCESS_TOKEN_OPT, &grant.access_token)?;
        self.store
            .set(ACCESS_TOKEN_EXPIRES_OPT, &expires_at.to_string())?;

        info!("stored new token record");
        Ok(())
    }

    /// Revokes stored tokens and removes them from the local store
    ///
    /// A network failure while revoking aborts the logout with local state
    /// intact, so a later attempt can retry the revocation. Provider-side
    /// rejections other than network failures propagate as errors.
    pub async fn logout(&mut self) -> Result<(), AuthError> {
        for key in [REFRESH_TOKEN_OPT, ACCESS_TOKEN_OPT] {
            let Some(token) = self.store.get(key)? else {
                println!("Warning: Found no token named \"{key}\"! Recommend rescinding consent");
                continue;
            };

            match self.provider.revoke(&token).await {
                Ok(()) => {
                    self.store.delete(key)?;
                }
                Err(err) if err.is_network() => {
                    println!(
                        "Failed to reach the identity provider to revoke tokens. \
                         Because we cannot revoke these tokens, cancelling logout"
                    );
                    warn!("logout aborted: {err}");
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }

        // Remove the expiry entry for cleanliness
        self.store.delete(ACCESS_TOKEN_EXPIRES_OPT)?;
        Ok(())
    }

    /// Best-effort revocation of whatever tokens are currently stored
    async fn revoke_current_tokens(&self) {
        for key in [REFRESH_TOKEN_OPT, ACCESS_TOKEN_OPT] {
            match self.store.get(key) {
                Ok(Some(token)) => {
                    if let Err(err) = self.provider.revoke(&token).await {
                        warn!("failed to revoke stored \"{key}\": {err}");
                    }
                }
                Ok(None) => {}
                Err(err) => warn!("failed to look up stored \"{key}\": {err}"),
            }
        }
    }
}
