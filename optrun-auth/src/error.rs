//! Error types for credential management

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while managing credentials
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity provider could not be reached
    ///
    /// Revocation failures of this kind abort logout so that local and remote
    /// token state never diverge.
    #[error("network error reaching the identity provider: {0}")]
    Network(String),

    /// The identity provider rejected the request
    #[error("identity provider returned status {status}: {message}")]
    Provider { status: u16, message: String },

    /// The token response could not be parsed
    #[error("malformed token response: {0}")]
    MalformedGrant(String),

    /// The token grant did not include a refresh token
    #[error("token grant did not include a refresh token")]
    MissingRefreshToken,

    /// The stored token record is missing fields after a login
    #[error("stored token record is incomplete")]
    IncompleteTokenRecord,

    /// The local token store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Reading the authorization code from the console failed
    #[error("failed to read authorization code: {0}")]
    Prompt(#[from] std::io::Error),
}

impl AuthError {
    /// Whether this error is a transport-level failure
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
