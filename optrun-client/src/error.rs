//! Error types for the optrun client

use optrun_auth::AuthError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when calling the experiment-tracking service
///
/// Non-2xx responses are not errors at this layer; they are carried in the
/// returned `ApiResponse` for the caller to interpret.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed at the transport level
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Obtaining request credentials failed
    #[error("authorization failed: {0}")]
    Token(#[from] AuthError),
}
