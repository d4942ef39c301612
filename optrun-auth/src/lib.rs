//! Optrun Auth
//!
//! Credential management for the optrun service:
//! - `TokenStore`: key-value persistence for the local token record
//! - `IdentityProvider`: the OAuth2 identity provider seam (`AuthClient` talks
//!   to the real provider over HTTP)
//! - `CredentialManager`: login / logout / authorizer construction
//! - `Authorizer`: produces bearer tokens, refreshing them transparently

pub mod authorizer;
pub mod error;
pub mod manager;
pub mod provider;
pub mod store;

pub use authorizer::{Authorizer, TokenSource};
pub use error::AuthError;
pub use manager::CredentialManager;
pub use provider::{AuthClient, IdentityProvider, ProviderConfig, SERVICE_SCOPE, TokenGrant};
pub use store::{
    ACCESS_TOKEN_EXPIRES_OPT, ACCESS_TOKEN_OPT, FileTokenStore, MemoryTokenStore,
    REFRESH_TOKEN_OPT, StoreError, TokenStore,
};
