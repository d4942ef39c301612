//! Logout command handler

use anyhow::Result;

use optrun_auth::{AuthClient, CredentialManager, FileTokenStore, ProviderConfig};

use crate::config::Config;

/// Revokes stored tokens and removes them from the local store
///
/// If revocation cannot reach the identity provider the local tokens are left
/// in place so a later logout can retry; the manager reports that as a
/// warning, not an error.
pub async fn handle_logout(_config: &Config) -> Result<()> {
    let store = FileTokenStore::open_default()?;
    let provider = AuthClient::new(ProviderConfig::default());
    let mut manager = CredentialManager::new(store, provider);

    manager.logout().await?;
    Ok(())
}
