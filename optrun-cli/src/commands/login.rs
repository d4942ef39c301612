//! Login command handler

use anyhow::Result;
use colored::Colorize;

use optrun_auth::{AuthClient, CredentialManager, FileTokenStore, ProviderConfig};

use crate::config::Config;

/// Runs the interactive login flow and stores the resulting tokens
pub async fn handle_login(_config: &Config) -> Result<()> {
    let store = FileTokenStore::open_default()?;
    let provider = AuthClient::new(ProviderConfig::default());
    let mut manager = CredentialManager::new(store, provider);

    manager.login().await?;
    println!("{}", "Login successful".green());
    Ok(())
}
