//! CLI commands

mod login;
mod logout;
pub mod run;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Session-management subcommands
///
/// The default invocation (no subcommand) submits and optionally waits for a
/// trial; see [`run`].
#[derive(Subcommand)]
pub enum Commands {
    /// Log into the identity provider and store tokens locally
    Login,
    /// Revoke stored tokens and remove them from the local store
    Logout,
}

/// Routes a subcommand to its handler
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Login => login::handle_login(config).await,
        Commands::Logout => logout::handle_logout(config).await,
    }
}
