//! Optrun CLI
//!
//! Command-line client for the optrun experiment-tracking service: submits
//! one optimizer trial against an experiment, optionally waits for the job
//! to finish, and manages the OAuth2 session (`login` / `logout`).

mod commands;
mod config;
mod output;
mod wait;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::run::RunArgs;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "optrun")]
#[command(about = "CLI for submitting optimization trials to the optrun service", long_about = None)]
#[command(subcommand_negates_reqs = true)]
struct Cli {
    /// Path to the experiment YAML or JSON document
    #[arg(long, required = true)]
    experiment: Option<PathBuf>,

    /// Path to the optimizer YAML or JSON document
    #[arg(long, required = true)]
    optimizer: Option<PathBuf>,

    /// Maximum minutes to wait for the trial to finish; 0 = do not wait,
    /// < 0 = wait forever
    #[arg(long, default_value_t = 0)]
    maxwait: i64,

    /// Polling interval in minutes, used when maxwait != 0
    #[arg(long, default_value_t = 1)]
    sleepdur: u64,

    /// Experiment-tracking service URL
    #[arg(
        long,
        env = "OPTRUN_SERVICE_URL",
        default_value = "http://localhost:8080"
    )]
    service_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "optrun_cli=info,optrun_client=info,optrun_auth=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        service_url: cli.service_url.clone(),
    };

    match cli.command {
        Some(command) => handle_command(command, &config).await,
        None => {
            let args = RunArgs {
                experiment: cli.experiment.context("--experiment is required")?,
                optimizer: cli.optimizer.context("--optimizer is required")?,
                maxwait: cli.maxwait,
                sleepdur: cli.sleepdur,
            };
            commands::run::handle_run(args, &config).await
        }
    }
}
