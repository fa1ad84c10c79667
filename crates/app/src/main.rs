//! TrailSync binary
//!
//! `trailsync sync` runs one synchronization pass directly; `trailsync
//! serve` hosts the small web front-end for authorization and run
//! triggering.

mod server;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use trailsync_core::SyncRunner;
use trailsync_domain::{Config, Result, TrailSyncError};
use trailsync_infra::config::loader;
use trailsync_infra::{
    AccessTokenProvider, GoogleCalendarStore, GoogleDriveStore, OAuthTokenProvider,
};

#[derive(Debug, Parser)]
#[command(
    name = "trailsync",
    about = "Sync GPS track recordings from Google Drive into Google Calendar",
    version
)]
struct Cli {
    /// Path to a config file (default: probe config.json / config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one synchronization pass
    Sync,
    /// Host the authorization and run-trigger front-end
    Serve,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match &e {
            TrailSyncError::Auth(_) => error!(
                "The credentials have been revoked or expired, \
                 please re-run authorization: {e}"
            ),
            _ => error!("{e}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => loader::load_from_file(Some(path))?,
        None => loader::load()?,
    };

    match cli.command {
        Command::Sync => run_sync(&config).await,
        Command::Serve => server::serve(config).await,
    }
}

async fn run_sync(config: &Config) -> Result<()> {
    let refresh_token = config.google.refresh_token.clone().ok_or_else(|| {
        TrailSyncError::Auth(
            "no refresh token configured; run 'trailsync serve' and authorize first"
                .to_string(),
        )
    })?;

    let tokens: Arc<dyn AccessTokenProvider> =
        Arc::new(OAuthTokenProvider::new(&config.google, refresh_token));

    let summary = build_runner(config, tokens).run().await?;

    info!(
        folder = %summary.folder,
        calendar = %summary.calendar,
        added = summary.total_added,
        parsed = summary.total_parsed,
        failed = summary.total_failed,
        "synchronization finished"
    );

    Ok(())
}

/// Wire the Google adapters and the runner for one pass
pub(crate) fn build_runner(config: &Config, tokens: Arc<dyn AccessTokenProvider>) -> SyncRunner {
    let files = Arc::new(GoogleDriveStore::new(tokens.clone()));
    let calendar = Arc::new(GoogleCalendarStore::new(tokens));

    SyncRunner::new(
        files,
        calendar,
        config.sync.folder_name.clone(),
        config.sync.calendar_name.clone(),
    )
}
