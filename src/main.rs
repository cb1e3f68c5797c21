//! gphotos-dl — downloads a Google Photos library into a local tree
//! organized by capture date.
//!
//! The pipeline is strictly sequential: authenticate (refreshing or
//! re-running the consent flow as needed), then page through the media
//! listing, routing each descriptor to an image or video download with a
//! live-photo special case. Destinations that already exist are skipped,
//! which makes a full re-run idempotent at the file level.

#![warn(clippy::all)]

mod auth;
mod cli;
mod config;
mod download;
mod photos;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use auth::FileTokenStore;
use photos::{MediaPager, RestSource};

/// Resolve the client-secret path: the environment variable wins, otherwise
/// prompt on stdin. Deliberately not a flag, so the path is supplied fresh
/// per run rather than living in shell history.
fn client_secret_path() -> anyhow::Result<PathBuf> {
    if let Ok(path) = std::env::var("GPHOTOS_CLIENT_SECRET") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Ok(config::expand_tilde(trimmed));
        }
    }

    print!("Client secret file: ");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let trimmed = input.trim();
    if trimmed.is_empty() {
        anyhow::bail!("No client secret file given");
    }
    Ok(config::expand_tilde(trimmed))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let filter = match cli.log_level {
        cli::LogLevel::Debug => "debug",
        cli::LogLevel::Info => "info",
        cli::LogLevel::Warn => "warn",
        cli::LogLevel::Error => "error",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config = config::Config::from_cli(cli);

    // Only bound connection setup: a whole-request timeout would cut off
    // large video downloads.
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .build()?;

    let secret_path = client_secret_path()?;
    let store = FileTokenStore::new(&config.token_directory);
    let credential = auth::authenticate(&client, &config.account, &secret_path, &store)
        .await
        .context("Authentication failed")?;

    if config.auth_only {
        tracing::info!("Authentication completed, exiting");
        return Ok(());
    }

    tracing::info!(account = %config.account, "Listing media items");
    let source = RestSource::new(client.clone(), credential.access_token.clone());
    let mut pager = MediaPager::new(Box::new(source));

    let download_config = download::DownloadConfig {
        output: config.output.clone(),
        dry_run: config.dry_run,
        no_progress_bar: config.no_progress_bar,
    };

    // Per-item failures are tallied in the summary; only auth and listing
    // failures produce a non-zero exit.
    download::run(&client, &mut pager, &download_config)
        .await
        .context("Listing media items failed")?;

    Ok(())
}
