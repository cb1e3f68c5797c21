use std::path::PathBuf;

use crate::cli::Cli;

/// Application configuration resolved from the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    pub account: String,
    pub output: PathBuf,
    pub token_directory: PathBuf,
    pub dry_run: bool,
    pub auth_only: bool,
    pub no_progress_bar: bool,
}

/// Expand ~ to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Config {
    pub fn from_cli(cli: Cli) -> Self {
        Self {
            account: cli.account,
            output: expand_tilde(&cli.output),
            token_directory: expand_tilde(&cli.token_directory),
            dry_run: cli.dry_run,
            auth_only: cli.auth_only,
            no_progress_bar: cli.no_progress_bar,
        }
    }
}
