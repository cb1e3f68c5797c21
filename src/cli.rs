use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "gphotos-dl",
    about = "Download a Google Photos library into a date-organized local tree"
)]
pub struct Cli {
    /// Account name the persisted credential file is keyed by
    #[arg(short = 'a', long)]
    pub account: String,

    /// Local directory downloads are organized under
    #[arg(short = 'o', long)]
    pub output: String,

    /// Report what would be downloaded without touching the network or disk
    #[arg(long)]
    pub dry_run: bool,

    /// Only authenticate (create or refresh the persisted credential)
    #[arg(long)]
    pub auth_only: bool,

    /// Directory holding per-account credential files
    #[arg(long, default_value = ".")]
    pub token_directory: String,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}
