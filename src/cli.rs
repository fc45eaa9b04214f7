//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap, including
//! the environment variables the tool has always been driven by
//! (`TOKEN`, `BATCH_SIZE`, `DELAY`, `DEBUG`).

use crate::progress::ProgressMode;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// RepoMeta - GitHub repository metadata snapshots
///
/// Fetches metadata for a list of GitHub repositories in rate-limited
/// batches and stores it as a timestamped JSON snapshot, at most once per
/// refresh interval.
///
/// Examples:
///   TOKEN=ghp_xxx repometa
///   TOKEN=ghp_xxx BATCH_SIZE=5 DELAY=1000 repometa --data-dir ./data
///   repometa --token ghp_xxx --readme README.md
///   repometa --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// GitHub API token (required)
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Number of requests issued concurrently per batch [default: 10]
    #[arg(long, env = "BATCH_SIZE", value_name = "NUM")]
    pub batch_size: Option<usize>,

    /// Pause between batches in milliseconds [default: 3000]
    #[arg(long, env = "DELAY", value_name = "MILLIS")]
    pub delay: Option<u64>,

    /// Enable verbose logging output (`DEBUG` is on unless empty, `0`, `false`, `no` or `off`)
    #[arg(
        long,
        env = "DEBUG",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub debug: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory holding snapshots and the latest pointer [default: data]
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// GitHub API base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds [default: 30]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .repometa.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Take the repository list from the GitHub links of a markdown file
    #[arg(long, value_name = "FILE")]
    pub readme: Option<PathBuf>,

    /// How batch progress is shown
    #[arg(long, default_value = "bar", value_name = "MODE")]
    pub progress: ProgressMode,

    /// Refresh even if the latest snapshot is recent
    #[arg(long)]
    pub force: bool,

    /// Generate a default .repometa.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments and the environment.
    ///
    /// Usage errors are returned instead of exiting, so the caller decides
    /// the exit code.
    pub fn parse_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Exit code for a parse failure: 0 for `--help`/`--version`, 1 otherwise.
    pub fn usage_exit_code(err: &clap::Error) -> i32 {
        if err.use_stderr() {
            1
        } else {
            0
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.debug && self.quiet {
            return Err("Cannot use both --debug and --quiet".to_string());
        }

        if self.batch_size == Some(0) {
            return Err("Batch size must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(ref api_url) = self.api_url {
            if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref readme) = self.readme {
            if !readme.is_file() {
                return Err(format!("Markdown file does not exist: {}", readme.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Progress mode, silenced in quiet mode.
    pub fn effective_progress(&self) -> ProgressMode {
        if self.quiet {
            ProgressMode::None
        } else {
            self.progress
        }
    }
}
