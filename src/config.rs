//! Configuration file handling.
//!
//! This module handles loading `.repometa.toml`, merging it with CLI and
//! environment overrides, and resolving the final run [`Settings`].

use crate::error::RefreshError;
use crate::github::ClientConfig;
use crate::repo::default_repository_urls;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".repometa.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// GitHub API settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Batching and rate limiting.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Where snapshots are stored.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Refresh cadence.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Repositories to refresh.
    #[serde(default)]
    pub repos: ReposConfig,
}

/// GitHub API settings. The token is never read from the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com/".to_string()
}

fn default_user_agent() -> String {
    format!("repometa/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> u64 {
    30
}

/// Batching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Requests issued concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_batch_size() -> usize {
    10
}

fn default_delay_ms() -> u64 {
    3000
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Refresh cadence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Minimum age of the latest snapshot before a new one is fetched.
    #[serde(default = "default_min_interval")]
    pub min_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval(),
        }
    }
}

fn default_min_interval() -> u64 {
    crate::staleness::default_min_interval().num_seconds().unsigned_abs()
}

/// Repository list settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReposConfig {
    /// Repository URLs, e.g. `https://github.com/owner/name`.
    #[serde(default = "default_repository_urls")]
    pub urls: Vec<String>,
}

impl Default for ReposConfig {
    fn default() -> Self {
        Self {
            urls: default_repository_urls(),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments and environment variables take precedence over config
    /// file settings; unset arguments leave the file values alone.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(batch_size) = args.batch_size {
            self.fetch.batch_size = batch_size;
        }
        if let Some(delay) = args.delay {
            self.fetch.delay_ms = delay;
        }
        if let Some(ref api_url) = args.api_url {
            self.github.api_url = api_url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.github.timeout_seconds = timeout;
        }
        if let Some(ref data_dir) = args.data_dir {
            self.storage.data_dir = data_dir.clone();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client: ClientConfig,
    pub batch_size: usize,
    pub delay: Duration,
    pub min_interval: chrono::Duration,
    pub data_dir: PathBuf,
    pub repositories: Vec<String>,
    /// Skip the staleness check.
    pub force: bool,
}

impl Settings {
    /// Validate the merged configuration and attach the credential.
    pub fn resolve(
        config: &Config,
        token: Option<&str>,
        repositories: Vec<String>,
        force: bool,
    ) -> std::result::Result<Self, RefreshError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                RefreshError::Configuration("no credentials found (set TOKEN)".to_string())
            })?;

        if config.fetch.batch_size == 0 {
            return Err(RefreshError::Configuration(
                "batch size must be at least 1".to_string(),
            ));
        }
        if config.github.timeout_seconds == 0 {
            return Err(RefreshError::Configuration(
                "timeout must be at least 1 second".to_string(),
            ));
        }
        if !config.github.api_url.starts_with("http://")
            && !config.github.api_url.starts_with("https://")
        {
            return Err(RefreshError::Configuration(format!(
                "API URL must start with 'http://' or 'https://': {}",
                config.github.api_url
            )));
        }

        let min_interval_secs = i64::try_from(config.schedule.min_interval_secs)
            .map_err(|_| RefreshError::Configuration("min_interval_secs is too large".into()))?;

        Ok(Self {
            client: ClientConfig {
                api_url: config.github.api_url.clone(),
                token: token.to_string(),
                user_agent: config.github.user_agent.clone(),
                timeout: Duration::from_secs(config.github.timeout_seconds),
            },
            batch_size: config.fetch.batch_size,
            delay: Duration::from_millis(config.fetch.delay_ms),
            min_interval: chrono::Duration::seconds(min_interval_secs),
            data_dir: config.storage.data_dir.clone(),
            repositories,
            force,
        })
    }
}
