//! RepoMeta - GitHub repository metadata snapshots
//!
//! A CLI tool that fetches metadata for a list of GitHub repositories in
//! rate-limited batches and stores it as timestamped JSON snapshots.
//!
//! Exit codes:
//!   0 - Success (snapshot written)
//!   1 - Runtime or usage error (missing token, bad argument, network, filesystem)
//!   2 - Refresh not due yet (latest snapshot is still fresh)

mod batch;
mod cli;
mod config;
mod error;
mod github;
mod models;
mod progress;
mod repo;
mod runner;
mod staleness;
mod storage;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, Settings, DEFAULT_CONFIG_FILE};
use github::GithubClient;
use runner::{RunOutcome, Runner};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit code when the latest snapshot is still fresh.
const EXIT_NOT_DUE: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments; usage errors must not look like "not due"
    let args = match Args::parse_args() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            std::process::exit(Args::usage_exit_code(&e));
        }
    };

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("RepoMeta v{}", env!("CARGO_PKG_VERSION"));

    let result = run_refresh(&args).await;
    if let Err(ref e) = result {
        error!("Refresh failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
    }
    std::process::exit(exit_code(&result));
}

/// Map the result of a run to the process exit code.
fn exit_code(result: &Result<RunOutcome>) -> i32 {
    match result {
        Ok(RunOutcome::Refreshed { .. }) => 0,
        Ok(RunOutcome::NotDue { .. }) => EXIT_NOT_DUE,
        Err(_) => 1,
    }
}

/// Handle --init-config: generate a default .repometa.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize the repository list, batching and data directory.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Run one refresh and report how it ended.
async fn run_refresh(args: &Args) -> Result<RunOutcome> {
    let start_time = Instant::now();

    let mut config = load_config(args)?;
    config.merge_with_args(args);

    let repositories = resolve_repositories(args, &config)?;
    let settings = Settings::resolve(&config, args.token.as_deref(), repositories, args.force)?;
    debug!(
        "Settings: batch size {}, delay {:?}, interval {}s, data dir {}",
        settings.batch_size,
        settings.delay,
        settings.min_interval.num_seconds(),
        settings.data_dir.display()
    );

    let client = GithubClient::new(&settings.client)?;
    let sink = progress::sink_for(args.effective_progress(), settings.repositories.len());
    let runner = Runner::new(&settings, &client, sink.as_ref());

    let outcome = runner.run(Utc::now()).await?;

    match &outcome {
        RunOutcome::Refreshed {
            snapshot_path,
            repositories,
        } => {
            if !args.quiet {
                println!("✅ Metadata saved for {} repositories", repositories);
                println!("   Snapshot: {}", snapshot_path.display());
                println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
            }
            info!("Gracefully shutting down");
        }
        RunOutcome::NotDue {
            last_update,
            next_due,
        } => {
            info!(
                "Last update was at {}, next refresh due at {}. Exiting...",
                last_update.format("%Y-%m-%d %H:%M:%S UTC"),
                next_due.format("%Y-%m-%d %H:%M:%S UTC")
            );
            if !args.quiet {
                println!("⏳ Latest snapshot is still fresh, nothing to do.");
            }
        }
    }
    Ok(outcome)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

/// Repository URLs from --readme, else the configured list.
fn resolve_repositories(args: &Args, config: &Config) -> Result<Vec<String>> {
    let Some(ref readme) = args.readme else {
        return Ok(config.repos.urls.clone());
    };

    let markdown = std::fs::read_to_string(readme)
        .with_context(|| format!("Failed to read {}", readme.display()))?;
    let urls = repo::extract_repository_urls(&markdown);
    info!("Found {} repositories in {}", urls.len(), readme.display());

    if urls.is_empty() {
        anyhow::bail!("No GitHub repository links found in {}", readme.display());
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RefreshError;
    use crate::github::fake::FakeFetcher;
    use crate::progress::NoProgress;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn at(ts: &str) -> chrono::DateTime<Utc> {
        ts.parse().unwrap()
    }

    #[test]
    fn test_exit_code_mapping() {
        let refreshed = Ok(RunOutcome::Refreshed {
            snapshot_path: PathBuf::from("data/x-fetched_repo_data.json"),
            repositories: 3,
        });
        let not_due = Ok(RunOutcome::NotDue {
            last_update: at("2024-06-01T12:00:00Z"),
            next_due: at("2024-06-01T13:00:00Z"),
        });
        let failed: Result<RunOutcome> = Err(RefreshError::Status {
            repo: "a/b".to_string(),
            status: 403,
        }
        .into());

        assert_eq!(exit_code(&refreshed), 0);
        assert_eq!(exit_code(&not_due), EXIT_NOT_DUE);
        assert_eq!(exit_code(&failed), 1);
        assert_ne!(EXIT_NOT_DUE, 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_exits_with_one() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = temp.path().join("data");
        config.fetch.delay_ms = 0;
        let settings = Settings::resolve(
            &config,
            Some("token"),
            vec!["https://github.com/weaveworks/weave".to_string()],
            false,
        )
        .unwrap();
        let fetcher = FakeFetcher::new().failing_on("weaveworks/weave");

        let result = Runner::new(&settings, &fetcher, &NoProgress)
            .run(at("2024-06-01T12:00:00Z"))
            .await
            .map_err(anyhow::Error::from);

        assert_eq!(exit_code(&result), 1);
    }
}
