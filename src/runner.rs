//! One refresh run, from staleness check to the new latest pointer.

use crate::batch::{aggregate, fetch_all};
use crate::config::Settings;
use crate::error::Result;
use crate::github::MetadataFetcher;
use crate::progress::ProgressSink;
use crate::repo::normalize_all;
use crate::staleness::{next_due, should_refresh};
use crate::storage::DataDir;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// How a run ended when nothing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A new snapshot was written and `latest` points at it.
    Refreshed {
        snapshot_path: PathBuf,
        repositories: usize,
    },
    /// The latest snapshot is still fresh; nothing was fetched.
    NotDue {
        last_update: DateTime<Utc>,
        next_due: DateTime<Utc>,
    },
}

/// Runs the refresh pipeline against a fetcher and a data directory.
pub struct Runner<'a, F: MetadataFetcher + ?Sized> {
    settings: &'a Settings,
    fetcher: &'a F,
    data_dir: DataDir,
    sink: &'a dyn ProgressSink,
}

impl<'a, F: MetadataFetcher + ?Sized> Runner<'a, F> {
    pub fn new(settings: &'a Settings, fetcher: &'a F, sink: &'a dyn ProgressSink) -> Self {
        Self {
            settings,
            fetcher,
            data_dir: DataDir::new(settings.data_dir.clone()),
            sink,
        }
    }

    /// Execute one run as of `now`.
    ///
    /// Any error leaves the previous snapshot and pointer untouched.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        if self.settings.force {
            // A forced run never reads the pointer, so a damaged one is replaced.
            info!("Forced refresh, skipping staleness check");
        } else {
            debug!("Checking if updating is needed");
            let pointer = self.data_dir.read_pointer()?;
            if !should_refresh(pointer.as_ref(), now, self.settings.min_interval) {
                if let Some(pointer) = pointer {
                    return Ok(RunOutcome::NotDue {
                        last_update: pointer.created_at,
                        next_due: next_due(&pointer, self.settings.min_interval),
                    });
                }
            }
        }

        let repos = normalize_all(&self.settings.repositories)?;

        info!("Writing repository list to disk");
        self.data_dir.write_repo_list(&self.settings.repositories)?;

        info!(
            "Fetching metadata for {} repositories (batch size {}, delay {}ms)",
            repos.len(),
            self.settings.batch_size,
            self.settings.delay.as_millis()
        );
        let batches = fetch_all(
            self.fetcher,
            &repos,
            self.settings.batch_size,
            self.settings.delay,
            self.sink,
        )
        .await?;
        let snapshot = aggregate(batches);
        if snapshot.is_empty() {
            warn!("No repositories configured, writing an empty snapshot");
        }

        info!("Writing metadata to disk");
        let snapshot_path = self.data_dir.persist(&snapshot, now)?;

        Ok(RunOutcome::Refreshed {
            snapshot_path,
            repositories: snapshot.len(),
        })
    }
}
