//! In-memory fetcher for tests.

use crate::error::{RefreshError, Result};
use crate::github::MetadataFetcher;
use crate::models::{FetchResult, RepositoryRef};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Answers `{"full_name": <repo>}` for every repository, optionally after a
/// latency, and fails with HTTP 500 for the repositories in `failing`.
#[derive(Default)]
pub struct FakeFetcher {
    failing: HashSet<String>,
    latency: Option<Duration>,
    calls: Mutex<Vec<(String, Instant)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, repo: &str) -> Self {
        self.failing.insert(repo.to_string());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Repositories requested so far with the instant each request started.
    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataFetcher for FakeFetcher {
    async fn fetch(&self, repo: &RepositoryRef) -> Result<FetchResult> {
        self.calls
            .lock()
            .unwrap()
            .push((repo.to_string(), Instant::now()));

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(repo.as_str()) {
            return Err(RefreshError::Status {
                repo: repo.to_string(),
                status: 500,
            });
        }

        Ok(json!({ "full_name": repo.as_str() }))
    }
}
