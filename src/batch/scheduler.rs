//! Batched, rate-limited fetching.
//!
//! Repositories are fetched in contiguous batches. Requests within a batch
//! run concurrently and are joined before the next batch starts; a fixed
//! delay separates consecutive batches.

use crate::error::{RefreshError, Result};
use crate::github::MetadataFetcher;
use crate::models::{FetchResult, RepositoryRef};
use crate::progress::{BatchProgress, ProgressSink};
use futures::future::join_all;
use std::time::Duration;
use tracing::debug;

/// Fetch every repository, returning one result vector per batch.
///
/// The delay is slept between batches only, so `n` batches wait `n - 1`
/// times. The first failing repository (by position within its batch)
/// aborts the run before any later batch is started.
pub async fn fetch_all<F>(
    fetcher: &F,
    repos: &[RepositoryRef],
    batch_size: usize,
    delay: Duration,
    sink: &dyn ProgressSink,
) -> Result<Vec<Vec<FetchResult>>>
where
    F: MetadataFetcher + ?Sized,
{
    if batch_size == 0 {
        return Err(RefreshError::Configuration(
            "batch size must be at least 1".to_string(),
        ));
    }

    let total = repos.len();
    let batch_count = total.div_ceil(batch_size);
    let mut batches = Vec::with_capacity(batch_count);
    let mut completed = 0;

    for (batch_index, batch) in repos.chunks(batch_size).enumerate() {
        if batch_index > 0 && !delay.is_zero() {
            debug!("Waiting {}ms before next batch", delay.as_millis());
            tokio::time::sleep(delay).await;
        }

        debug!(
            "Batch {}/{}: {:?}",
            batch_index + 1,
            batch_count,
            batch.iter().map(RepositoryRef::as_str).collect::<Vec<_>>()
        );

        let results = join_all(batch.iter().map(|repo| fetcher.fetch(repo))).await;
        let results = results.into_iter().collect::<Result<Vec<_>>>()?;
        debug!("Batch {}/{} fetched", batch_index + 1, batch_count);

        completed += results.len();
        batches.push(results);

        sink.on_batch(BatchProgress {
            batch_index,
            batch_count,
            completed,
            total,
        });
    }

    sink.on_finish(total);
    Ok(batches)
}
