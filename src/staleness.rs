//! Refresh cadence check.
//!
//! A refresh is due when no snapshot has been recorded yet, or when the
//! recorded one is at least `min_interval` old.

use crate::models::LatestPointer;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Default spacing between two refreshes.
pub fn default_min_interval() -> Duration {
    Duration::hours(1)
}

/// Decide whether a new fetch cycle should run.
pub fn should_refresh(
    pointer: Option<&LatestPointer>,
    now: DateTime<Utc>,
    min_interval: Duration,
) -> bool {
    let Some(pointer) = pointer else {
        debug!("No previous snapshot recorded");
        return true;
    };

    let elapsed = now.signed_duration_since(pointer.created_at);
    debug!(
        "Last snapshot {} written {}s ago",
        pointer.path.display(),
        elapsed.num_seconds()
    );

    elapsed >= min_interval
}

/// When the next refresh becomes due.
pub fn next_due(pointer: &LatestPointer, min_interval: Duration) -> DateTime<Utc> {
    pointer.created_at + min_interval
}
