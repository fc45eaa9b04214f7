//! Merging per-batch results into one snapshot.

use crate::models::{FetchResult, MetadataSnapshot};

/// Concatenate batch results in batch order, then within-batch order.
///
/// Entry `i` of the snapshot belongs to repository `i` of the input list.
pub fn aggregate(batches: Vec<Vec<FetchResult>>) -> MetadataSnapshot {
    MetadataSnapshot::new(batches.into_iter().flatten().collect())
}
