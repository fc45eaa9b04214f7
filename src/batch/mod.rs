//! Batch fetching and aggregation.
//!
//! This module provides the rate-limited scheduler that fetches
//! repository metadata and the aggregator that merges its output.

pub mod aggregator;
pub mod scheduler;

pub use aggregator::aggregate;
pub use scheduler::fetch_all;
