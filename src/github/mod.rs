//! GitHub API access.
//!
//! This module provides the fetcher abstraction used by the batch
//! scheduler and its `reqwest` implementation.

pub mod client;
#[cfg(test)]
pub mod fake;

pub use client::{ClientConfig, GithubClient, MetadataFetcher};
