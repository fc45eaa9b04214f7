//! Data models for a metadata refresh.
//!
//! This module contains the values that flow through a run: repository
//! references, the fetched metadata snapshot, and the pointer to the most
//! recent snapshot on disk.

use crate::error::{RefreshError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Decoded response body for one repository.
pub type FetchResult = serde_json::Value;

/// A GitHub repository in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryRef(String);

impl RepositoryRef {
    /// Normalize a configured repository URL to `owner/name`.
    ///
    /// Accepts HTTPS and SSH GitHub URLs (with or without `.git` or a
    /// trailing slash) as well as a bare `owner/name`.
    pub fn from_url(url: &str) -> Result<Self> {
        let trimmed = url.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

        let rest = ["https://github.com/", "http://github.com/", "git@github.com:"]
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
            .unwrap_or(trimmed);

        let mut parts = rest.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None)
                if is_valid_segment(owner) && is_valid_segment(name) =>
            {
                Ok(Self(format!("{}/{}", owner, name)))
            }
            _ => Err(RefreshError::InvalidRepository(url.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid_segment(s: &str) -> bool {
    !s.is_empty()
        && !s.contains(':')
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// All fetched metadata of one run, in repository-list order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataSnapshot(Vec<FetchResult>);

impl MetadataSnapshot {
    pub fn new(entries: Vec<FetchResult>) -> Self {
        Self(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Index<usize> for MetadataSnapshot {
    type Output = FetchResult;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Record stored in the `latest` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestPointer {
    /// Path of the most recently written snapshot.
    pub path: PathBuf,
    /// When that snapshot was written.
    pub created_at: DateTime<Utc>,
}
