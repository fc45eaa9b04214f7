//! Error types for a refresh run.
//!
//! Every fallible step of a run returns [`RefreshError`]; only the entry
//! point decides how a failure ends the process.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a refresh run.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Missing or invalid settings (e.g. no API token, zero batch size).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A configured URL does not name a GitHub repository.
    #[error("not a GitHub repository: {0}")]
    InvalidRepository(String),

    /// The request could not be sent or its body could not be decoded.
    #[error("request for {repo} failed: {source}")]
    Network {
        repo: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("request for {repo} returned HTTP {status}")]
    Status { repo: String, status: u16 },

    /// Reading or writing the data directory failed.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The latest pointer file exists but cannot be understood.
    #[error("unreadable pointer file {}: {reason}", path.display())]
    Pointer { path: PathBuf, reason: String },
}

impl RefreshError {
    /// Wrap an I/O error with the path it happened on.
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RefreshError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RefreshError>;
