//! HTTP client for repository metadata.

use crate::error::{RefreshError, Result};
use crate::models::{FetchResult, RepositoryRef};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::debug;

/// Fetches the metadata of one repository.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, repo: &RepositoryRef) -> Result<FetchResult>;
}

/// Connection settings for [`GithubClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, e.g. `https://api.github.com/`.
    pub api_url: String,
    pub token: String,
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// `GET {api_url}repos/{owner}/{name}` with bearer authentication.
pub struct GithubClient {
    http_client: reqwest::Client,
    api_url: String,
}

impl GithubClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| RefreshError::Configuration("token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| RefreshError::Configuration(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_url: normalize_base(&config.api_url),
        })
    }

    /// Full request URL for a repository.
    pub fn repo_url(&self, repo: &RepositoryRef) -> String {
        format!("{}repos/{}", self.api_url, repo)
    }
}

fn normalize_base(api_url: &str) -> String {
    format!("{}/", api_url.trim_end_matches('/'))
}

#[async_trait]
impl MetadataFetcher for GithubClient {
    async fn fetch(&self, repo: &RepositoryRef) -> Result<FetchResult> {
        let url = self.repo_url(repo);
        debug!("Fetching {}", url);

        let network = |source: reqwest::Error| RefreshError::Network {
            repo: repo.to_string(),
            source,
        };

        let response = self.http_client.get(&url).send().await.map_err(network)?;

        if !response.status().is_success() {
            return Err(RefreshError::Status {
                repo: repo.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.json::<FetchResult>().await.map_err(network)
    }
}
