//! Read-only GitHub REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;

use super::models::{CommitInfo, TreeResponse};
use crate::error::FetchError;
use crate::{Error, Result};

/// Result type for remote directory requests.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Identifying client name sent with every request.
pub const USER_AGENT: &str = "Lang-Monitor";

/// v3 JSON media type.
pub const ACCEPT_V3: &str = "application/vnd.github.v3+json";

/// Fixed per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only queries against a source-control host.
///
/// Errors are returned as values so callers can log and move on to the
/// next item without aborting the run.
#[async_trait]
pub trait RepoClient: Send + Sync {
    /// Most recent commit touching `path` on `branch`.
    ///
    /// `Ok(None)` means the path has no commit history.
    async fn latest_commit(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> FetchResult<Option<CommitInfo>>;

    /// All file paths of `branch`, recursively, in API order.
    async fn file_tree(&self, repo: &str, branch: &str) -> FetchResult<Vec<String>>;
}

/// GitHub implementation of [`RepoClient`].
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client for `api_url` (e.g. `https://api.github.com`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Whether requests carry a bearer credential.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> FetchResult<T> {
        let url = format!("{}{endpoint}", self.api_url);

        let mut request = self.http.get(&url).header(ACCEPT, ACCEPT_V3).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown"),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Unknown(format!("invalid response body: {e}")))
    }
}

#[async_trait]
impl RepoClient for GitHubClient {
    async fn latest_commit(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> FetchResult<Option<CommitInfo>> {
        let endpoint = format!("/repos/{repo}/commits");
        let commits: Vec<CommitInfo> = self
            .get_json(
                &endpoint,
                &[("sha", branch), ("path", path), ("per_page", "1")],
            )
            .await?;
        Ok(commits.into_iter().next())
    }

    async fn file_tree(&self, repo: &str, branch: &str) -> FetchResult<Vec<String>> {
        let endpoint = format!("/repos/{repo}/git/trees/{branch}");
        let tree: TreeResponse = self.get_json(&endpoint, &[("recursive", "1")]).await?;

        if tree.truncated {
            tracing::warn!(repo, branch, "File tree truncated by the API, pattern matches may be incomplete");
        }

        Ok(tree.into_blob_paths())
    }
}

fn transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        FetchError::Network(e.to_string())
    } else {
        FetchError::Unknown(e.to_string())
    }
}
