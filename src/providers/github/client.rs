use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::auth::Token;
use crate::error::{CiScopeError, Result};

use super::types::{ContentEntry, Repository, WorkflowRun, WorkflowRunsResponse};

/// Header carrying the remaining request quota.
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

const API_VERSION_HEADER: &str = "x-github-api-version";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const WORKFLOWS_DIR: &str = ".github/workflows";

/// Result of one attempt to download a run's log archive.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Raw archive bytes.
    Ok(Vec<u8>),
    /// Logs expired or never existed.
    NotFound,
    /// Quota exhausted; worth retrying after a pause.
    RateLimited,
    Failed(CiScopeError),
}

/// GitHub REST API client for workflow data.
#[derive(Clone)]
pub struct GitHubClient {
    /// HTTP client
    client: Client,
    /// Base URL for GitHub API
    base_url: Url,
}

impl GitHubClient {
    /// Create a new GitHub API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitHub API base URL (e.g., "https://api.github.com")
    /// * `token` - Optional GitHub personal access token
    /// * `api_version` - Value sent as `X-GitHub-Api-Version`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or a header value is invalid.
    pub fn new(base_url: &str, token: Option<Token>, api_version: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("ciscope/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert(
            HeaderName::from_static(API_VERSION_HEADER),
            HeaderValue::from_str(api_version)
                .map_err(|e| CiScopeError::Config(format!("Invalid API version: {e}")))?,
        );

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                .map_err(|e| CiScopeError::Config(format!("Invalid token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        // Redirects are followed by default; run logs are served from a signed URL.
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| CiScopeError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut base_url = Url::parse(base_url)
            .map_err(|e| CiScopeError::Config(format!("Invalid base URL: {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    fn repo_url(&self, repo: &Repository, rest: &str) -> Result<Url> {
        self.base_url
            .join(&format!("repos/{}/{}/{rest}", repo.owner, repo.name))
            .map_err(|e| CiScopeError::Config(format!("Invalid repository URL: {e}")))
    }

    /// Fetch the most recent workflow runs, newest first.
    pub async fn fetch_workflow_runs(
        &self,
        repo: &Repository,
        limit: usize,
    ) -> Result<Vec<WorkflowRun>> {
        let mut url = self.repo_url(repo, "actions/runs")?;
        url.query_pairs_mut()
            .append_pair("per_page", &limit.clamp(1, 100).to_string());

        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;
        let body: WorkflowRunsResponse = decode_json(response).await?;

        let mut runs = body.workflow_runs;
        runs.truncate(limit);
        Ok(runs)
    }

    /// List workflow files under `.github/workflows`.
    ///
    /// A missing directory is an empty listing, not an error.
    pub(super) async fn list_workflow_files(
        &self,
        repo: &Repository,
    ) -> Result<Vec<ContentEntry>> {
        let url = self.repo_url(repo, &format!("contents/{WORKFLOWS_DIR}"))?;
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let response = ensure_success(response).await?;
        let entries: Vec<ContentEntry> = decode_json(response).await?;

        Ok(entries.into_iter().filter(ContentEntry::is_workflow_file).collect())
    }

    /// Read one workflow file's raw text.
    pub(super) async fn fetch_file_content(
        &self,
        repo: &Repository,
        entry: &ContentEntry,
    ) -> Result<String> {
        let request = match &entry.download_url {
            Some(download_url) => self.client.get(download_url.as_str()),
            None => self
                .client
                .get(self.repo_url(repo, &format!("contents/{}", entry.path))?)
                .header(ACCEPT, RAW_MEDIA_TYPE),
        };

        let response = ensure_success(request.send().await?).await?;
        Ok(response.text().await?)
    }

    /// Single attempt at downloading a run's log archive.
    pub async fn request_run_logs(&self, repo: &Repository, run_id: u64) -> FetchOutcome {
        let url = match self.repo_url(repo, &format!("actions/runs/{run_id}/logs")) {
            Ok(url) => url,
            Err(e) => return FetchOutcome::Failed(e),
        };

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failed(e.into()),
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return FetchOutcome::NotFound;
        }
        if is_rate_limited(status, response.headers()) {
            return FetchOutcome::RateLimited;
        }
        if !status.is_success() {
            return FetchOutcome::Failed(api_error(response).await);
        }

        match response.bytes().await {
            Ok(bytes) => FetchOutcome::Ok(bytes.to_vec()),
            Err(e) => FetchOutcome::Failed(e.into()),
        }
    }
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    status == StatusCode::FORBIDDEN
        && headers
            .get(RATE_LIMIT_REMAINING)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|remaining| remaining.trim() == "0")
}

async fn api_error(response: reqwest::Response) -> CiScopeError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    CiScopeError::Api { status, message }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(api_error(response).await)
    }
}

/// Malformed bodies surface as `Json` errors, which are never retried.
async fn decode_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
