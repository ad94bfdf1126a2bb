//! Relay GitHub infrastructure adapter.
//!
//! Implements [`relay::CommitStatusPublisher`] against the GitHub commit status
//! endpoint, `POST /repos/{owner}/{repo}/statuses/{sha}`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, headers, timeouts and response handling
//! live here. The [`relay`] crate sees only [`relay::CommitStatusPublisher`].

use std::time::Duration;

use async_trait::async_trait;
use relay::{
    AuthToken, CommitStatusPublisher, CommitStatusReport, CommitTarget, RelayError,
    UpstreamService,
};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use tracing::{debug, warn};

/// Public GitHub API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for [`GithubStatusClient`].
#[derive(Debug, Clone)]
pub struct GithubClientConfig {
    /// API base URL without a trailing path (GitHub Enterprise uses
    /// `https://<host>/api/v3`).
    pub api_base_url: String,
    /// Bound applied to the whole request, connect through body.
    pub timeout: Duration,
    /// `User-Agent` sent with every request; GitHub rejects requests without one.
    pub user_agent: String,
}

impl Default for GithubClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("codepipeline-relay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Commit status publisher backed by `reqwest`.
pub struct GithubStatusClient {
    http: reqwest::Client,
    api_base_url: String,
    user_agent: String,
}

impl GithubStatusClient {
    /// Builds a client.
    ///
    /// # Errors
    ///
    /// [`RelayError::ConfigurationError`] if the base URL is not an absolute
    /// URL or the HTTP client cannot be constructed.
    pub fn new(config: GithubClientConfig) -> Result<Self, RelayError> {
        reqwest::Url::parse(&config.api_base_url).map_err(|e| RelayError::ConfigurationError {
            message: format!("invalid GitHub API URL '{}': {e}", config.api_base_url),
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RelayError::ConfigurationError {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent,
        })
    }

    /// Returns the status endpoint for `target`.
    pub fn status_url(&self, target: &CommitTarget) -> String {
        format!(
            "{}/repos/{}/{}/statuses/{}",
            self.api_base_url, target.repository.owner, target.repository.name, target.revision
        )
    }
}

#[async_trait]
impl CommitStatusPublisher for GithubStatusClient {
    async fn publish_status(
        &self,
        target: &CommitTarget,
        report: &CommitStatusReport,
        token: &AuthToken,
    ) -> Result<(), RelayError> {
        let url = self.status_url(target);
        let body = report.to_json()?;

        let response = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("token {}", token.expose()))
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .header(USER_AGENT, &self.user_agent)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                RelayError::upstream_transport(UpstreamService::CommitStatusApi, e.to_string())
            })?;

        let status = response.status();
        // Reading the body to the end returns the connection to the pool on
        // both paths.
        let (text, body_error) = match response.text().await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!(%url, error = %e, "Failed to read GitHub response body");
                (String::new(), Some(e))
            }
        };

        if status == StatusCode::CREATED {
            debug!(%url, "Commit status created");
            return Ok(());
        }

        warn!(%url, status = status.as_u16(), "Unexpected response from GitHub");
        let mut err =
            RelayError::upstream_status(UpstreamService::CommitStatusApi, status.as_u16(), text);
        if let (RelayError::UpstreamError { message, .. }, Some(e)) = (&mut err, body_error) {
            message.push_str(&format!(" (body unreadable: {e})"));
        }
        Err(err)
    }
}
