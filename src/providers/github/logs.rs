use log::{error, info, warn};
use std::time::Duration;

use crate::error::Result;
use crate::logging::LogScope;

use super::archive::extract_logs;
use super::client::{FetchOutcome, GitHubClient};
use super::types::Repository;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Retry budget for log downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before retrying after attempt `n` (0-based) is `base_delay * 2^n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Requests made per run. A zero budget still makes one request.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Downloads and extracts run logs with rate-limit aware retries.
pub struct LogFetcher<'a> {
    client: &'a GitHubClient,
    policy: RetryPolicy,
    scope: LogScope,
}

impl<'a> LogFetcher<'a> {
    pub fn new(client: &'a GitHubClient, policy: RetryPolicy, scope: LogScope) -> Self {
        Self {
            client,
            policy,
            scope: scope.for_target("ciscope::logs"),
        }
    }

    /// Extracted log text for one run.
    ///
    /// `Ok(None)` when the logs are gone (404) or every attempt was rate
    /// limited or hit a transport error. Other HTTP failures are returned as
    /// errors for the caller to record against this run.
    pub async fn fetch_run_logs(&self, repo: &Repository, run_id: u64) -> Result<Option<String>> {
        let run_scope = self.scope.with("run_id", run_id);
        let target = run_scope.target();

        let attempts = self.policy.attempts();
        for attempt in 0..attempts {
            let scope = run_scope.with("attempt", attempt + 1);
            let is_last = attempt + 1 == attempts;

            match self.client.request_run_logs(repo, run_id).await {
                FetchOutcome::Ok(bytes) => {
                    return Ok(Some(extract_logs(&bytes, &scope)));
                }
                FetchOutcome::NotFound => {
                    info!(target: target, "{scope} logs not found or expired");
                    return Ok(None);
                }
                FetchOutcome::RateLimited => {
                    warn!(target: target, "{scope} rate limited");
                }
                FetchOutcome::Failed(e) if e.is_transient() => {
                    warn!(target: target, "{scope} transport error: {e}");
                }
                FetchOutcome::Failed(e) => return Err(e),
            }

            if !is_last {
                let delay = self.policy.backoff(attempt);
                warn!(target: target, "{scope} retrying in {}ms", delay.as_millis());
                tokio::time::sleep(delay).await;
            }
        }

        error!(
            target: target,
            "{run_scope} log fetch exhausted after {attempts} attempts"
        );
        Ok(None)
    }
}
