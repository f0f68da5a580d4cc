use chrono::Utc;
use futures::stream::{self, StreamExt};
use log::{info, warn};
use std::collections::HashSet;

use crate::analysis::analyze_logs;
use crate::auth::Token;
use crate::error::Result;
use crate::gate::CiGate;
use crate::logging::LogScope;
use crate::model::{AnalysisReport, RepositoryAnalysis, RunLogs};
use crate::output::PhaseProgress;

use super::client::GitHubClient;
use super::logs::{LogFetcher, RetryPolicy};
use super::types::{Repository, WorkflowDefinition, WorkflowRun};

const DEFAULT_MAX_RUNS: usize = 10;
const DEFAULT_CONCURRENCY: usize = 4;

/// Collects CI/CD evidence for GitHub repositories.
///
/// Each call is independent; the provider only holds the HTTP client and
/// settings, so one instance can analyze any number of repositories.
pub struct GitHubProvider {
    /// GitHub API client
    client: GitHubClient,
    retry: RetryPolicy,
    max_runs: usize,
    concurrency: usize,
    show_progress: bool,
    scope: LogScope,
}

impl GitHubProvider {
    /// Create a new GitHub Actions provider.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitHub API base URL
    /// * `token` - Optional GitHub personal access token
    /// * `api_version` - REST API version header value
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be configured.
    pub fn new(base_url: &str, token: Option<Token>, api_version: &str) -> Result<Self> {
        Ok(Self {
            client: GitHubClient::new(base_url, token, api_version)?,
            retry: RetryPolicy::default(),
            max_runs: DEFAULT_MAX_RUNS,
            concurrency: DEFAULT_CONCURRENCY,
            show_progress: false,
            scope: LogScope::new("ciscope::provider"),
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_max_runs(mut self, max_runs: usize) -> Self {
        self.max_runs = max_runs;
        self
    }

    /// Number of run logs downloaded in parallel. `1` is strictly sequential.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn repo_scope(&self, repo: &Repository) -> LogScope {
        self.scope.with("owner", &repo.owner).with("repo", &repo.name)
    }

    /// Fetches runs and definitions and applies the disqualification gate.
    ///
    /// # Errors
    ///
    /// Returns an error if listing runs or workflow files fails. A missing
    /// workflows directory is not an error.
    pub async fn analyze(&self, owner: &str, repo: &str) -> Result<RepositoryAnalysis> {
        let repo = Repository::new(owner, repo);
        let runs = self.client.fetch_workflow_runs(&repo, self.max_runs).await?;
        let definitions = self.fetch_definitions(&repo).await?;
        Ok(self.judge(&repo, runs, definitions))
    }

    fn judge(
        &self,
        repo: &Repository,
        runs: Vec<WorkflowRun>,
        definitions: Vec<WorkflowDefinition>,
    ) -> RepositoryAnalysis {
        let verdict = CiGate::evaluate(&runs, &definitions);
        let scope = self.repo_scope(repo);
        info!(
            target: scope.target(),
            "{scope} runs={} definitions={} disqualified={}",
            runs.len(),
            definitions.len(),
            verdict.disqualified
        );

        RepositoryAnalysis {
            runs,
            definitions,
            disqualified: verdict.disqualified,
            reason: verdict.reason,
        }
    }

    /// Reads every workflow file. Files that fail to download are skipped.
    pub async fn fetch_definitions(&self, repo: &Repository) -> Result<Vec<WorkflowDefinition>> {
        let scope = self.repo_scope(repo);
        let entries = self.client.list_workflow_files(repo).await?;

        let mut definitions = Vec::with_capacity(entries.len());
        for entry in &entries {
            match self.client.fetch_file_content(repo, entry).await {
                Ok(raw) => definitions.push(WorkflowDefinition::new(entry.name.clone(), &raw)),
                Err(e) => warn!(
                    target: scope.target(),
                    "{scope} file={} unreadable: {e}",
                    entry.path
                ),
            }
        }
        Ok(definitions)
    }

    /// Lists the latest `max_runs` runs and downloads their logs.
    ///
    /// # Errors
    ///
    /// Returns an error only if the run listing fails; per-run log failures
    /// are logged and leave that run's `log_text` empty.
    pub async fn fetch_logs(
        &self,
        owner: &str,
        repo: &str,
        max_runs: usize,
    ) -> Result<Vec<RunLogs>> {
        let repo = Repository::new(owner, repo);
        let runs = self.client.fetch_workflow_runs(&repo, max_runs).await?;
        Ok(self.fetch_logs_for_runs(&repo, runs).await)
    }

    /// Downloads logs for already listed runs, preserving their order.
    pub async fn fetch_logs_for_runs(
        &self,
        repo: &Repository,
        runs: Vec<WorkflowRun>,
    ) -> Vec<RunLogs> {
        let scope = self.repo_scope(repo);
        let fetcher = LogFetcher::new(&self.client, self.retry, scope.clone());

        stream::iter(runs)
            .map(|run| {
                let fetcher = &fetcher;
                let scope = &scope;
                async move {
                    let log_text = match fetcher.fetch_run_logs(repo, run.id).await {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(
                                target: scope.target(),
                                "{scope} run_id={} logs unavailable: {e}",
                                run.id
                            );
                            None
                        }
                    };
                    RunLogs { run, log_text }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Runs the whole pipeline: gate, log download and parsing.
    ///
    /// Progress is displayed in three phases:
    /// 1. Fetching runs and workflow definitions
    /// 2. Fetching run logs (skipped when `fetch_logs` is false)
    /// 3. Parsing logs
    ///
    /// # Errors
    ///
    /// Returns an error if runs or workflow files cannot be listed.
    pub async fn collect_report(
        &self,
        owner: &str,
        repo: &str,
        known_paths: Option<&HashSet<String>>,
        fetch_logs: bool,
    ) -> Result<AnalysisReport> {
        let repository = Repository::new(owner, repo);
        let scope = self.repo_scope(&repository);
        info!(target: scope.target(), "{scope} starting analysis");

        let progress = PhaseProgress::start_phase_1(self.show_progress);
        let analysis = self.analyze(owner, repo).await?;

        let progress = progress.finish_phase_1_start_phase_2(analysis.runs.len());
        let run_logs = if fetch_logs {
            self.fetch_logs_for_runs(&repository, analysis.runs.clone())
                .await
        } else {
            Vec::new()
        };

        let progress = progress.finish_phase_2_start_phase_3();
        let logs = analyze_logs(&run_logs, known_paths, &scope);
        progress.finish_phase_3();

        Ok(AnalysisReport {
            repository: repository.to_string(),
            generated_at: Utc::now(),
            analysis,
            logs,
        })
    }
}
