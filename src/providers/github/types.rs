use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CiScopeError, Result};

/// Maximum number of characters kept from a workflow definition file.
pub const DEFINITION_MAX_CHARS: usize = 3000;

/// Repository coordinates on the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses `owner/repo`.
    pub fn parse(path: &str) -> Result<Self> {
        let parts: Vec<&str> = path.split('/').collect();
        match parts.as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(Self::new(*owner, *name)),
            _ => Err(CiScopeError::InvalidRepository(path.to_string())),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// GitHub Actions workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Unique identifier for the workflow run
    pub id: u64,
    /// Name of the workflow
    #[serde(default)]
    pub name: Option<String>,
    /// Status of the run (queued, in_progress, completed, ...)
    #[serde(default)]
    pub status: String,
    /// Conclusion of the run (success, failure, etc.)
    #[serde(default)]
    pub conclusion: Option<String>,
    /// When the run was created
    pub created_at: DateTime<Utc>,
    /// When the run was updated
    pub updated_at: DateTime<Utc>,
    /// Attempt number of this run
    #[serde(default = "default_run_attempt")]
    pub run_attempt: u32,
    /// Head branch or tag name
    #[serde(default)]
    pub head_branch: Option<String>,
    /// Event that triggered the run
    #[serde(default)]
    pub event: Option<String>,
    /// Web URL of the run
    #[serde(default)]
    pub html_url: Option<String>,
}

fn default_run_attempt() -> u32 {
    1
}

/// A workflow file from `.github/workflows`, truncated to
/// [`DEFINITION_MAX_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub file_name: String,
    pub content: String,
    /// `name:` declared in the workflow, if the YAML could be read.
    pub workflow_name: Option<String>,
    /// Job ids declared under `jobs:`, if the YAML could be read.
    pub jobs: Vec<String>,
}

impl WorkflowDefinition {
    pub fn new(file_name: impl Into<String>, raw: &str) -> Self {
        let (workflow_name, jobs) = outline(raw);
        Self {
            file_name: file_name.into(),
            content: truncate_chars(raw, DEFINITION_MAX_CHARS).to_string(),
            workflow_name,
            jobs,
        }
    }
}

impl fmt::Display for WorkflowDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File: {}\n{}", self.file_name, self.content)
    }
}

#[derive(Deserialize)]
struct WorkflowOutline {
    name: Option<String>,
    #[serde(default)]
    jobs: serde_yaml::Mapping,
}

/// Best effort: unreadable YAML yields no name and no jobs.
fn outline(raw: &str) -> (Option<String>, Vec<String>) {
    match serde_yaml::from_str::<WorkflowOutline>(raw) {
        Ok(outline) => {
            let jobs = outline
                .jobs
                .keys()
                .filter_map(|key| key.as_str().map(str::to_string))
                .collect();
            (outline.name, jobs)
        }
        Err(_) => (None, Vec::new()),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Response from GitHub API for workflow runs.
#[derive(Deserialize)]
pub(super) struct WorkflowRunsResponse {
    pub workflow_runs: Vec<WorkflowRun>,
}

/// One entry of a repository contents listing.
#[derive(Debug, Deserialize)]
pub(super) struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub download_url: Option<String>,
}

impl ContentEntry {
    pub fn is_workflow_file(&self) -> bool {
        self.kind == "file" && (self.name.ends_with(".yml") || self.name.ends_with(".yaml"))
    }
}

/// Links for GitHub resources.
pub mod links {
    /// Generate URL for a workflow run.
    pub fn workflow_run_url(owner: &str, repo: &str, run_id: u64) -> String {
        format!("https://github.com/{owner}/{repo}/actions/runs/{run_id}")
    }
}
