mod archive;
mod client;
mod logs;
mod provider;
pub mod types;


pub use archive::extract_logs;
pub use client::{FetchOutcome, GitHubClient, RATE_LIMIT_REMAINING};
pub use logs::{LogFetcher, RetryPolicy};
pub use provider::GitHubProvider;
pub use types::{Repository, WorkflowDefinition, WorkflowRun};
