//! Retrieves GitHub Actions run history and logs for a repository and turns
//! raw CI output into normalized lint, test and coverage records.
//!
//! The entry point is [`GitHubProvider`]: [`GitHubProvider::analyze`] applies
//! the "has CI/CD" gate, [`GitHubProvider::fetch_logs`] downloads run logs
//! and [`analyze_logs`] parses them.

pub mod analysis;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod logging;
pub mod model;
pub mod output;
pub mod parsers;
pub mod providers;

pub use analysis::{analyze_logs, analyze_text};
pub use error::{CiScopeError, Result};
pub use gate::{CiGate, GateVerdict};
pub use model::{
    AnalysisReport, Category, CoverageReport, FailingTest, Finding, LintTool, LogAnalysis,
    RepositoryAnalysis, RunLogs, Severity, TestExecutionResult,
};
pub use parsers::{parse_coverage, parse_lint, parse_tests};
pub use providers::github::{GitHubProvider, RetryPolicy};
