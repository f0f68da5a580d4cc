use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::providers::github::types::{WorkflowDefinition, WorkflowRun};

/// Key used in a [`CoverageReport`] for the aggregate percentage.
pub const TOTAL_KEY: &str = "TOTAL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }

    /// Higher is worse.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Info => 0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Syntax,
    Import,
    Security,
    Style,
    Complexity,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Syntax => "syntax",
            Category::Import => "import",
            Category::Security => "security",
            Category::Style => "style",
            Category::Complexity => "complexity",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool whose output grammar produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LintTool {
    Flake8,
    Eslint,
    Bandit,
}

impl LintTool {
    pub fn as_str(self) -> &'static str {
        match self {
            LintTool::Flake8 => "flake8",
            LintTool::Eslint => "eslint",
            LintTool::Bandit => "bandit",
        }
    }
}

impl fmt::Display for LintTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized lint or security issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub tool: LintTool,
    pub file: String,
    /// `None` only when the tool's output has no line number.
    pub line: Option<u32>,
    pub code: String,
    pub message: String,
    pub severity: Severity,
    pub category: Category,
    pub recommendation: String,
    /// `true` when `file` was found in the caller's set of repository paths.
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailingTest {
    pub name: String,
    pub message: String,
    /// `"unknown"` when the output doesn't say.
    pub file: String,
    pub line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestExecutionResult {
    pub framework: String,
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub failing_tests: Vec<FailingTest>,
}

impl TestExecutionResult {
    #[allow(clippy::cast_precision_loss)]
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.passed) / f64::from(self.total) * 100.0
        }
    }
}

/// File path (or [`TOTAL_KEY`]) to coverage percentage in `[0, 100]`.
///
/// Insertion order is preserved so repeated parses serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverageReport(IndexMap<String, f64>);

impl CoverageReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `percent` for `key`. Values outside `[0, 100]` are rejected.
    pub fn insert(&mut self, key: impl Into<String>, percent: f64) -> bool {
        if !(0.0..=100.0).contains(&percent) {
            return false;
        }
        self.0.insert(key.into(), percent);
        true
    }

    pub fn total(&self) -> Option<f64> {
        self.0.get(TOTAL_KEY).copied()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Result of the public `analyze` call for one repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryAnalysis {
    pub runs: Vec<WorkflowRun>,
    pub definitions: Vec<WorkflowDefinition>,
    pub disqualified: bool,
    pub reason: Option<String>,
}

/// Run metadata plus its extracted log text, if any could be retrieved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLogs {
    pub run: WorkflowRun,
    pub log_text: Option<String>,
}

/// Parser output for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogAnalysis {
    pub run_id: u64,
    pub run_name: Option<String>,
    pub findings: Vec<Finding>,
    pub tests: Option<TestExecutionResult>,
    pub coverage: CoverageReport,
}

/// Everything collected for one repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub repository: String,
    pub generated_at: DateTime<Utc>,
    pub analysis: RepositoryAnalysis,
    pub logs: Vec<LogAnalysis>,
}

impl AnalysisReport {
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.logs.iter().flat_map(|l| l.findings.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_report_rejects_out_of_range() {
        let mut report = CoverageReport::new();
        assert!(report.insert(TOTAL_KEY, 90.0));
        assert!(!report.insert("a.py", 100.5));
        assert!(!report.insert("b.py", -1.0));
        assert_eq!(report.len(), 1);
        assert_eq!(report.total(), Some(90.0));
    }

    #[test]
    fn test_coverage_report_serializes_as_map() {
        let mut report = CoverageReport::new();
        report.insert(TOTAL_KEY, 81.5);
        report.insert("src/app.py", 70.0);
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"TOTAL":81.5,"src/app.py":70.0}"#);
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        assert!(Severity::Critical.rank() > Severity::Info.rank());
    }

    #[test]
    fn test_pass_rate_handles_zero_total() {
        let result = TestExecutionResult {
            framework: "pytest".to_string(),
            total: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
            failing_tests: vec![],
        };
        assert_eq!(result.pass_rate(), 0.0);
    }
}
