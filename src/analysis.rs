//! Runs the lint, test and coverage parsers over each run's log text.

use log::debug;
use std::collections::HashSet;

use crate::logging::LogScope;
use crate::model::{LogAnalysis, RunLogs};
use crate::parsers::{parse_coverage, parse_lint, parse_tests};

/// Runs all three parsers over a block of log text.
pub fn analyze_text(
    run_id: u64,
    text: &str,
    known_paths: Option<&HashSet<String>>,
) -> LogAnalysis {
    LogAnalysis {
        run_id,
        run_name: None,
        findings: parse_lint(text, known_paths),
        tests: parse_tests(text),
        coverage: parse_coverage(text),
    }
}

/// Parses one run's log text into findings, test results and coverage.
pub fn analyze_run_log(
    run_logs: &RunLogs,
    known_paths: Option<&HashSet<String>>,
    scope: &LogScope,
) -> LogAnalysis {
    let text = run_logs.log_text.as_deref().unwrap_or("");
    let analysis = LogAnalysis {
        run_name: run_logs.run.name.clone(),
        ..analyze_text(run_logs.run.id, text, known_paths)
    };

    let scope = scope.with("run_id", run_logs.run.id);
    debug!(
        target: scope.target(),
        "{scope} findings={} tests={} coverage_entries={}",
        analysis.findings.len(),
        analysis
            .tests
            .as_ref()
            .map_or_else(|| "none".to_string(), |t| t.total.to_string()),
        analysis.coverage.len()
    );

    analysis
}

/// Parses every run that has log text. Results stay keyed per run, in input order.
pub fn analyze_logs(
    runs: &[RunLogs],
    known_paths: Option<&HashSet<String>>,
    scope: &LogScope,
) -> Vec<LogAnalysis> {
    let scope = scope.for_target("ciscope::analysis");
    runs.iter()
        .filter(|run_logs| run_logs.log_text.is_some())
        .map(|run_logs| analyze_run_log(run_logs, known_paths, &scope))
        .collect()
}
