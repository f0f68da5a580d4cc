use std::fmt::Write;

use crate::model::{AnalysisReport, Finding, LogAnalysis, Severity};
use crate::providers::github::types::links;
use comfy_table::{Cell, Color as TableColor};

use super::styling::{bright, bright_green, bright_red, dim};
use super::tables::{color_coded_rate_cell, conclusion_cell, create_table, severity_cell};

const MAX_FINDINGS_SHOWN: usize = 20;

// Helper functions

fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn sorted_findings(logs: &[LogAnalysis]) -> Vec<&Finding> {
    let mut findings: Vec<&Finding> = logs.iter().flat_map(|l| l.findings.iter()).collect();
    // stable: equal severities keep log order
    findings.sort_by_key(|f| std::cmp::Reverse(f.severity.rank()));
    findings
}

fn render_overview(output: &mut String, report: &AnalysisReport) {
    add_section_header(output, "📋", "Overview");

    let mut table = create_table();
    table.add_row(vec![Cell::new("Repository"), Cell::new(&report.repository)]);
    table.add_row(vec![
        Cell::new("Workflow runs"),
        Cell::new(report.analysis.runs.len()),
    ]);
    table.add_row(vec![
        Cell::new("Workflow definitions"),
        Cell::new(report.analysis.definitions.len()),
    ]);

    let verdict = if report.analysis.disqualified {
        Cell::new(bright_red("Disqualified").to_string())
    } else {
        Cell::new(bright_green("Has CI/CD").to_string())
    };
    table.add_row(vec![Cell::new("CI/CD"), verdict]);
    if let Some(reason) = &report.analysis.reason {
        table.add_row(vec![Cell::new("Reason"), Cell::new(reason)]);
    }

    let _ = writeln!(output, "{table}\n");
}

fn render_runs(output: &mut String, report: &AnalysisReport) {
    if report.analysis.runs.is_empty() {
        return;
    }
    add_section_header(output, "🏃", "Workflow Runs");

    let (owner, repo) = report
        .repository
        .split_once('/')
        .unwrap_or((report.repository.as_str(), ""));

    let mut table = create_table();
    table.set_header(create_cyan_header(&[
        "Run",
        "Workflow",
        "Conclusion",
        "Attempt",
        "Created",
        "Link",
    ]));
    for run in &report.analysis.runs {
        let link = run
            .html_url
            .clone()
            .unwrap_or_else(|| links::workflow_run_url(owner, repo, run.id));
        table.add_row(vec![
            Cell::new(run.id),
            Cell::new(run.name.as_deref().unwrap_or("-")),
            conclusion_cell(run.conclusion.as_deref()),
            Cell::new(run.run_attempt),
            Cell::new(run.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(dim(link).to_string()),
        ]);
    }

    let _ = writeln!(output, "{table}\n");
}

fn render_findings(output: &mut String, logs: &[LogAnalysis]) {
    let findings = sorted_findings(logs);
    add_section_header(output, "🔎", "Findings");

    if findings.is_empty() {
        let _ = writeln!(output, "  {}\n", dim("No lint or security findings"));
        return;
    }

    let mut counts = create_table();
    counts.set_header(create_cyan_header(&["Severity", "Count"]));
    for severity in [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ] {
        let count = findings.iter().filter(|f| f.severity == severity).count();
        if count > 0 {
            counts.add_row(vec![severity_cell(severity), Cell::new(count)]);
        }
    }
    let _ = writeln!(output, "{counts}\n");

    let mut table = create_table();
    table.set_header(create_cyan_header(&[
        "Severity", "Tool", "Location", "Code", "Message", "Verified",
    ]));
    for finding in findings.iter().take(MAX_FINDINGS_SHOWN) {
        let location = match finding.line {
            Some(line) => format!("{}:{line}", finding.file),
            None => finding.file.clone(),
        };
        table.add_row(vec![
            severity_cell(finding.severity),
            Cell::new(finding.tool),
            Cell::new(location),
            Cell::new(&finding.code),
            Cell::new(&finding.message),
            Cell::new(if finding.verified { "yes" } else { "no" }),
        ]);
    }
    let _ = writeln!(output, "{table}");

    if findings.len() > MAX_FINDINGS_SHOWN {
        let _ = writeln!(
            output,
            "  {}",
            dim(format!("… and {} more", findings.len() - MAX_FINDINGS_SHOWN))
        );
    }
    let _ = writeln!(output);
}

fn render_tests(output: &mut String, logs: &[LogAnalysis]) {
    add_section_header(output, "🧪", "Tests & Coverage");

    let rows: Vec<_> = logs
        .iter()
        .filter(|log| log.tests.is_some() || !log.coverage.is_empty())
        .collect();
    if rows.is_empty() {
        let _ = writeln!(output, "  {}\n", dim("No test or coverage output found"));
        return;
    }

    let mut table = create_table();
    table.set_header(create_cyan_header(&[
        "Run", "Framework", "Passed", "Failed", "Skipped", "Pass Rate", "Coverage",
    ]));
    for log in rows {
        let coverage = log
            .coverage
            .total()
            .map_or_else(|| Cell::new("-"), color_coded_rate_cell);
        match &log.tests {
            Some(tests) => table.add_row(vec![
                Cell::new(log.run_id),
                Cell::new(&tests.framework),
                Cell::new(tests.passed),
                Cell::new(tests.failed),
                Cell::new(tests.skipped),
                color_coded_rate_cell(tests.pass_rate()),
                coverage,
            ]),
            None => table.add_row(vec![
                Cell::new(log.run_id),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                coverage,
            ]),
        };
    }
    let _ = writeln!(output, "{table}");

    for log in logs {
        let Some(tests) = &log.tests else { continue };
        for failing in &tests.failing_tests {
            let location = match failing.line {
                Some(line) => format!("{}:{line}", failing.file),
                None => failing.file.clone(),
            };
            let _ = writeln!(
                output,
                "  {} {} {}",
                bright_red("✗"),
                failing.name,
                dim(format!("({location}) {}", failing.message))
            );
        }
    }
    let _ = writeln!(output);
}

/// Renders a human-readable summary of an analysis report.
///
/// Color-coded tables showing:
/// - Overview: repository, run/definition counts and the CI/CD gate verdict
/// - Workflow Runs: conclusion and attempt of each analyzed run
/// - Findings: counts per severity and the most severe findings
/// - Tests & Coverage: per-run test results and total coverage
pub fn render_summary(report: &AnalysisReport) -> String {
    let mut output = String::new();
    render_overview(&mut output, report);
    render_runs(&mut output, report);
    render_findings(&mut output, &report.logs);
    render_tests(&mut output, &report.logs);
    output
}

/// Renders findings and test results of a single parsed log.
pub fn render_log_summary(log: &LogAnalysis) -> String {
    let mut output = String::new();
    let logs = std::slice::from_ref(log);
    render_findings(&mut output, logs);
    render_tests(&mut output, logs);
    output
}
