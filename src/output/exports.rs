use anyhow::Result;
use std::io::Write;

use crate::config::OutputFormat;
use crate::model::{AnalysisReport, LogAnalysis};

use super::summary::{render_log_summary, render_summary};

/// Writes an analysis report in the requested format.
///
/// - Summary: the colored terminal tables
/// - JSON: the full report, for downstream scoring
/// - CSV: one row per finding, for spreadsheets
pub fn export_report(
    report: &AnalysisReport,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            write!(output, "{}", render_summary(report))?;
            Ok(())
        }
        OutputFormat::Json => export_json(report, pretty, output),
        OutputFormat::Csv => export_csv(&report.logs, output),
    }
}

/// Writes the parse result of a single log file.
pub fn export_log_analysis(
    log: &LogAnalysis,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            write!(output, "{}", render_log_summary(log))?;
            Ok(())
        }
        OutputFormat::Json => export_json(log, pretty, output),
        OutputFormat::Csv => export_csv(std::slice::from_ref(log), output),
    }
}

fn export_json<T: serde::Serialize>(
    value: &T,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn export_csv(logs: &[LogAnalysis], output: &mut dyn Write) -> Result<()> {
    writeln!(
        output,
        "Run ID,Tool,File,Line,Code,Severity,Category,Verified,Message,Recommendation"
    )?;

    for log in logs {
        for finding in &log.findings {
            writeln!(
                output,
                "{},{},{},{},{},{},{},{},{},{}",
                log.run_id,
                finding.tool,
                csv_field(&finding.file),
                finding.line.map(|l| l.to_string()).unwrap_or_default(),
                csv_field(&finding.code),
                finding.severity,
                finding.category,
                finding.verified,
                csv_field(&finding.message),
                csv_field(&finding.recommendation),
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Category, CoverageReport, Finding, LintTool, LogAnalysis, RepositoryAnalysis, Severity,
    };
    use chrono::Utc;

    fn create_test_report() -> AnalysisReport {
        let finding = Finding {
            tool: LintTool::Eslint,
            file: "src/app.js".to_string(),
            line: Some(12),
            code: "no-unused-vars".to_string(),
            message: "'x' is assigned a value but never used, \"really\"".to_string(),
            severity: Severity::Low,
            category: Category::Style,
            recommendation: "Remove unused code".to_string(),
            verified: true,
        };
        let bandit = Finding {
            tool: LintTool::Bandit,
            file: "app/db.py".to_string(),
            line: None,
            code: "B608".to_string(),
            message: "Possible SQL injection".to_string(),
            severity: Severity::Critical,
            category: Category::Security,
            recommendation: String::new(),
            verified: false,
        };

        AnalysisReport {
            repository: "acme/web".to_string(),
            generated_at: Utc::now(),
            analysis: RepositoryAnalysis {
                runs: vec![],
                definitions: vec![],
                disqualified: true,
                reason: Some("No CI/CD found".to_string()),
            },
            logs: vec![LogAnalysis {
                run_id: 42,
                run_name: Some("CI".to_string()),
                findings: vec![finding, bandit],
                tests: None,
                coverage: CoverageReport::new(),
            }],
        }
    }

    #[test]
    fn test_export_json() {
        let report = create_test_report();
        let mut output = Vec::new();
        export_report(&report, OutputFormat::Json, false, &mut output).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(json["repository"], "acme/web");
        assert_eq!(json["analysis"]["disqualified"], true);
        assert_eq!(json["logs"][0]["findings"][0]["severity"], "low");
        assert_eq!(json["logs"][0]["findings"][1]["line"], serde_json::Value::Null);
    }

    #[test]
    fn test_export_json_pretty() {
        let report = create_test_report();
        let mut output = Vec::new();
        export_report(&report, OutputFormat::Json, true, &mut output).unwrap();
        let json_str = String::from_utf8(output).unwrap();
        assert!(json_str.contains("\n  "));
    }

    #[test]
    fn test_export_csv_rows() {
        let report = create_test_report();
        let mut output = Vec::new();
        export_report(&report, OutputFormat::Csv, false, &mut output).unwrap();
        let csv = String::from_utf8(output).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Run ID,Tool"));
        assert!(lines[1].starts_with("42,eslint,\"src/app.js\",12,"));
        assert!(lines[1].contains("\"\"really\"\""));
        assert!(lines[2].starts_with("42,bandit,\"app/db.py\",,\"B608\",critical,security,false,"));
    }

    #[test]
    fn test_export_log_analysis_csv() {
        let report = create_test_report();
        let mut output = Vec::new();
        export_log_analysis(&report.logs[0], OutputFormat::Csv, false, &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_export_summary() {
        let report = create_test_report();
        let mut output = Vec::new();
        export_report(&report, OutputFormat::Summary, false, &mut output).unwrap();
        let text = console::strip_ansi_codes(&String::from_utf8(output).unwrap()).to_string();
        assert!(text.contains("Disqualified"));
        assert!(text.contains("No CI/CD found"));
    }
}
