//! Coverage percentages from coverage.py, Istanbul, `go test -cover` and
//! generic `N% covered` output.
//!
//! Each grammar keys off its aggregate line; per-file entries are only read
//! for a tool once its total has been found.

use once_cell::sync::Lazy;
use regex::Regex;

use super::grammar::{first_match, normalized_lines, Grammar};
use crate::model::{CoverageReport, TOTAL_KEY};

type CoverageFn = fn(&[String]) -> Option<CoverageReport>;

const COVERAGE_GRAMMARS: &[Grammar<CoverageFn>] = &[
    Grammar {
        name: "coverage.py",
        parse: parse_coverage_py,
    },
    Grammar {
        name: "istanbul",
        parse: parse_istanbul,
    },
    Grammar {
        name: "go",
        parse: parse_go_cover,
    },
    Grammar {
        name: "percent-covered",
        parse: parse_percent_covered,
    },
];

static PY_TOTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^TOTAL\s+(?:\d+\s+)*(?P<pct>\d+(?:\.\d+)?)%").expect("valid regex")
});

static PY_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<path>\S+\.py)\s+(?:\d+\s+)*(?P<pct>\d+(?:\.\d+)?)%").expect("valid regex")
});

static ISTANBUL_TOTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*All files\s*\|\s*(?P<stmts>[\d.]+)\s*\|\s*(?P<branch>[\d.]+)\s*\|\s*(?P<funcs>[\d.]+)\s*\|\s*(?P<lines>[\d.]+)",
    )
    .expect("valid regex")
});

static GO_COVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"coverage:\s+(?P<pct>\d+(?:\.\d+)?)% of statements").expect("valid regex")
});

static PERCENT_COVERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<pct>\d+(?:\.\d+)?)% covered").expect("valid regex")
});

/// Extracts coverage percentages from CI log text. Empty when none found.
pub fn parse_coverage(text: &str) -> CoverageReport {
    let lines = normalized_lines(text);
    first_match(COVERAGE_GRAMMARS, |parse| parse(&lines))
        .map(|(_, report)| report)
        .unwrap_or_default()
}

fn percent(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| (0.0..=100.0).contains(value))
}

fn total_only(lines: &[String], pattern: &Regex) -> Option<CoverageReport> {
    let total = lines
        .iter()
        .find_map(|line| pattern.captures(line).and_then(|caps| percent(&caps["pct"])))?;
    let mut report = CoverageReport::new();
    report.insert(TOTAL_KEY, total);
    Some(report)
}

fn parse_coverage_py(lines: &[String]) -> Option<CoverageReport> {
    let total = lines
        .iter()
        .find_map(|line| PY_TOTAL.captures(line).and_then(|caps| percent(&caps["pct"])))?;

    let mut report = CoverageReport::new();
    report.insert(TOTAL_KEY, total);
    for caps in lines.iter().filter_map(|line| PY_FILE.captures(line)) {
        if let Some(value) = percent(&caps["pct"]) {
            report.insert(&caps["path"], value);
        }
    }
    Some(report)
}

/// Istanbul text table: `File | % Stmts | % Branch | % Funcs | % Lines | ...`.
/// Line coverage is reported for the total and for every row.
fn parse_istanbul(lines: &[String]) -> Option<CoverageReport> {
    let total = lines
        .iter()
        .find_map(|line| ISTANBUL_TOTAL.captures(line).and_then(|caps| percent(&caps["lines"])))?;

    let mut report = CoverageReport::new();
    report.insert(TOTAL_KEY, total);
    for line in lines {
        let cells: Vec<&str> = line.split('|').map(str::trim).collect();
        if cells.len() < 5 {
            continue;
        }
        let name = cells[0];
        if name.is_empty() || name == "File" || name == "All files" || name.starts_with('-') {
            continue;
        }
        if let Some(value) = percent(cells[4]) {
            report.insert(name, value);
        }
    }
    Some(report)
}

fn parse_go_cover(lines: &[String]) -> Option<CoverageReport> {
    total_only(lines, &GO_COVER)
}

fn parse_percent_covered(lines: &[String]) -> Option<CoverageReport> {
    total_only(lines, &PERCENT_COVERED)
}
