//! Test-run summaries from pytest, Jest and `go test` output.
//!
//! The first framework whose summary shape appears anywhere in the text wins;
//! `None` means the log carries no recognizable test results.

use once_cell::sync::Lazy;
use regex::Regex;

use super::grammar::{first_match, normalized_lines, Grammar};
use crate::model::{FailingTest, TestExecutionResult};

pub const PYTEST: &str = "pytest";
pub const JEST: &str = "jest";
pub const GO_TEST: &str = "go test";

const UNKNOWN_FILE: &str = "unknown";
const DEFAULT_FAILURE_MESSAGE: &str = "Test failed";

/// Lines after `--- FAIL: Name` searched for its `file.go:line: message`.
const GO_LOCATION_WINDOW: usize = 10;
/// Lines after a Jest `●` bullet searched for the first error line.
const JEST_MESSAGE_WINDOW: usize = 5;

type TestFn = fn(&[String]) -> Option<TestExecutionResult>;

const TEST_GRAMMARS: &[Grammar<TestFn>] = &[
    Grammar {
        name: PYTEST,
        parse: parse_pytest,
    },
    Grammar {
        name: JEST,
        parse: parse_jest,
    },
    Grammar {
        name: GO_TEST,
        parse: parse_go_test,
    },
];

static PYTEST_SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^=+ (?P<body>.*?\d+ (?:passed|failed|errors?|skipped).*?) in [\d.]+\s*s(?:econds)?\b.*=+\s*$",
    )
    .expect("valid regex")
});

static PYTEST_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<n>\d+) (?P<kind>passed|failed|errors?|skipped)\b").expect("valid regex")
});

static PYTEST_FAILURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:FAILED|ERROR) (?P<path>[^\s:]+)::(?P<name>\S+)(?: - (?P<msg>.*))?$")
        .expect("valid regex")
});

static JEST_SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*Tests:\s+(?P<body>.*?)\d+ total\s*$").expect("valid regex")
});

static JEST_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<n>\d+) (?P<kind>passed|failed|skipped|todo|pending)\b").expect("valid regex")
});

static JEST_FAIL_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*FAIL\s+(?P<path>\S+)").expect("valid regex"));

static JEST_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*● (?P<name>.+ › .+?)\s*$").expect("valid regex"));

static GO_OK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ok\s+\S+\s+(?:\d+(?:\.\d+)?s|\(cached\))").expect("valid regex")
});

// the third column separates `FAIL pkg 0.01s` from Jest's `FAIL a.test.js (5.2 s)`
static GO_FAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^FAIL\s+\S+\s+(?:\d+(?:\.\d+)?s|\(cached\))").expect("valid regex")
});

static GO_PASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^PASS\s*$").expect("valid regex"));

static GO_FAIL_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*--- FAIL: (?P<name>\S+) \((?P<time>[\d.]+s)\)").expect("valid regex")
});

static GO_LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<path>[\w./-]+\.go):(?P<line>\d+): (?P<msg>.+?)\s*$").expect("valid regex")
});

/// Per-outcome tallies of one summary line.
///
/// Counts that do not fit a `u32` reject the summary instead of wrapping.
#[derive(Default)]
struct Counts {
    passed: u32,
    failed: u32,
    skipped: u32,
}

impl Counts {
    fn into_result(
        self,
        framework: &str,
        failing_tests: Vec<FailingTest>,
    ) -> Option<TestExecutionResult> {
        let total = self.passed.checked_add(self.failed)?.checked_add(self.skipped)?;
        Some(TestExecutionResult {
            framework: framework.to_string(),
            total,
            passed: self.passed,
            failed: self.failed,
            skipped: self.skipped,
            failing_tests,
        })
    }
}

/// Parses the test summary out of CI log text.
pub fn parse_tests(text: &str) -> Option<TestExecutionResult> {
    let lines = normalized_lines(text);
    first_match(TEST_GRAMMARS, |parse| parse(&lines)).map(|(_, result)| result)
}

fn parse_pytest(lines: &[String]) -> Option<TestExecutionResult> {
    let body = lines
        .iter()
        .find_map(|line| PYTEST_SUMMARY.captures(line))?
        .name("body")?
        .as_str()
        .to_string();

    let mut counts = Counts::default();
    for caps in PYTEST_COUNT.captures_iter(&body) {
        let n: u32 = caps["n"].parse().ok()?;
        match &caps["kind"] {
            "passed" => counts.passed = counts.passed.checked_add(n)?,
            "skipped" => counts.skipped = counts.skipped.checked_add(n)?,
            // errors are folded into failures
            _ => counts.failed = counts.failed.checked_add(n)?,
        }
    }

    let failing_tests = lines
        .iter()
        .filter_map(|line| PYTEST_FAILURE.captures(line))
        .map(|caps| {
            let path = &caps["path"];
            FailingTest {
                name: format!("{path}::{}", &caps["name"]),
                message: caps
                    .name("msg")
                    .map_or(DEFAULT_FAILURE_MESSAGE, |m| m.as_str())
                    .to_string(),
                file: path.to_string(),
                line: None,
            }
        })
        .collect();

    counts.into_result(PYTEST, failing_tests)
}

fn parse_jest(lines: &[String]) -> Option<TestExecutionResult> {
    let caps = lines.iter().find_map(|line| JEST_SUMMARY.captures(line))?;

    let mut counts = Counts::default();
    for count in JEST_COUNT.captures_iter(&caps["body"]) {
        let n: u32 = count["n"].parse().ok()?;
        match &count["kind"] {
            "passed" => counts.passed = counts.passed.checked_add(n)?,
            "failed" => counts.failed = counts.failed.checked_add(n)?,
            // todo and pending tests never run; count them as skipped
            _ => counts.skipped = counts.skipped.checked_add(n)?,
        }
    }

    // The printed total also covers todo tests, so it is recomputed.
    counts.into_result(JEST, jest_failures(lines))
}

fn jest_failures(lines: &[String]) -> Vec<FailingTest> {
    let mut current_file: Option<&str> = None;
    let mut failures: Vec<FailingTest> = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        if let Some(caps) = JEST_FAIL_FILE.captures(line) {
            current_file = caps.name("path").map(|m| m.as_str());
            continue;
        }
        let Some(caps) = JEST_BULLET.captures(line) else {
            continue;
        };

        let name = caps["name"].to_string();
        let file = current_file.unwrap_or(UNKNOWN_FILE).to_string();
        // Jest repeats every failure in its closing summary.
        if failures.iter().any(|f| f.name == name && f.file == file) {
            continue;
        }

        let message = lines
            .iter()
            .skip(index + 1)
            .take(JEST_MESSAGE_WINDOW)
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
            .unwrap_or(DEFAULT_FAILURE_MESSAGE)
            .to_string();

        failures.push(FailingTest {
            name,
            message,
            file,
            line: None,
        });
    }

    failures
}

fn parse_go_test(lines: &[String]) -> Option<TestExecutionResult> {
    let ok = lines.iter().filter(|l| GO_OK.is_match(l)).count();
    let pass = lines.iter().filter(|l| GO_PASS.is_match(l)).count();
    let fail = lines.iter().filter(|l| GO_FAIL.is_match(l)).count();

    if ok + pass + fail == 0 {
        return None;
    }

    let passed = u32::try_from(ok + pass).unwrap_or(u32::MAX);
    let failed = u32::try_from(fail).unwrap_or(u32::MAX);

    // Package-level reporting: no skip concept.
    Some(TestExecutionResult {
        framework: GO_TEST.to_string(),
        total: passed.saturating_add(failed),
        passed,
        failed,
        skipped: 0,
        failing_tests: go_failures(lines),
    })
}

fn go_failures(lines: &[String]) -> Vec<FailingTest> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let marker = GO_FAIL_MARKER.captures(line)?;
            let name = marker["name"].to_string();

            let location = lines
                .iter()
                .skip(index + 1)
                .take(GO_LOCATION_WINDOW)
                .find_map(|l| GO_LOCATION.captures(l));

            Some(match location {
                Some(loc) => FailingTest {
                    name,
                    message: loc["msg"].to_string(),
                    file: loc["path"].to_string(),
                    line: loc["line"].parse().ok(),
                },
                None => FailingTest {
                    name,
                    message: DEFAULT_FAILURE_MESSAGE.to_string(),
                    file: UNKNOWN_FILE.to_string(),
                    line: None,
                },
            })
        })
        .collect()
}
