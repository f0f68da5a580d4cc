//! Lint and security-scanner findings.
//!
//! Three output shapes are recognized, tried per line in this order:
//! - flake8: `path:line:col: CODE message`
//! - eslint (unix-style with rule): `path:line:col: message (rule-name)`
//! - bandit: `>> Issue: [CODE] message` followed within 5 lines by
//!   `Location: path:line`

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::grammar::{first_match, normalized_lines, Grammar};
use super::recommend::recommend;
use crate::model::{Category, Finding, LintTool, Severity};

/// Lines after a bandit issue header searched for its `Location:` line.
const BANDIT_LOCATION_WINDOW: usize = 5;

type LintFn = fn(&[String], usize) -> Option<RawIssue>;

const LINT_GRAMMARS: &[Grammar<LintFn>] = &[
    Grammar {
        name: "flake8",
        parse: match_flake8,
    },
    Grammar {
        name: "eslint",
        parse: match_eslint,
    },
    Grammar {
        name: "bandit",
        parse: match_bandit,
    },
];

static FLAKE8_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?P<path>[^\s:]+):(?P<line>\d+):(?P<col>\d+):\s+(?P<code>[A-Z]\d+)\s+(?P<msg>.+?)\s*$",
    )
    .expect("valid regex")
});

static ESLINT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?P<path>[^\s:]+):(?P<line>\d+):(?P<col>\d+):\s+(?P<msg>.+?)\s+\((?P<rule>[@\w./-]+)\)\s*$",
    )
    .expect("valid regex")
});

static BANDIT_ISSUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*>>\s*Issue:\s*\[(?P<code>[^\]]+)\]\s*(?P<msg>.+?)\s*$").expect("valid regex")
});

static BANDIT_LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*Location:\s*(?P<path>[^\s:]+):(?P<line>\d+)").expect("valid regex")
});

const ESLINT_SECURITY_RULES: &[&str] = &[
    "no-eval",
    "no-implied-eval",
    "no-new-func",
    "no-script-url",
    "security/detect-object-injection",
    "security/detect-non-literal-regexp",
    "security/detect-child-process",
    "security/detect-eval-with-expression",
];

const ESLINT_IMPORT_RULES: &[&str] = &[
    "no-undef",
    "no-unused-vars",
    "import/no-unresolved",
    "import/named",
    "import/no-extraneous-dependencies",
    "@typescript-eslint/no-unused-vars",
];

const ESLINT_UNREACHABLE_RULES: &[&str] = &["no-unreachable", "no-unreachable-loop"];

const ESLINT_COMPLEXITY_RULES: &[&str] = &[
    "complexity",
    "max-depth",
    "max-lines",
    "max-lines-per-function",
    "max-nested-callbacks",
    "max-params",
    "max-statements",
];

/// Bandit test ids that are critical on sight: hard-coded or weak crypto,
/// shell injection, unsafe deserialization and dynamic code execution.
const BANDIT_CRITICAL_CODES: &[&str] = &[
    "B102", "B105", "B106", "B107", "B301", "B302", "B303", "B304", "B305", "B307", "B324",
    "B413", "B506", "B602", "B604", "B605", "B609",
];

/// Issue recognized by a grammar, before verification and recommendation.
#[derive(Debug, Clone, PartialEq)]
struct RawIssue {
    tool: LintTool,
    file: String,
    line: Option<u32>,
    code: String,
    message: String,
    severity: Severity,
    category: Category,
}

/// Extracts findings from CI log text, in source line order.
///
/// `known_paths` is the set of real repository paths; each finding is marked
/// `verified` when its file is in the set. Without a set nothing is verified.
pub fn parse_lint(text: &str, known_paths: Option<&HashSet<String>>) -> Vec<Finding> {
    let lines = normalized_lines(text);

    (0..lines.len())
        .filter_map(|index| first_match(LINT_GRAMMARS, |parse| parse(&lines, index)))
        .map(|(_, issue)| {
            let verified = is_known_path(&issue.file, known_paths);
            let recommendation = recommend(issue.category, &issue.code, &issue.message);
            Finding {
                tool: issue.tool,
                file: issue.file,
                line: issue.line,
                code: issue.code,
                message: issue.message,
                severity: issue.severity,
                category: issue.category,
                recommendation,
                verified,
            }
        })
        .collect()
}

fn is_known_path(path: &str, known_paths: Option<&HashSet<String>>) -> bool {
    known_paths.is_some_and(|known| {
        known.contains(path) || known.contains(path.trim_start_matches("./"))
    })
}

fn match_flake8(lines: &[String], index: usize) -> Option<RawIssue> {
    let caps = FLAKE8_LINE.captures(&lines[index])?;
    let code = caps["code"].to_string();
    let (severity, category) = classify_flake8(&code);
    Some(RawIssue {
        tool: LintTool::Flake8,
        file: caps["path"].to_string(),
        line: caps["line"].parse().ok(),
        code,
        message: caps["msg"].to_string(),
        severity,
        category,
    })
}

fn match_eslint(lines: &[String], index: usize) -> Option<RawIssue> {
    let caps = ESLINT_LINE.captures(&lines[index])?;
    let rule = caps["rule"].to_string();
    let (severity, category) = classify_eslint(&rule);
    Some(RawIssue {
        tool: LintTool::Eslint,
        file: caps["path"].to_string(),
        line: caps["line"].parse().ok(),
        code: rule,
        message: caps["msg"].to_string(),
        severity,
        category,
    })
}

fn match_bandit(lines: &[String], index: usize) -> Option<RawIssue> {
    let caps = BANDIT_ISSUE.captures(&lines[index])?;

    // Without a location of its own the issue can't be attributed, so it is dropped.
    let location = lines
        .iter()
        .skip(index + 1)
        .take(BANDIT_LOCATION_WINDOW)
        .take_while(|line| !BANDIT_ISSUE.is_match(line))
        .find_map(|line| BANDIT_LOCATION.captures(line))?;

    let code = caps["code"].to_string();
    Some(RawIssue {
        tool: LintTool::Bandit,
        file: location["path"].to_string(),
        line: location["line"].parse().ok(),
        severity: classify_bandit(&code),
        category: Category::Security,
        code,
        message: caps["msg"].to_string(),
    })
}

/// Maps a flake8 code to severity and category by letter prefix and range.
fn classify_flake8(code: &str) -> (Severity, Category) {
    let mut chars = code.chars();
    let letter = chars.next().unwrap_or(' ');
    let first_digit = chars.next().unwrap_or(' ');

    match (letter, first_digit) {
        ('E', '9') | ('F', '8') => (Severity::Critical, Category::Syntax),
        ('F', '4' | '6' | '7') => (Severity::High, Category::Import),
        ('F', _) => (Severity::Medium, Category::Syntax),
        ('E', _) => (Severity::Low, Category::Style),
        ('W', _) => (Severity::Info, Category::Style),
        ('C', _) => (Severity::Medium, Category::Complexity),
        _ => (Severity::Low, Category::Style),
    }
}

fn classify_eslint(rule: &str) -> (Severity, Category) {
    if ESLINT_SECURITY_RULES.contains(&rule) {
        (Severity::High, Category::Security)
    } else if ESLINT_IMPORT_RULES.contains(&rule) {
        (Severity::Medium, Category::Import)
    } else if ESLINT_UNREACHABLE_RULES.contains(&rule) {
        (Severity::Critical, Category::Syntax)
    } else if ESLINT_COMPLEXITY_RULES.contains(&rule) {
        (Severity::Medium, Category::Complexity)
    } else {
        (Severity::Low, Category::Style)
    }
}

fn classify_bandit(code: &str) -> Severity {
    let test_id = code.split(':').next().unwrap_or(code).trim();
    if BANDIT_CRITICAL_CODES.contains(&test_id) {
        Severity::Critical
    } else {
        Severity::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(paths: &[&str]) -> HashSet<String> {
        paths.iter().map(|p| (*p).to_string()).collect()
    }

    #[test]
    fn test_flake8_line_too_long() {
        let findings = parse_lint("src/a.py:10:5: E501 line too long (88 > 79 characters)", None);
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.tool, LintTool::Flake8);
        assert_eq!(f.file, "src/a.py");
        assert_eq!(f.line, Some(10));
        assert_eq!(f.code, "E501");
        assert_eq!(f.severity, Severity::Low);
        assert_eq!(f.category, Category::Style);
        assert!(!f.verified);
    }

    #[test]
    fn test_flake8_classification_table() {
        let cases = [
            ("E999", Severity::Critical, Category::Syntax),
            ("F821", Severity::Critical, Category::Syntax),
            ("F401", Severity::High, Category::Import),
            ("F632", Severity::High, Category::Import),
            ("F704", Severity::High, Category::Import),
            ("F541", Severity::Medium, Category::Syntax),
            ("E302", Severity::Low, Category::Style),
            ("W291", Severity::Info, Category::Style),
            ("C901", Severity::Medium, Category::Complexity),
            ("N802", Severity::Low, Category::Style),
        ];
        for (code, severity, category) in cases {
            assert_eq!(classify_flake8(code), (severity, category), "code {code}");
        }
    }

    #[test]
    fn test_eslint_rule_sets() {
        let text = "\
src/app.js:3:7: 'foo' is not defined. (no-undef)
src/app.js:9:1: eval can be harmful. (no-eval)
src/app.js:12:3: Unreachable code. (no-unreachable)
src/app.js:20:1: Function has a complexity of 14. (complexity)
src/app.js:21:5: Missing semicolon. (semi)";
        let findings = parse_lint(text, None);
        let got: Vec<_> = findings
            .iter()
            .map(|f| (f.code.as_str(), f.severity, f.category))
            .collect();
        assert_eq!(
            got,
            vec![
                ("no-undef", Severity::Medium, Category::Import),
                ("no-eval", Severity::High, Category::Security),
                ("no-unreachable", Severity::Critical, Category::Syntax),
                ("complexity", Severity::Medium, Category::Complexity),
                ("semi", Severity::Low, Category::Style),
            ]
        );
        assert!(findings.iter().all(|f| f.tool == LintTool::Eslint));
    }

    #[test]
    fn test_flake8_wins_over_eslint_on_ambiguous_line() {
        // Both shapes fit: a code token up front and a trailing parenthetical.
        let line = "src/a.py:4:1: E731 do not assign a lambda expression (use def)";
        let findings = parse_lint(line, None);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].tool, LintTool::Flake8);
        assert_eq!(findings[0].code, "E731");
        assert_eq!(findings[0].message, "do not assign a lambda expression (use def)");
    }

    #[test]
    fn test_eslint_line_without_code_token_is_not_flake8() {
        let findings = parse_lint(
            "lib/x.ts:1:1: Unexpected any. (@typescript-eslint/no-explicit-any)",
            None,
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].tool, LintTool::Eslint);
        assert_eq!(findings[0].code, "@typescript-eslint/no-explicit-any");
    }

    #[test]
    fn test_bandit_issue_with_location() {
        let text = "\
>> Issue: [B602:subprocess_popen_with_shell_equals_true] subprocess call with shell=True identified, security issue.
   Severity: High   Confidence: High
   CWE: CWE-78 (https://cwe.mitre.org/data/definitions/78.html)
   More Info: https://bandit.readthedocs.io/en/latest/
   Location: app/run.py:42:8
41\tdef go(cmd):
42\t    subprocess.Popen(cmd, shell=True)";
        let findings = parse_lint(text, None);
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.tool, LintTool::Bandit);
        assert_eq!(f.file, "app/run.py");
        assert_eq!(f.line, Some(42));
        assert_eq!(f.code, "B602:subprocess_popen_with_shell_equals_true");
        assert_eq!(f.severity, Severity::Critical);
        assert_eq!(f.category, Category::Security);
    }

    #[test]
    fn test_bandit_default_severity_is_high() {
        let text = ">> Issue: [B101:assert_used] Use of assert detected.\n   Location: tests/t.py:3:4";
        let findings = parse_lint(text, None);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn test_bandit_issue_without_location_is_dropped() {
        let text = "\
>> Issue: [B105:hardcoded_password_string] Possible hardcoded password: 'hunter2'
   Severity: Low   Confidence: Medium
   line two
   line three
   line four
   line five
   Location: too/late.py:1:1";
        assert!(parse_lint(text, None).is_empty());
    }

    #[test]
    fn test_bandit_location_is_not_borrowed_from_next_issue() {
        let text = "\
>> Issue: [B101:assert_used] Use of assert detected.
>> Issue: [B602:subprocess_popen_with_shell_equals_true] subprocess call with shell=True identified.
   Location: app/run.py:42:8";
        let findings = parse_lint(text, None);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, "B602:subprocess_popen_with_shell_equals_true");
        assert_eq!(findings[0].line, Some(42));
    }

    #[test]
    fn test_verified_requires_known_paths() {
        let line = "src/a.py:1:1: F401 'os' imported but unused";
        assert!(!parse_lint(line, None)[0].verified);
        assert!(parse_lint(line, Some(&known(&["src/a.py"])))[0].verified);
        assert!(!parse_lint(line, Some(&known(&["src/b.py"])))[0].verified);
        assert!(!parse_lint(line, Some(&HashSet::new()))[0].verified);
    }

    #[test]
    fn test_dot_slash_prefix_is_verified() {
        let line = "./src/a.py:1:1: F401 'os' imported but unused";
        let findings = parse_lint(line, Some(&known(&["src/a.py"])));
        assert_eq!(findings[0].file, "./src/a.py");
        assert!(findings[0].verified);
    }

    #[test]
    fn test_interleaved_chatter_and_timestamps() {
        let text = "\
=== build/3_Lint.txt ===
2024-05-01T12:00:00.0000000Z ##[group]Run flake8 .
2024-05-01T12:00:01.0000000Z src/a.py:1:1: F401 'os' imported but unused
2024-05-01T12:00:01.0000000Z Some unrelated: line: here
2024-05-01T12:00:02.0000000Z src/b.py:7:80: E501 line too long (90 > 79 characters)
##[error]Process completed with exit code 1.";
        let findings = parse_lint(text, None);
        let files: Vec<_> = findings.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(files, vec!["src/a.py", "src/b.py"]);
        assert!(findings[0].recommendation.contains("unused"));
    }

    #[test]
    fn test_unrecognized_text_yields_nothing() {
        assert!(parse_lint("hello\nworld\n", None).is_empty());
        assert!(parse_lint("", None).is_empty());
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let text = "src/a.py:1:1: F401 'os' imported but unused\nsrc/app.js:3:7: x (no-undef)";
        assert_eq!(parse_lint(text, None), parse_lint(text, None));
    }
}
