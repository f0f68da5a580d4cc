//! Ordered grammar registry shared by the log parsers.
//!
//! Each parser declares its recognizers as a slice of [`Grammar`] entries and
//! dispatches with [`first_match`]; supporting a new output format is one more
//! entry in that slice.

use once_cell::sync::Lazy;
use regex::Regex;

/// A named recognizer. `F` is the parser-specific function signature.
pub struct Grammar<F> {
    pub name: &'static str,
    pub parse: F,
}

/// Tries `grammars` in order and returns the first hit with its grammar name.
pub fn first_match<F, T>(
    grammars: &[Grammar<F>],
    mut attempt: impl FnMut(&F) -> Option<T>,
) -> Option<(&'static str, T)> {
    grammars
        .iter()
        .find_map(|grammar| attempt(&grammar.parse).map(|value| (grammar.name, value)))
}

static ANSI_SGR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid regex"));

static ACTIONS_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?Z ?").expect("valid regex")
});

/// Strips color codes and the leading Actions timestamp from one log line.
pub fn normalize_line(line: &str) -> String {
    let line = line.trim_end_matches('\r');
    let without_color = ANSI_SGR.replace_all(line, "");
    ACTIONS_TIMESTAMP.replace(&without_color, "").into_owned()
}

/// Splits log text into normalized lines.
pub fn normalized_lines(text: &str) -> Vec<String> {
    text.lines().map(normalize_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(s: &str) -> Option<String> {
        s.strip_prefix("2x").map(|rest| format!("{rest}{rest}"))
    }

    fn upper(s: &str) -> Option<String> {
        Some(s.to_uppercase())
    }

    #[test]
    fn test_first_match_respects_order() {
        let grammars: &[Grammar<fn(&str) -> Option<String>>] = &[
            Grammar { name: "double", parse: double },
            Grammar { name: "upper", parse: upper },
        ];

        let hit = first_match(grammars, |parse| parse("2xab"));
        assert_eq!(hit, Some(("double", "abab".to_string())));

        let hit = first_match(grammars, |parse| parse("ab"));
        assert_eq!(hit, Some(("upper", "AB".to_string())));
    }

    #[test]
    fn test_first_match_none_when_nothing_matches() {
        let grammars: &[Grammar<fn(&str) -> Option<String>>] =
            &[Grammar { name: "double", parse: double }];
        assert!(first_match(grammars, |parse| parse("xx")).is_none());
    }

    #[test]
    fn test_normalize_line_strips_timestamp_and_color() {
        let raw = "2024-03-01T10:15:22.1234567Z \x1b[31mFAILED\x1b[0m tests/test_a.py::test_x\r";
        assert_eq!(normalize_line(raw), "FAILED tests/test_a.py::test_x");
    }

    #[test]
    fn test_normalize_line_leaves_plain_lines_alone() {
        assert_eq!(normalize_line("ok  \tpkg/a\t0.01s"), "ok  \tpkg/a\t0.01s");
    }
}
