//! Disqualification gate: does the repository have any CI/CD at all?

use serde::{Deserialize, Serialize};

use crate::providers::github::types::{WorkflowDefinition, WorkflowRun};

/// Reason attached to every disqualified verdict.
pub const NO_CI_REASON: &str =
    "No CI/CD found: the repository has no workflow runs and no workflow definition files";

/// Gate evaluation verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateVerdict {
    pub disqualified: bool,
    pub reason: Option<String>,
}

/// Disqualification rules.
pub struct CiGate;

impl CiGate {
    /// Disqualify iff there are neither runs nor definitions.
    ///
    /// Run outcomes are irrelevant: a repository whose runs all failed still
    /// has CI/CD.
    pub fn evaluate(runs: &[WorkflowRun], definitions: &[WorkflowDefinition]) -> GateVerdict {
        if runs.is_empty() && definitions.is_empty() {
            GateVerdict {
                disqualified: true,
                reason: Some(NO_CI_REASON.to_string()),
            }
        } else {
            GateVerdict {
                disqualified: false,
                reason: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn run(conclusion: Option<&str>) -> WorkflowRun {
        WorkflowRun {
            id: 1,
            name: Some("CI".to_string()),
            status: "completed".to_string(),
            conclusion: conclusion.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            run_attempt: 1,
            head_branch: None,
            event: None,
            html_url: None,
        }
    }

    fn definition() -> WorkflowDefinition {
        WorkflowDefinition::new("ci.yml", "on: push\njobs:\n  test:\n    runs-on: ubuntu-latest\n")
    }

    #[test]
    fn test_empty_lists_disqualify() {
        let verdict = CiGate::evaluate(&[], &[]);
        assert!(verdict.disqualified);
        assert_eq!(verdict.reason.as_deref(), Some(NO_CI_REASON));
    }

    #[test]
    fn test_failing_runs_still_count_as_ci() {
        let verdict = CiGate::evaluate(&[run(Some("failure"))], &[]);
        assert!(!verdict.disqualified);
        assert!(verdict.reason.is_none());
    }

    #[test]
    fn test_definition_without_runs_clears_gate() {
        let verdict = CiGate::evaluate(&[], &[definition()]);
        assert!(!verdict.disqualified);
    }

    #[test]
    fn test_verdict_matches_emptiness_for_all_combinations() {
        let runs = [vec![], vec![run(None)]];
        let defs = [vec![], vec![definition()]];
        for r in &runs {
            for d in &defs {
                let verdict = CiGate::evaluate(r, d);
                assert_eq!(verdict.disqualified, r.is_empty() && d.is_empty());
            }
        }
    }
}
