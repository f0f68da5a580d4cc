use crate::model::Category;

/// Keyword triggers, checked in order; the first hit adds its clause.
const TRIGGERS: &[(&[&str], &str)] = &[
    (&["unused"], "Remove the unused code or import."),
    (
        &["undefined", "not defined"],
        "Define the name or add the missing import.",
    ),
    (&["too long"], "Split the line to stay within the length limit."),
    (&["debug"], "Remove debugging statements before merging."),
];

fn base_template(category: Category) -> &'static str {
    match category {
        Category::Syntax => "Fix this syntax error so the code parses and runs correctly.",
        Category::Import => "Resolve this import or name reference so the module loads reliably.",
        Category::Security => {
            "Review this security issue and replace the flagged construct with a safe alternative."
        }
        Category::Style => "Align this code with the project's style rules.",
        Category::Complexity => "Reduce complexity by splitting this logic into smaller units.",
    }
}

/// Builds the recommendation text for a finding.
///
/// The rule code takes part in keyword matching alongside the message, so
/// `no-unused-vars` or `no-debugger` trigger the same clauses as their prose.
pub fn recommend(category: Category, code: &str, message: &str) -> String {
    let base = base_template(category);
    let haystack = format!("{code} {message}").to_lowercase();

    TRIGGERS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| haystack.contains(k)))
        .map_or_else(
            || base.to_string(),
            |(_, clause)| format!("{base} {clause}"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_template_without_trigger() {
        let text = recommend(Category::Complexity, "C901", "'main' is too complex (12)");
        assert_eq!(text, base_template(Category::Complexity));
    }

    #[test]
    fn test_unused_trigger() {
        let text = recommend(Category::Import, "F401", "'os' imported but unused");
        assert!(text.starts_with(base_template(Category::Import)));
        assert!(text.ends_with("Remove the unused code or import."));
    }

    #[test]
    fn test_not_defined_trigger() {
        let text = recommend(Category::Import, "no-undef", "'foo' is not defined.");
        assert!(text.ends_with("Define the name or add the missing import."));
    }

    #[test]
    fn test_too_long_trigger() {
        let text = recommend(Category::Style, "E501", "line too long (99 > 79 characters)");
        assert!(text.ends_with("Split the line to stay within the length limit."));
    }

    #[test]
    fn test_rule_code_participates_in_matching() {
        let text = recommend(Category::Style, "no-debugger", "Unexpected statement.");
        assert!(text.ends_with("Remove debugging statements before merging."));
    }

    #[test]
    fn test_only_first_trigger_applies() {
        let text = recommend(Category::Style, "W0", "unused debug helper");
        assert!(text.contains("unused"));
        assert!(!text.contains("debugging"));
    }
}
