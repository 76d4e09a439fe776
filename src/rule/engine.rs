//! The Rule Engine's execution loop.

use super::{Context, Rule, Severity, Violation};
use crate::dom::Document;
use crate::scope::OptionsMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run every rule in `rules` whose effective severity (from
/// `effective_severity`) is not `off` against `doc`, collecting one
/// `Violation` per non-none predicate result.
///
/// `effective_severity` and `effective_options` let the caller fold in
/// scope resolution without this engine knowing about scopes at all: it
/// takes an effective-severity function as an input, not a scope registry.
pub fn run_rules<'a>(
    doc: &'a Document,
    rules: &[Rule],
    effective_severity: impl Fn(&str) -> Severity,
    effective_options: impl Fn(&str) -> OptionsMap,
    fix_mode: bool,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for rule in rules {
        let severity = effective_severity(&rule.id);
        if !severity.is_active() {
            continue;
        }
        let Some(pattern) = rule.pattern() else {
            continue;
        };

        let options = effective_options(&rule.id);
        let ctx = Context::new(doc, &options);

        for element in crate::selector::evaluate(pattern, doc) {
            let outcome = catch_unwind(AssertUnwindSafe(|| (rule.predicate())(element, &ctx)));

            let message = match outcome {
                Ok(Some(message)) => message,
                Ok(None) => continue,
                Err(panic) => {
                    let reason = panic_message(&panic);
                    violations.push(Violation {
                        rule_id: rule.id.clone(),
                        rule_name: rule.name.clone(),
                        message: format!("rule predicate panicked: {reason}"),
                        severity: Severity::Error,
                        line: element.source_location().map(|s| s.line).unwrap_or(0),
                        column: element.source_location().map(|s| s.column).unwrap_or(0),
                        element: element.to_tag_string(),
                        snippet: element.snippet(),
                        suggestion: None,
                        fix: None,
                        component: None,
                        scope: None,
                        element_path: element_path(element),
                    });
                    continue;
                }
            };

            let suggestion = rule.suggestion().map(|s| s(element));
            let fix = if fix_mode {
                rule.fix_producer().and_then(|f| f(element, &ctx))
            } else {
                None
            };
            let source_location = element.source_location();

            violations.push(Violation {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                message,
                severity,
                line: source_location.map(|s| s.line).unwrap_or(0),
                column: source_location.map(|s| s.column).unwrap_or(0),
                element: element.to_tag_string(),
                snippet: element.snippet(),
                suggestion,
                fix,
                component: None,
                scope: None,
                element_path: element_path(element),
            });
        }
    }

    violations
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn element_path(element: crate::dom::ElementRef) -> Vec<String> {
    let mut path: Vec<String> = element
        .ancestors()
        .map(breadcrumb_segment)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    path.push(breadcrumb_segment(element));
    path
}

fn breadcrumb_segment(element: crate::dom::ElementRef) -> String {
    match element.get_attribute("class").and_then(|c| c.split_ascii_whitespace().next()) {
        Some(first_class) => format!("{}.{}", element.tag_name(), first_class),
        None => element.tag_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Category, Rule};

    #[test]
    fn predicate_hit_becomes_a_violation() {
        let doc = crate::html::parse(r#"<img src="x.jpg">"#);
        let rule = Rule::new(
            "images-alt-text",
            "Images must have alt text",
            "desc",
            Category::Accessibility,
            Severity::Error,
            "img:without(alt)",
            |_el, _ctx| Some("missing alt".to_string()),
            "https://example.invalid/rules/images-alt-text",
        );
        let violations = run_rules(&doc, &[rule], |_| Severity::Error, |_| OptionsMap::new(), false);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule_id, "images-alt-text");
    }

    #[test]
    fn off_severity_disables_the_rule_entirely() {
        let doc = crate::html::parse(r#"<img src="x.jpg">"#);
        let rule = Rule::new(
            "images-alt-text",
            "Images must have alt text",
            "desc",
            Category::Accessibility,
            Severity::Error,
            "img:without(alt)",
            |_el, _ctx| Some("missing alt".to_string()),
            "https://example.invalid/rules/images-alt-text",
        );
        let violations = run_rules(&doc, &[rule], |_| Severity::Off, |_| OptionsMap::new(), false);
        assert!(violations.is_empty());
    }

    #[test]
    fn panicking_predicate_becomes_an_internal_violation() {
        let doc = crate::html::parse(r#"<img src="x.jpg">"#);
        let rule = Rule::new(
            "broken-rule",
            "Broken rule",
            "desc",
            Category::BestPractice,
            Severity::Warning,
            "img",
            |_el, _ctx| panic!("boom"),
            "https://example.invalid/rules/broken-rule",
        );
        let violations = run_rules(&doc, &[rule], |_| Severity::Warning, |_| OptionsMap::new(), false);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("panicked"));
    }
}
