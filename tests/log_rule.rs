//! A rule registered with an unparsable pattern still constructs: it just
//! never matches anything, and `Rule::new` logs the failure at
//! construction time rather than panicking the caller.

use sentry_html::rule::{Category, Rule, Severity};

#[test]
fn rule_new_logs_the_pattern_it_could_not_compile() {
    mock_logger::init();

    let rule = Rule::new(
        "broken-rule",
        "Broken rule",
        "exercises the pattern-compile-failure path",
        Category::BestPractice,
        Severity::Warning,
        "div:unknown-predicate(x",
        |_el, _ctx| None,
        "https://example.invalid/rules/broken-rule",
    );
    assert_eq!(rule.pattern_source(), "div:unknown-predicate(x");

    mock_logger::MockLogger::entries(|entries| {
        assert!(
            entries.iter().any(|l| l.level == log::Level::Warn
                && l.body.contains("rule `broken-rule`")
                && l.body.contains("failed to compile pattern")),
            "{}",
            entries
                .iter()
                .filter(|l| l.body.contains("sentry_html"))
                .map(|l| l.body.clone())
                .collect::<Vec<_>>()
                .join("\n")
        );
    });
}
