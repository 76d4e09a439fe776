//! End-to-end coverage of the public `Sentry` entry point, plus a
//! readability snapshot of a rendered violation line.

use sentry_html::{fix, rules, Config, FixOptions, RuleConfig, Sentry, Severity, SourceKind};
use test_log::test;

fn construct_html(body: &str) -> String {
    format!(
        r#"<html>
            <body>
                {body}
            </body>
        </html>"#
    )
}

fn sentry() -> Sentry {
    Sentry::new(rules::builtin_rules(), Config::default()).unwrap()
}

#[test]
fn a_clean_document_has_no_violations() {
    let sentry = sentry();
    let html = construct_html(r#"<img src="hero.jpg" alt="A hero shot"><label for="name">Name</label><input id="name" type="text">"#);
    let result = sentry.check(&html, SourceKind::Html, "index.html");
    assert!(result.violations.is_empty(), "{:?}", result.violations);
}

#[test]
fn multiple_rules_fire_independently_in_one_document() {
    let sentry = sentry();
    let html = construct_html(
        r#"<img src="hero.jpg"><a href="https://example.com" target="_blank">more</a>"#,
    );
    let result = sentry.check(&html, SourceKind::Html, "index.html");
    let rule_ids: std::collections::BTreeSet<_> =
        result.violations.iter().map(|v| v.rule_id.as_str()).collect();
    assert_eq!(
        rule_ids,
        ["external-links-security", "images-alt-text"].into_iter().collect()
    );
    assert_eq!(result.error_count, 2);
}

#[test]
fn check_with_fixes_reports_fixable_and_safe_counts_separately() {
    let sentry = sentry();
    let html = construct_html(
        r#"<img src="hero.jpg"><label>Name <input type="text"></label>"#,
    );
    let result = sentry.check_with_fixes(&html, SourceKind::Html, "index.html");
    // Both rules are fixable, but only images-alt-text's fix is safe: the
    // label fix invents an id, which is never a safe rewrite.
    assert_eq!(result.fixable_count, 2);
    assert_eq!(result.safe_fix_count, 1);
}

#[test]
fn applying_only_safe_fixes_leaves_the_unsafe_violation_untouched() {
    let sentry = sentry();
    let html = r#"<img src="hero.jpg">"#.to_string();
    let result = sentry.check_with_fixes(&html, SourceKind::Html, "index.html");
    let edits: Vec<_> = result.base.violations.iter().filter_map(|v| v.fix.clone()).collect();
    let options = FixOptions { safe_only: true, ..Default::default() };
    let fixed = fix::apply_fixes(&html, &edits, &options);
    assert!(fixed.has_changes);
    assert_eq!(fixed.fixed, r#"<img src="hero.jpg" alt="">"#);
}

#[test]
fn global_rule_config_can_downgrade_a_rule_to_warning() {
    let mut config = Config::default();
    config
        .rules
        .insert("images-alt-text".to_string(), RuleConfig::severity(Severity::Warning));
    let sentry = Sentry::new(rules::builtin_rules(), config).unwrap();
    let result = sentry.check(r#"<img src="hero.jpg">"#, SourceKind::Html, "index.html");
    assert_eq!(result.violations[0].severity, Severity::Warning);
    assert_eq!(result.warning_count, 1);
    assert_eq!(result.error_count, 0);
}

#[test]
fn config_rejects_a_max_warnings_that_wraps_negative() {
    // usize::MAX reinterpreted as i64 is -1; validate() exists specifically
    // to catch this overflow rather than trusting the unsigned type alone.
    let mut config = Config::default();
    config.max_warnings = Some(usize::MAX);
    assert!(config.validate().is_err());

    config.max_warnings = Some(10);
    assert!(config.validate().is_ok());
}

#[test]
fn a_rendered_violation_line_matches_the_documented_shape() {
    let sentry = sentry();
    let result = sentry.check(r#"<img src="test.jpg">"#, SourceKind::Html, "index.html");
    let v = &result.violations[0];
    let line = format!(
        "{}:{}:{} [{}] {} | {}",
        v.rule_id, v.line, v.column, v.severity, v.message, v.element
    );
    insta::assert_snapshot!(line, @r#"images-alt-text:1:0 [error] image is missing an alt attribute | <img src="test.jpg">"#);
}

#[test]
fn component_sources_are_checked_branch_by_branch() {
    let sentry = sentry();
    let src = "const Banner = (props) => { return props.ok ? <p>ok</p> : <img src=\"x.jpg\">; };";
    let result = sentry.check(src, SourceKind::Component, "Banner.jsx");
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].component.as_deref(), Some("Banner"));
    assert_eq!(result.violations[0].rule_id, "images-alt-text");
}
