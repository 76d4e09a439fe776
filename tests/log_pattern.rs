//! An unparsable selector pattern is a reported failure, not a fatal one:
//! the check keeps going, the pattern just matches nothing, and a warning
//! is logged so the problem is visible.

#[test]
fn an_unparsable_pattern_logs_a_warning_and_matches_nothing() {
    mock_logger::init();

    let doc = sentry_html::html::parse(r#"<div></div>"#);
    let matches = sentry_html::selector::select_all(&doc, "div:unknown-predicate(x");
    assert!(matches.is_empty());

    mock_logger::MockLogger::entries(|entries| {
        assert!(
            entries
                .iter()
                .any(|l| l.level == log::Level::Warn
                    && l.body.contains("failed to parse selector pattern")),
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
