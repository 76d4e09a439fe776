//! A fix whose recorded `oldText` no longer matches the live source is
//! skipped rather than applied blind, and the skip is logged so a caller
//! reusing stale `Edit`s against re-edited source can tell why nothing
//! changed.

use sentry_html::fix::{apply_fixes, Edit, FixOptions};

#[test]
fn a_stale_old_text_logs_a_warning_and_skips_the_edit() {
    mock_logger::init();

    let src = "<img src=\"x\">";
    let edit = Edit::new("images-alt-text", 0, 4, "XXXX", " alt", "bad", true);
    let result = apply_fixes(src, &[edit], &FixOptions::default());
    assert_eq!(result.fixed, src);

    mock_logger::MockLogger::entries(|entries| {
        assert!(
            entries.iter().any(|l| l.level == log::Level::Warn
                && l.body.contains("no longer matches recorded oldText")),
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
