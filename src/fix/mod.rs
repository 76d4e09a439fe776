//! Fix Engine: turns Edits produced by rule fix producers into validated,
//! deconflicted byte splices.

use serde::{Deserialize, Serialize};

/// A proposed byte-range replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    pub id: String,
    pub rule_id: String,
    pub description: String,
    pub start: usize,
    pub end: usize,
    pub old_text: String,
    pub new_text: String,
    pub priority: Option<i32>,
    pub safe: bool,
}

impl Edit {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rule_id: impl Into<String>,
        start: usize,
        end: usize,
        old_text: impl Into<String>,
        new_text: impl Into<String>,
        description: impl Into<String>,
        safe: bool,
    ) -> Self {
        let rule_id = rule_id.into();
        let id = format!("{rule_id}-{start}");
        Edit {
            id,
            rule_id,
            description: description.into(),
            start,
            end,
            old_text: old_text.into(),
            new_text: new_text.into(),
            priority: None,
            safe,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Another kept edit exactly shares this edit's byte range.
    SameLocation,
    /// Another kept edit's byte range overlaps this one without being
    /// identical.
    Overlap,
    /// `bytes[start..end]` no longer equals `oldText` at apply time.
    StaleSource,
    /// Dropped by `maxFixes` as a lower-priority (smaller-offset) survivor.
    MaxFixesExceeded,
    /// Excluded by `safeOnly` or the rule include/exclude allowlists.
    Filtered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedEdit {
    pub edit: Edit,
    pub reason: SkipReason,
}

/// Knobs for [`apply_fixes`].
#[derive(Debug, Clone, Default)]
pub struct FixOptions {
    pub safe_only: bool,
    pub dry_run: bool,
    pub include_rules: Option<Vec<String>>,
    pub exclude_rules: Vec<String>,
    pub max_fixes: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct FixResult {
    pub original: String,
    pub fixed: String,
    pub applied: Vec<Edit>,
    pub skipped: Vec<SkippedEdit>,
    pub has_changes: bool,
    pub count: usize,
}

/// Filters, deconflicts, and applies a flat list of candidate edits
/// (typically `Violation::fix` values, already unwrapped by the caller)
/// against the original source bytes: filter by safety/allowlist, sort by
/// descending start offset, drop overlapping or same-location edits in
/// favor of the larger-offset survivor, enforce `max_fixes`, validate each
/// edit's `old_text` against the live source, then splice.
pub fn apply_fixes(original: &str, edits: &[Edit], options: &FixOptions) -> FixResult {
    let mut skipped: Vec<SkippedEdit> = Vec::new();

    let filtered: Vec<Edit> = edits
        .iter()
        .filter(|e| {
            if options.safe_only && !e.safe {
                skipped.push(SkippedEdit {
                    edit: (*e).clone(),
                    reason: SkipReason::Filtered,
                });
                return false;
            }
            if let Some(include) = &options.include_rules {
                if !include.contains(&e.rule_id) {
                    skipped.push(SkippedEdit {
                        edit: (*e).clone(),
                        reason: SkipReason::Filtered,
                    });
                    return false;
                }
            }
            if options.exclude_rules.contains(&e.rule_id) {
                skipped.push(SkippedEdit {
                    edit: (*e).clone(),
                    reason: SkipReason::Filtered,
                });
                return false;
            }
            true
        })
        .cloned()
        .collect();

    let mut ordered = filtered;
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut kept: Vec<Edit> = Vec::new();
    for edit in ordered {
        let overlaps = kept.iter().any(|k| ranges_overlap(k, &edit));
        if overlaps {
            let exact = kept
                .iter()
                .any(|k| k.start == edit.start && k.end == edit.end);
            skipped.push(SkippedEdit {
                edit,
                reason: if exact {
                    SkipReason::SameLocation
                } else {
                    SkipReason::Overlap
                },
            });
            continue;
        }
        kept.push(edit);
    }

    if let Some(max) = options.max_fixes {
        if kept.len() > max {
            // kept is in descending-offset order; the trailing entries are
            // the smaller-offset (lower-priority) survivors.
            let dropped = kept.split_off(max);
            skipped.extend(dropped.into_iter().map(|edit| SkippedEdit {
                edit,
                reason: SkipReason::MaxFixesExceeded,
            }));
        }
    }

    let mut bytes = original.to_string();
    let mut applied = Vec::new();
    for edit in kept {
        let Some(slice) = bytes.get(edit.start..edit.end) else {
            skipped.push(SkippedEdit {
                edit,
                reason: SkipReason::StaleSource,
            });
            continue;
        };
        if slice != edit.old_text {
            log::warn!(
                "fix `{}` skipped: source at [{}, {}) no longer matches recorded oldText",
                edit.id,
                edit.start,
                edit.end
            );
            skipped.push(SkippedEdit {
                edit,
                reason: SkipReason::StaleSource,
            });
            continue;
        }
        if !options.dry_run {
            bytes.replace_range(edit.start..edit.end, &edit.new_text);
        }
        applied.push(edit);
    }

    // kept/applied were processed in descending-offset order, walk is
    // indifferent to ordering of the returned list; sort ascending for a
    // stable, readable report.
    applied.sort_by(|a, b| a.start.cmp(&b.start));

    let has_changes = !options.dry_run && !applied.is_empty();
    let fixed = if options.dry_run {
        original.to_string()
    } else {
        bytes
    };
    let count = applied.len();

    FixResult {
        original: original.to_string(),
        fixed,
        applied,
        skipped,
        has_changes,
        count,
    }
}

fn ranges_overlap(a: &Edit, b: &Edit) -> bool {
    a.start < b.end && b.start < a.end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_edit_list_is_a_no_op() {
        let result = apply_fixes("<img src=\"x\">", &[], &FixOptions::default());
        assert_eq!(result.fixed, "<img src=\"x\">");
        assert!(!result.has_changes);
    }

    #[test]
    fn inserts_alt_attribute_before_closing_angle_bracket() {
        let src = r#"<img src="test.jpg">"#;
        let offset = src.len() - 1;
        let edit = Edit::new("images-alt-text", offset, offset, "", " alt=\"\"", "add alt", true);
        let result = apply_fixes(src, &[edit], &FixOptions::default());
        assert_eq!(result.fixed, r#"<img src="test.jpg" alt="">"#);
        assert!(result.has_changes);
    }

    #[test]
    fn dry_run_reports_without_mutating() {
        let src = r#"<img src="test.jpg">"#;
        let offset = src.len() - 1;
        let edit = Edit::new("images-alt-text", offset, offset, "", " alt=\"\"", "add alt", true);
        let options = FixOptions { dry_run: true, ..Default::default() };
        let result = apply_fixes(src, &[edit], &options);
        assert_eq!(result.fixed, src);
        assert!(!result.has_changes);
        assert_eq!(result.count, 1);
    }

    #[test]
    fn overlapping_edits_keep_the_later_offset_and_skip_the_other() {
        let src = "0123456789012345";
        let a = Edit::new("rule-a", 5, 10, &src[5..10], "AAAAA", "a", true);
        let b = Edit::new("rule-b", 8, 15, &src[8..15], "BBBBBBB", "b", true);
        let result = apply_fixes(src, &[a, b], &FixOptions::default());
        assert_eq!(result.applied.len(), 1);
        assert_eq!(result.applied[0].rule_id, "rule-b");
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].reason, SkipReason::Overlap);
    }

    #[test]
    fn stale_old_text_is_skipped_not_applied() {
        let src = "<img src=\"x\">";
        let edit = Edit::new("images-alt-text", 0, 4, "XXXX", " alt", "bad", true);
        let result = apply_fixes(src, &[edit], &FixOptions::default());
        assert_eq!(result.fixed, src);
        assert_eq!(result.skipped[0].reason, SkipReason::StaleSource);
    }

    #[test]
    fn max_fixes_drops_smallest_offset_survivors() {
        let src = "0123456789";
        let a = Edit::new("r", 1, 2, "1", "a", "", true);
        let b = Edit::new("r", 4, 5, "4", "b", "", true);
        let c = Edit::new("r", 7, 8, "7", "c", "", true);
        let options = FixOptions { max_fixes: Some(2), ..Default::default() };
        let result = apply_fixes(src, &[a, b, c], &options);
        assert_eq!(result.applied.len(), 2);
        assert!(result.applied.iter().all(|e| e.start != 1));
        assert!(result
            .skipped
            .iter()
            .any(|s| s.reason == SkipReason::MaxFixesExceeded));
    }

    #[test]
    fn safe_only_filters_unsafe_edits() {
        let src = "0123456789";
        let edit = Edit::new("r", 1, 2, "1", "x", "", false);
        let options = FixOptions { safe_only: true, ..Default::default() };
        let result = apply_fixes(src, &[edit], &options);
        assert!(result.applied.is_empty());
        assert_eq!(result.skipped[0].reason, SkipReason::Filtered);
    }
}
