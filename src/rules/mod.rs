//! Builtin rule catalog: a small, concrete set of rules exercising every
//! mechanism the Rule Engine and Fix Engine expose. A product embedding
//! this crate supplies its own, larger catalog the same way.

mod accessibility;
mod security;

use crate::rule::Rule;

/// The rules this crate ships as worked examples / test fixtures for the
/// engine, not an attempt at a complete accessibility/SEO/security
/// catalog.
pub fn builtin_rules() -> Vec<Rule> {
    vec![
        accessibility::images_alt_text(),
        accessibility::form_labels_explicit(),
        security::external_links_security(),
    ]
}

/// Find the byte offset, within `tag_text`, of the position immediately
/// after `attr_name="attr_value"` (or the single-quoted form), searching
/// case-insensitively on the attribute name. Used by fix producers that
/// need to insert text after a specific existing attribute token rather
/// than at the end of the tag.
pub(crate) fn find_attr_token_end(tag_text: &str, attr_name: &str, attr_value: &str) -> Option<usize> {
    let lower = tag_text.to_lowercase();
    let name_lower = attr_name.to_lowercase();
    let mut search_from = 0;
    while let Some(rel) = lower[search_from..].find(&name_lower) {
        let idx = search_from + rel;
        let before_ok = idx == 0 || !lower.as_bytes()[idx - 1].is_ascii_alphanumeric();
        let mut cursor = idx + name_lower.len();
        let rest = &tag_text[cursor..];
        let after_ws = rest.trim_start();
        cursor += rest.len() - after_ws.len();
        if before_ok && tag_text[cursor..].starts_with('=') {
            cursor += 1;
            let rest = &tag_text[cursor..];
            let after_ws = rest.trim_start();
            cursor += rest.len() - after_ws.len();
            if let Some(quote) = tag_text[cursor..].chars().next().filter(|c| *c == '"' || *c == '\'') {
                let value_start = cursor + 1;
                if let Some(end_rel) = tag_text[value_start..].find(quote) {
                    let value_end = value_start + end_rel;
                    if &tag_text[value_start..value_end] == attr_value {
                        return Some(value_end + 1);
                    }
                    search_from = value_end + 1;
                    continue;
                }
            }
        }
        search_from = idx + name_lower.len();
    }
    None
}

/// Byte offset just before the closing `>` of a start tag's source span
/// (before `/>` for self-closing/void elements), the insertion point used
/// by fixes that append a new attribute.
pub(crate) fn insertion_point_before_close(tag_text: &str, span_start: usize) -> usize {
    if tag_text.trim_end().ends_with("/>") {
        span_start + tag_text.trim_end().len() - 2
    } else {
        span_start + tag_text.trim_end().len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_attr_token_end_after_value() {
        let tag = r#"<a href="https://x.example" target="_blank">"#;
        let end = find_attr_token_end(tag, "target", "_blank").unwrap();
        assert_eq!(&tag[..end], r#"<a href="https://x.example" target="_blank""#);
    }

    #[test]
    fn insertion_point_before_close_handles_self_closing() {
        let tag = r#"<img src="x.jpg">"#;
        let point = insertion_point_before_close(tag, 0);
        assert_eq!(&tag[..point], r#"<img src="x.jpg""#);
    }
}
