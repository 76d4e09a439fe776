//! Security rules.

use super::{find_attr_token_end, insertion_point_before_close};
use crate::fix::Edit;
use crate::rule::{Category, Rule, Severity};

pub fn external_links_security() -> Rule {
    Rule::new(
        "external-links-security",
        "External links opened in a new tab need rel=\"noopener noreferrer\"",
        "A target=\"_blank\" link without rel=\"noopener noreferrer\" lets the opened page access \
         window.opener and spoof the referring page, and leaks the referrer URL.",
        Category::Security,
        Severity::Error,
        r#"a[target="_blank"]"#,
        |el, _ctx| {
            let rel = el.get_attribute("rel").unwrap_or("");
            let has_noopener = rel.split_ascii_whitespace().any(|t| t == "noopener");
            let has_noreferrer = rel.split_ascii_whitespace().any(|t| t == "noreferrer");
            if has_noopener && has_noreferrer {
                return None;
            }
            Some(
                "link opens in a new tab without rel=\"noopener noreferrer\", exposing window.opener \
                 to the destination page"
                    .to_string(),
            )
        },
        "https://example.invalid/rules/external-links-security",
    )
    .with_suggestion(|_el| "add rel=\"noopener noreferrer\"".to_string())
    .with_fix(|el, ctx| {
        let span = el.source_location()?;
        let tag_text = ctx.document().source().get(span.start..span.end)?;
        let point = match find_attr_token_end(tag_text, "target", "_blank") {
            Some(rel_offset) => span.start + rel_offset,
            None => insertion_point_before_close(tag_text, span.start),
        };
        Some(Edit::new(
            "external-links-security",
            point,
            point,
            "",
            " rel=\"noopener noreferrer\"",
            "insert rel=\"noopener noreferrer\" after target=\"_blank\"",
            true,
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::{apply_fixes, FixOptions};
    use crate::html;
    use crate::rule::Context;
    use crate::scope::OptionsMap;

    #[test]
    fn external_link_gets_rel_inserted_after_target() {
        let doc = html::parse(r#"<a href="https://x.example" target="_blank">x</a>"#);
        let el = doc.root().children().next().unwrap();
        let options = OptionsMap::new();
        let ctx = Context::new(&doc, &options);
        let rule = external_links_security();
        assert!((rule.predicate())(el, &ctx).is_some());
        let edit = rule.fix_producer().unwrap()(el, &ctx).unwrap();
        let result = apply_fixes(doc.source(), &[edit], &FixOptions::default());
        assert_eq!(
            result.fixed,
            r#"<a href="https://x.example" target="_blank" rel="noopener noreferrer">x</a>"#
        );
    }

    #[test]
    fn existing_rel_with_both_tokens_is_not_flagged() {
        let doc =
            html::parse(r#"<a href="https://x.example" target="_blank" rel="noopener noreferrer">x</a>"#);
        let el = doc.root().children().next().unwrap();
        let options = OptionsMap::new();
        let ctx = Context::new(&doc, &options);
        let rule = external_links_security();
        assert!((rule.predicate())(el, &ctx).is_none());
    }
}
