//! Accessibility rules.

use super::insertion_point_before_close;
use crate::fix::Edit;
use crate::rule::{Category, Rule, Severity};

pub fn images_alt_text() -> Rule {
    Rule::new(
        "images-alt-text",
        "Images must have alt text",
        "An <img> without an alt attribute has no accessible description for screen readers.",
        Category::Accessibility,
        Severity::Error,
        "img:without(alt)",
        |_el, _ctx| Some("image is missing an alt attribute".to_string()),
        "https://example.invalid/rules/images-alt-text",
    )
    .with_suggestion(|_el| "add a descriptive alt attribute, or alt=\"\" if purely decorative".to_string())
    .with_fix(|el, ctx| {
        let span = el.source_location()?;
        let tag_text = ctx.document().source().get(span.start..span.end)?;
        let point = insertion_point_before_close(tag_text, span.start);
        Some(Edit::new(
            "images-alt-text",
            point,
            point,
            "",
            " alt=\"\"",
            "insert an empty alt attribute",
            true,
        ))
    })
}

pub fn form_labels_explicit() -> Rule {
    Rule::new(
        "form-labels-explicit",
        "Labels must explicitly reference their control",
        "A <label> that only wraps its control works for pointer users but breaks voice control \
         software, which looks up controls by the label's for/id association.",
        Category::Accessibility,
        Severity::Error,
        "label:without(for):has(input, select, textarea)",
        |_el, _ctx| {
            Some(
                "label does not explicitly reference a control via `for`; this breaks voice \
                 control software that targets controls by label text"
                    .to_string(),
            )
        },
        "https://example.invalid/rules/form-labels-explicit",
    )
    .with_suggestion(|_el| {
        "add an id to the control and a matching for attribute on the label".to_string()
    })
    .with_fix(|el, ctx| {
        let span = el.source_location()?;
        let tag_text = ctx.document().source().get(span.start..span.end)?;
        let point = insertion_point_before_close(tag_text, span.start);
        // Unsafe: this assumes a control inside the label will be given
        // the matching id, which requires a human decision about what
        // identifier to use.
        Some(Edit::new(
            "form-labels-explicit",
            point,
            point,
            "",
            " for=\"generated-id\"",
            "reference a control via for; the control's id must be set to match",
            false,
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
    fn missing_alt_produces_the_documented_fix() {
        let doc = html::parse(r#"<img src="test.jpg">"#);
        let el = doc.root().children().next().unwrap();
        let options = OptionsMap::new();
        let ctx = Context::new(&doc, &options);
        let rule = images_alt_text();
        let message = (rule.predicate())(el, &ctx);
        assert!(message.is_some());
        let edit = rule.fix_producer().unwrap()(el, &ctx).unwrap();
        let result = apply_fixes(doc.source(), &[edit], &FixOptions::default());
        assert_eq!(result.fixed, r#"<img src="test.jpg" alt="">"#);
    }

    #[test]
    fn label_without_for_is_flagged_and_unsafe() {
        let doc = html::parse(r#"<label>Name <input type="text"></label>"#);
        let label = doc.root().children().next().unwrap();
        let options = OptionsMap::new();
        let ctx = Context::new(&doc, &options);
        let rule = form_labels_explicit();
        assert!((rule.predicate())(label, &ctx).is_some());
        let edit = rule.fix_producer().unwrap()(label, &ctx).unwrap();
        assert!(!edit.safe);
    }
}
