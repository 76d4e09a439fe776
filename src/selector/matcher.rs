//! Pattern evaluation order: base match, then predicates, then `:count`.

use super::parser::{BaseSelector, Pattern, PatternAlternative, Predicate};
use crate::dom::{Document, ElementId, ElementRef};
use std::collections::HashSet;

/// Evaluate a pattern against a whole document: base matches in document
/// order, author-order predicate filtering, `:count` as a final gate, with
/// `,`-alternation unioned and deduplicated while preserving document order.
pub fn evaluate<'a>(pattern: &Pattern, doc: &'a Document) -> Vec<ElementRef<'a>> {
    let ids = evaluate_ids(pattern, doc);
    doc.walk().filter(|el| ids.contains(&el.id())).collect()
}

pub fn select_all<'a>(doc: &'a Document, pattern_src: &str) -> Vec<ElementRef<'a>> {
    let pattern = super::compile_lenient(pattern_src);
    evaluate(&pattern, doc)
}

pub fn select_first<'a>(doc: &'a Document, pattern_src: &str) -> Option<ElementRef<'a>> {
    select_all(doc, pattern_src).into_iter().next()
}

pub(crate) fn evaluate_ids(pattern: &Pattern, doc: &Document) -> HashSet<ElementId> {
    let mut set = HashSet::new();
    for alt in &pattern.alternatives {
        set.extend(evaluate_alternative(alt, doc));
    }
    set
}

fn evaluate_alternative(alt: &PatternAlternative, doc: &Document) -> Vec<ElementId> {
    let mut matches: Vec<ElementId> = doc
        .walk()
        .filter(|el| base_matches(&alt.base, *el))
        .map(|el| el.id())
        .collect();

    let mut count_gates = Vec::new();
    for pred in &alt.predicates {
        if let Predicate::Count(op, n) = pred {
            count_gates.push((*op, *n));
            continue;
        }
        matches.retain(|id| predicate_matches(pred, doc.at(*id), doc));
    }
    for (op, n) in count_gates {
        if !op.eval(matches.len(), n) {
            matches.clear();
        }
    }
    matches
}

fn base_matches(base: &BaseSelector, el: ElementRef) -> bool {
    match base {
        BaseSelector::Universal => true,
        BaseSelector::Tag(t) => el.tag_name() == t,
        BaseSelector::Id(id) => el.get_attribute("id") == Some(id.as_str()),
        BaseSelector::Class(c) => el.attributes().has_class(c),
        BaseSelector::Attr { name, value } => attr_matches(el, name, value.as_deref()),
        BaseSelector::TagAttr { tag, name, value } => {
            el.tag_name() == tag && attr_matches(el, name, value.as_deref())
        }
    }
}

fn attr_matches(el: ElementRef, name: &str, value: Option<&str>) -> bool {
    match value {
        None => el.has_attribute(name),
        Some(v) => el.get_attribute(name) == Some(v),
    }
}

fn predicate_matches(pred: &Predicate, el: ElementRef, doc: &Document) -> bool {
    match pred {
        Predicate::Contains(s) => el.text_content().contains(s.as_str()),
        Predicate::ContainsI(s) => el
            .text_content()
            .to_lowercase()
            .contains(&s.to_lowercase()),
        Predicate::ContainsRegex(re) => re.is_match(&el.text_content()),
        Predicate::Has(p) => {
            let matched = evaluate_ids(p, doc);
            el.descendants().any(|d| matched.contains(&d.id()))
        }
        Predicate::HasParent(p) => {
            let matched = evaluate_ids(p, doc);
            el.parent().is_some_and(|par| matched.contains(&par.id()))
        }
        Predicate::HasAncestor(p) => {
            let matched = evaluate_ids(p, doc);
            el.ancestors().any(|a| matched.contains(&a.id()))
        }
        Predicate::HasSibling(p) => {
            let matched = evaluate_ids(p, doc);
            el.siblings().into_iter().any(|s| matched.contains(&s.id()))
        }
        Predicate::Without(attr) => !el.has_attribute(attr),
        Predicate::Not(p) => {
            let matched = evaluate_ids(p, doc);
            !matched.contains(&el.id())
        }
        Predicate::Count(..) => unreachable!("count is applied as a result-set gate, not per-element"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html;

    #[test]
    fn contains_i_matches_case_insensitively() {
        let doc = html::parse("<a>Click Here</a><a>click here</a>");
        let pattern = Pattern::compile(r#"a:contains-i("click here")"#).unwrap();
        let matches = evaluate(&pattern, &doc);
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn without_distinguishes_absent_from_empty() {
        let doc = html::parse(r#"<img alt="x"><img><img alt="">"#);
        let pattern = Pattern::compile("img:without(alt)").unwrap();
        let matches = evaluate(&pattern, &doc);
        assert_eq!(matches.len(), 1);
        assert!(!matches[0].has_attribute("alt"));
    }

    #[test]
    fn has_matches_descendant() {
        let doc = html::parse("<div><span>x</span></div><div></div>");
        let pattern = Pattern::compile("div:has(span)").unwrap();
        let matches = evaluate(&pattern, &doc);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn not_excludes_matches_of_inner_pattern() {
        let doc = html::parse("<div class=\"a\"></div><div class=\"b\"></div>");
        let pattern = Pattern::compile("div:not(.a)").unwrap();
        let matches = evaluate(&pattern, &doc);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].get_attribute("class"), Some("b"));
    }

    #[test]
    fn count_gate_empties_result_set_when_unmet() {
        let doc = html::parse("<h1>a</h1>");
        let pattern = Pattern::compile("h1:count(> 1)").unwrap();
        assert!(evaluate(&pattern, &doc).is_empty());
    }

    #[test]
    fn alternation_unions_in_document_order() {
        let doc = html::parse("<h1>one</h1><p>two</p><h1>three</h1>");
        let pattern = Pattern::compile("p, h1").unwrap();
        let matches = evaluate(&pattern, &doc);
        let tags: Vec<_> = matches.iter().map(|e| e.tag_name()).collect();
        assert_eq!(tags, vec!["h1", "p", "h1"]);
    }
}
