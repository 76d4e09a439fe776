//! Lowers one branch's tree-literal text into a [`Document`].
//!
//! Built on the same cursor-based tag tokenizer shape as the HTML parser
//! (tag name, attributes, children, closing tag), with three differences:
//! component references become placeholder `<div>`s, fragments
//! (`<>...</>`) flatten into their children, and attribute values can be
//! `{expression}` or spreads rather than only quoted strings.

use crate::dom::{Document, ElementId};

const ATTR_RENAMES: &[(&str, &str)] = &[
    ("classname", "class"),
    ("htmlfor", "for"),
    ("tabindex", "tabindex"),
    ("readonly", "readonly"),
    ("maxlength", "maxlength"),
    ("minlength", "minlength"),
    ("autocomplete", "autocomplete"),
    ("autofocus", "autofocus"),
    ("srcset", "srcset"),
    ("crossorigin", "crossorigin"),
    ("novalidate", "novalidate"),
];

fn rename_attr(raw: &str) -> String {
    // The rename table is keyed on the camelCase spelling; comparing
    // case-insensitively after lower-casing both sides means a source's
    // exact camelCase casing doesn't need to be reproduced here.
    let lower = raw.to_lowercase();
    for (camel_lower, html_name) in ATTR_RENAMES {
        if lower == *camel_lower {
            return html_name.to_string();
        }
    }
    lower
}

/// Parse one tree-literal branch (starting at its opening `<`) into a
/// fresh `Document`. `source` is the whole component source, `span` the
/// byte range of the literal within it.
pub fn lower_branch(source: &str, span: std::ops::Range<usize>) -> Document {
    let literal = &source[span.clone()];
    let mut doc = Document::with_root_and_source("fragment", source.to_string());
    let root = doc.root_id();
    let mut cursor = Cursor { src: literal, pos: 0, base_offset: span.start };
    lower_children(&mut cursor, &mut doc, root);
    doc
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    base_offset: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn absolute(&self) -> usize {
        self.base_offset + self.pos
    }
}

/// Parse a sequence of sibling nodes (elements, `{expression}` text, plain
/// text) up to (but not including) a closing `</...>` or end of input.
fn lower_children(cursor: &mut Cursor, doc: &mut Document, parent: ElementId) {
    loop {
        cursor.skip_ws();
        match cursor.peek() {
            None => return,
            Some('<') => {
                if cursor.rest().starts_with("</") {
                    return;
                }
                lower_element(cursor, doc, parent);
            }
            Some('{') => {
                // `{expr}` as a child: not a literal tag, contributes no
                // structure. Skip the balanced-brace span.
                skip_balanced(cursor, '{', '}');
            }
            Some(_) => {
                let text = take_text_run(cursor);
                doc.append_text(parent, text);
            }
        }
    }
}

fn take_text_run(cursor: &mut Cursor) -> String {
    let start = cursor.pos;
    while let Some(c) = cursor.peek() {
        if c == '<' || c == '{' {
            break;
        }
        cursor.pos += c.len_utf8();
    }
    cursor.src[start..cursor.pos].to_string()
}

fn skip_balanced(cursor: &mut Cursor, open: char, close: char) {
    debug_assert_eq!(cursor.peek(), Some(open));
    let mut depth = 0usize;
    while let Some(c) = cursor.peek() {
        cursor.pos += c.len_utf8();
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return;
            }
        }
    }
}

fn lower_element(cursor: &mut Cursor, doc: &mut Document, parent: ElementId) {
    let start_offset = cursor.absolute();
    cursor.pos += 1; // consume '<'

    if cursor.peek() == Some('>') {
        // fragment shorthand `<>...</>`
        cursor.pos += 1;
        lower_children(cursor, doc, parent);
        consume_closing_tag(cursor, "");
        return;
    }

    let name = take_ident(cursor);
    let attrs = parse_attributes(cursor, doc, parent, start_offset);

    let self_closing = cursor.rest().starts_with("/>");
    if self_closing {
        cursor.pos += 2;
    } else if cursor.peek() == Some('>') {
        cursor.pos += 1;
    }

    let is_component_ref = name.chars().next().is_some_and(|c| c.is_uppercase());
    let is_fragment = name.eq_ignore_ascii_case("fragment") || name == "React.Fragment";

    if is_fragment {
        if !self_closing {
            lower_children(cursor, doc, parent);
            consume_closing_tag(cursor, &name);
        }
        return;
    }

    let end_offset = cursor.absolute();
    let span = crate::dom::SourceSpan {
        start: start_offset,
        end: end_offset,
        line: 0,
        column: 0,
    };

    if is_component_ref {
        // A component reference is a placeholder with no children, even
        // if the source spells it as a non-self-closing element: don't
        // descend into its JSX children.
        if !self_closing {
            skip_to_matching_close(cursor, &name);
        }
        let id = doc.alloc("div", attrs, Some(span));
        doc.append_child(parent, id);
        return;
    }

    let lower_name = name.to_lowercase();
    let id = doc.alloc(lower_name, attrs, Some(span));
    doc.append_child(parent, id);

    if !self_closing {
        lower_children(cursor, doc, id);
        consume_closing_tag(cursor, &name);
        doc.set_span_end(id, cursor.absolute());
    }
}

fn skip_to_matching_close(cursor: &mut Cursor, name: &str) {
    // Placeholder components don't need their inner structure, but the
    // cursor must still land after the matching close tag so sibling
    // parsing resumes correctly. Track nesting of same-named tags only;
    // an unrelated closing tag at depth 0 ends the search defensively.
    let mut depth = 1usize;
    loop {
        cursor.skip_ws();
        match cursor.peek() {
            None => return,
            Some('<') => {
                if cursor.rest().starts_with("</") {
                    let save = cursor.pos;
                    cursor.pos += 2;
                    let closing_name = take_ident(cursor);
                    cursor.skip_ws();
                    if cursor.peek() == Some('>') {
                        cursor.pos += 1;
                    }
                    if closing_name.eq_ignore_ascii_case(name) {
                        depth -= 1;
                        if depth == 0 {
                            return;
                        }
                    } else if depth == 1 {
                        cursor.pos = save;
                        return;
                    }
                } else {
                    cursor.pos += 1;
                    let opened_name = take_ident(cursor);
                    let _ = parse_attributes_discard(cursor);
                    let self_closing = cursor.rest().starts_with("/>");
                    if self_closing {
                        cursor.pos += 2;
                    } else if cursor.peek() == Some('>') {
                        cursor.pos += 1;
                        if opened_name.eq_ignore_ascii_case(name) {
                            depth += 1;
                        }
                    }
                }
            }
            Some('{') => skip_balanced(cursor, '{', '}'),
            Some(c) => cursor.pos += c.len_utf8(),
        }
    }
}

fn parse_attributes_discard(cursor: &mut Cursor) {
    loop {
        cursor.skip_ws();
        match cursor.peek() {
            Some('/') | Some('>') | None => return,
            Some('{') => {
                skip_balanced(cursor, '{', '}');
            }
            _ => {
                take_ident_attr(cursor);
                cursor.skip_ws();
                if cursor.peek() == Some('=') {
                    cursor.pos += 1;
                    cursor.skip_ws();
                    skip_attr_value(cursor);
                }
            }
        }
    }
}

fn consume_closing_tag(cursor: &mut Cursor, _name: &str) {
    cursor.skip_ws();
    if cursor.rest().starts_with("</") {
        cursor.pos += 2;
        let _ = take_ident(cursor);
        cursor.skip_ws();
        if cursor.peek() == Some('>') {
            cursor.pos += 1;
        }
    }
}

fn take_ident(cursor: &mut Cursor) -> String {
    let start = cursor.pos;
    while let Some(c) = cursor.peek() {
        if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' || c == ':' {
            cursor.pos += c.len_utf8();
        } else {
            break;
        }
    }
    cursor.src[start..cursor.pos].to_string()
}

fn take_ident_attr(cursor: &mut Cursor) -> String {
    take_ident(cursor)
}

fn skip_attr_value(cursor: &mut Cursor) {
    match cursor.peek() {
        Some('"') => {
            cursor.pos += 1;
            while let Some(c) = cursor.peek() {
                cursor.pos += c.len_utf8();
                if c == '"' {
                    break;
                }
            }
        }
        Some('\'') => {
            cursor.pos += 1;
            while let Some(c) = cursor.peek() {
                cursor.pos += c.len_utf8();
                if c == '\'' {
                    break;
                }
            }
        }
        Some('{') => skip_balanced(cursor, '{', '}'),
        _ => {}
    }
}

fn parse_attributes(
    cursor: &mut Cursor,
    _doc: &mut Document,
    _parent: ElementId,
    _start_offset: usize,
) -> crate::dom::Attributes {
    let mut attrs = crate::dom::Attributes::new();
    loop {
        cursor.skip_ws();
        match cursor.peek() {
            Some('/') | Some('>') | None => break,
            Some('{') => {
                // `{...spread}`: a spread attribute records `data-spread`
                // and no other trace.
                skip_balanced(cursor, '{', '}');
                attrs.insert("data-spread".to_string(), "true".to_string());
            }
            _ => {
                let name = take_ident(cursor);
                if name.is_empty() {
                    cursor.pos += 1;
                    continue;
                }
                cursor.skip_ws();
                if cursor.peek() == Some('=') {
                    cursor.pos += 1;
                    cursor.skip_ws();
                    let value = read_attr_value(cursor);
                    attrs.insert(rename_attr(&name), value);
                } else {
                    // value-less attribute: present with value "true",
                    // distinct from the HTML adapter's empty-string
                    // convention for bare attributes.
                    attrs.insert(rename_attr(&name), "true".to_string());
                }
            }
        }
    }
    attrs
}

fn read_attr_value(cursor: &mut Cursor) -> String {
    match cursor.peek() {
        Some('"') => {
            cursor.pos += 1;
            let start = cursor.pos;
            while let Some(c) = cursor.peek() {
                if c == '"' {
                    let value = cursor.src[start..cursor.pos].to_string();
                    cursor.pos += 1;
                    return value;
                }
                cursor.pos += c.len_utf8();
            }
            cursor.src[start..cursor.pos].to_string()
        }
        Some('\'') => {
            cursor.pos += 1;
            let start = cursor.pos;
            while let Some(c) = cursor.peek() {
                if c == '\'' {
                    let value = cursor.src[start..cursor.pos].to_string();
                    cursor.pos += 1;
                    return value;
                }
                cursor.pos += c.len_utf8();
            }
            cursor.src[start..cursor.pos].to_string()
        }
        Some('{') => {
            let start = cursor.pos;
            skip_balanced(cursor, '{', '}');
            let inner = cursor.src[start + 1..cursor.pos - 1].trim();
            // A bare string literal expression (`{"value"}`) is as good as
            // a literal attribute value; anything else becomes the
            // sentinel.
            if (inner.starts_with('"') && inner.ends_with('"') && inner.len() >= 2)
                || (inner.starts_with('\'') && inner.ends_with('\'') && inner.len() >= 2)
            {
                inner[1..inner.len() - 1].to_string()
            } else {
                "{expression}".to_string()
            }
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowers_plain_leaf_element() {
        let src = r#"<img src="x.jpg" alt="">"#;
        let doc = lower_branch(src, 0..src.len());
        let img = doc.root().children().next().unwrap();
        assert_eq!(img.tag_name(), "img");
        assert_eq!(img.get_attribute("src"), Some("x.jpg"));
        assert!(img.has_attribute("alt"));
    }

    #[test]
    fn component_reference_becomes_placeholder_div() {
        let src = "<Header><span>ignored</span></Header>";
        let doc = lower_branch(src, 0..src.len());
        let el = doc.root().children().next().unwrap();
        assert_eq!(el.tag_name(), "div");
        assert_eq!(el.children().count(), 0);
    }

    #[test]
    fn maps_react_attribute_names() {
        let src = r#"<label className="x" htmlFor="y"></label>"#;
        let doc = lower_branch(src, 0..src.len());
        let el = doc.root().children().next().unwrap();
        assert_eq!(el.get_attribute("class"), Some("x"));
        assert_eq!(el.get_attribute("for"), Some("y"));
    }

    #[test]
    fn expression_attribute_value_becomes_sentinel() {
        let src = r#"<div id={computeId()}></div>"#;
        let doc = lower_branch(src, 0..src.len());
        let el = doc.root().children().next().unwrap();
        assert_eq!(el.get_attribute("id"), Some("{expression}"));
    }

    #[test]
    fn valueless_attribute_becomes_true() {
        let src = "<input disabled />";
        let doc = lower_branch(src, 0..src.len());
        let el = doc.root().children().next().unwrap();
        assert_eq!(el.get_attribute("disabled"), Some("true"));
    }

    #[test]
    fn spread_attribute_records_data_spread_only() {
        let src = "<input {...rest} />";
        let doc = lower_branch(src, 0..src.len());
        let el = doc.root().children().next().unwrap();
        assert_eq!(el.get_attribute("data-spread"), Some("true"));
        assert_eq!(el.attributes().len(), 1);
    }

    #[test]
    fn fragment_flattens_into_parent() {
        let src = "<><p>a</p><p>b</p></>";
        let doc = lower_branch(src, 0..src.len());
        assert_eq!(doc.root().children().count(), 2);
    }
}
