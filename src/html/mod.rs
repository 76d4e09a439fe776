//! HTML Parser Adapter: a small hand-rolled tag-soup tokenizer/builder
//! rather than `html5ever`/`markup5ever`, since neither crate's `TreeSink`
//! carries the per-token byte offsets every element needs. See DESIGN.md
//! for the dependency-drop rationale.

use crate::dom::{Attributes, Document, ElementId, SourceSpan};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Parse HTML bytes into a [`Document`] with source spans for every element.
/// Malformed input is recovered from rather than rejected:
/// unmatched close tags are ignored, mismatched nesting closes back to the
/// nearest matching open ancestor, and any input without a single top-level
/// element gets a synthesized `<html>` root.
pub fn parse(source: &str) -> Document {
    let mut doc = Document::with_root_and_source("html", source.to_string());
    let root = doc.root_id();
    let mut stack: Vec<ElementId> = vec![root];
    let mut cursor = Cursor::new(source);

    while let Some(pos) = cursor.pos_of_next_lt() {
        if pos > cursor.pos() {
            let text = cursor.take_until(pos);
            append_text(&mut doc, &stack, text);
        }
        debug_assert_eq!(cursor.pos(), pos);

        if cursor.starts_with("<!--") {
            cursor.skip_until_after("-->");
        } else if cursor.starts_with("<!") {
            cursor.skip_until_after(">");
        } else if cursor.starts_with("</") {
            handle_end_tag(&mut doc, &mut stack, &mut cursor);
        } else if let Some(tag) = parse_start_tag(&mut cursor) {
            let name = tag.name.clone();
            let self_closing = tag.self_closing;
            let is_raw_text = RAW_TEXT_ELEMENTS.contains(&name.as_str());
            handle_start_tag(&mut doc, &mut stack, tag);
            if is_raw_text && !self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
                consume_raw_text_element(&mut doc, &mut stack, &mut cursor, &name);
            }
        } else {
            // Stray '<' that isn't a recognizable tag opener: emit it as text
            // and keep scanning, matching tag-soup recovery.
            let text = cursor.take(1);
            append_text(&mut doc, &stack, text);
        }
    }
    let remaining = cursor.take_rest();
    if !remaining.is_empty() {
        append_text(&mut doc, &stack, remaining);
    }

    // Implicitly close anything still open at EOF.
    let eof = source.len();
    for id in stack.into_iter().rev() {
        if id == root {
            continue;
        }
        close_element(&mut doc, id, eof);
    }

    promote_single_html_root(&mut doc);
    doc
}

/// If the synthetic root's only element child is a literal top-level
/// `<html>` (with nothing but whitespace alongside it), use that element as
/// the document root instead of keeping the synthetic wrapper.
fn promote_single_html_root(doc: &mut Document) {
    let root = doc.root_id();
    let only_whitespace_text = doc.direct_text_is_whitespace_only(root);
    let element_children: Vec<ElementId> = doc.root().children().map(|c| c.id()).collect();
    if only_whitespace_text && element_children.len() == 1 {
        let candidate = element_children[0];
        if doc.at(candidate).tag_name().eq_ignore_ascii_case("html") {
            doc.promote_root(candidate);
        }
    }
}

fn append_text(doc: &mut Document, stack: &[ElementId], text: String) {
    let parent = *stack.last().expect("stack always has the root");
    doc.append_text(parent, text);
}

fn handle_start_tag(doc: &mut Document, stack: &mut Vec<ElementId>, tag: StartTag) {
    let is_void = VOID_ELEMENTS.contains(&tag.name.as_str());
    let start = tag.start;
    let parent = *stack.last().expect("stack always has the root");
    let id = doc.alloc(tag.name.clone(), tag.attributes, Some(SourceSpan {
        start,
        end: tag.end,
        line: tag.line,
        column: tag.column,
    }));
    doc.append_child(parent, id);

    if is_void || tag.self_closing {
        return;
    }

    if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
        stack.push(id);
        return;
    }

    stack.push(id);
}

fn handle_end_tag(doc: &mut Document, stack: &mut Vec<ElementId>, cursor: &mut Cursor) {
    let start = cursor.pos();
    cursor.advance(2); // consume "</"
    let name = cursor.take_ident().to_ascii_lowercase();
    cursor.skip_while(|c| c != '>');
    cursor.advance(1); // consume '>'
    let end = cursor.pos();

    if let Some(depth) = stack
        .iter()
        .rposition(|id| doc.at(*id).tag_name().eq_ignore_ascii_case(&name))
    {
        if depth == 0 {
            // matched the synthetic root itself; never close it explicitly
            return;
        }
        while stack.len() > depth {
            let id = stack.pop().unwrap();
            close_element(doc, id, end);
        }
    }
    // else: stray close tag with no open match, ignored per HTML5 recovery.
    let _ = start;
}

fn close_element(doc: &mut Document, id: ElementId, end: usize) {
    doc.set_span_end(id, end);
}

/// `script`/`style`/`textarea`/`title` content is not tag-soup: everything
/// up to the literal matching end tag is text, even if it contains `<`
/// (e.g. `if (a < b)` inside a `<script>`).
fn consume_raw_text_element(
    doc: &mut Document,
    stack: &mut Vec<ElementId>,
    cursor: &mut Cursor,
    name: &str,
) {
    let needle_lower = format!("</{}", name.to_ascii_lowercase());
    let rest = &cursor.src[cursor.pos..];
    let rest_lower = rest.to_ascii_lowercase();
    match rest_lower.find(&needle_lower) {
        Some(rel) => {
            let text = cursor.take_until(cursor.pos + rel);
            append_text(doc, stack, text);
            // Consume the matching end tag itself.
            handle_end_tag(doc, stack, cursor);
        }
        None => {
            let text = cursor.take_rest();
            append_text(doc, stack, text);
            if let Some(id) = stack.pop() {
                let end = cursor.pos();
                close_element(doc, id, end);
            }
        }
    }
}

struct StartTag {
    name: String,
    attributes: Attributes,
    self_closing: bool,
    start: usize,
    end: usize,
    line: usize,
    column: usize,
}

/// Parse one `<tag ...>` (or `<tag .../>`) starting at the cursor's current
/// position (which must be a `<` followed by an ident character). Returns
/// `None` (without moving the cursor) if what follows `<` doesn't look like
/// a tag name.
fn parse_start_tag(cursor: &mut Cursor) -> Option<StartTag> {
    let start = cursor.pos();
    let (line, column) = cursor.line_col(start);
    let checkpoint = cursor.clone();
    cursor.advance(1); // consume '<'
    if !cursor.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
        *cursor = checkpoint;
        return None;
    }
    let name = cursor.take_ident().to_ascii_lowercase();
    let mut attributes = Attributes::new();

    loop {
        cursor.skip_while(|c| c.is_whitespace());
        match cursor.peek() {
            None => break,
            Some('>') => {
                cursor.advance(1);
                break;
            }
            Some('/') => {
                cursor.advance(1);
                cursor.skip_while(|c| c.is_whitespace());
                if cursor.peek() == Some('>') {
                    cursor.advance(1);
                }
                let end = cursor.pos();
                return Some(StartTag {
                    name,
                    attributes,
                    self_closing: true,
                    start,
                    end,
                    line,
                    column,
                });
            }
            Some(_) => {
                let attr_name = cursor
                    .take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/')
                    .to_ascii_lowercase();
                if attr_name.is_empty() {
                    // Unparseable character in attribute position; skip it
                    // rather than looping forever.
                    cursor.advance(1);
                    continue;
                }
                cursor.skip_while(|c| c.is_whitespace());
                if cursor.peek() == Some('=') {
                    cursor.advance(1);
                    cursor.skip_while(|c| c.is_whitespace());
                    let value = match cursor.peek() {
                        Some(q @ ('"' | '\'')) => {
                            cursor.advance(1);
                            let v = cursor.take_while(|c| c != q);
                            if cursor.peek() == Some(q) {
                                cursor.advance(1);
                            }
                            v
                        }
                        _ => cursor.take_while(|c| !c.is_whitespace() && c != '>'),
                    };
                    attributes.insert(attr_name, value);
                } else {
                    attributes.insert(attr_name, "");
                }
            }
        }
    }

    let end = cursor.pos();
    Some(StartTag {
        name,
        attributes,
        self_closing: false,
        start,
        end,
        line,
        column,
    })
}

/// A byte-indexed cursor over the source text with line/column lookup.
#[derive(Clone)]
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Cursor { src, pos: 0 }
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.src[self.pos..].starts_with(s)
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.src.len());
    }

    fn take(&mut self, n: usize) -> String {
        let start = self.pos;
        let mut count = 0;
        let mut end = start;
        for (i, _) in self.src[start..].char_indices() {
            if count == n {
                end = start + i;
                break;
            }
            count += 1;
            end = self.src.len().min(start + i + 1);
        }
        self.pos = end;
        self.src[start..end].to_string()
    }

    fn take_rest(&mut self) -> String {
        let rest = self.src[self.pos..].to_string();
        self.pos = self.src.len();
        rest
    }

    fn take_until(&mut self, until: usize) -> String {
        let s = self.src[self.pos..until].to_string();
        self.pos = until;
        s
    }

    fn skip_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(c) = self.peek() {
            if pred(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
    }

    fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if pred(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn take_ident(&mut self) -> String {
        self.take_while(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
    }

    fn skip_until_after(&mut self, marker: &str) {
        match self.src[self.pos..].find(marker) {
            Some(i) => self.pos += i + marker.len(),
            None => self.pos = self.src.len(),
        }
    }

    /// Byte offset of the next `<` at or after the current position, or
    /// `None` if there isn't one.
    fn pos_of_next_lt(&self) -> Option<usize> {
        if self.pos >= self.src.len() {
            return None;
        }
        self.src[self.pos..].find('<').map(|i| self.pos + i)
    }

    /// 1-based line, 0-based column of a byte offset.
    fn line_col(&self, offset: usize) -> (usize, usize) {
        let prefix = &self.src[..offset];
        let line = prefix.bytes().filter(|&b| b == b'\n').count() + 1;
        let column = match prefix.rfind('\n') {
            Some(i) => prefix[i + 1..].chars().count(),
            None => prefix.chars().count(),
        };
        (line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_tree() {
        let doc = parse("<div class=\"a\"><p>hi</p></div>");
        let div = doc.root().children().next().unwrap();
        assert_eq!(div.tag_name(), "div");
        assert_eq!(div.get_attribute("class"), Some("a"));
        let p = div.children().next().unwrap();
        assert_eq!(p.tag_name(), "p");
        assert_eq!(p.text_content(), "hi");
    }

    #[test]
    fn lower_cases_tag_and_attribute_names() {
        let doc = parse("<DIV ID=\"x\" DATA-Foo=\"bar\"></DIV>");
        let div = doc.root().children().next().unwrap();
        assert_eq!(div.tag_name(), "div");
        assert_eq!(div.get_attribute("id"), Some("x"));
        assert_eq!(div.get_attribute("data-foo"), Some("bar"));
    }

    #[test]
    fn void_element_has_no_children_and_closed_span() {
        let doc = parse(r#"<img src="test.jpg">"#);
        let img = doc.root().children().next().unwrap();
        assert_eq!(img.tag_name(), "img");
        assert_eq!(img.children().count(), 0);
        let span = img.source_location().unwrap();
        assert_eq!(&doc.source()[span.start..span.end], r#"<img src="test.jpg">"#);
    }

    #[test]
    fn attribute_presence_distinct_from_empty_value() {
        let doc = parse(r#"<img alt="x"><img><img alt="">"#);
        let imgs: Vec<_> = doc.root().children().collect();
        assert_eq!(imgs.len(), 3);
        assert!(imgs[0].has_attribute("alt"));
        assert!(!imgs[1].has_attribute("alt"));
        assert!(imgs[2].has_attribute("alt"));
        assert_eq!(imgs[2].get_attribute("alt"), Some(""));
    }

    #[test]
    fn recovers_mismatched_nesting() {
        let doc = parse("<div><span><b>x</span></b></div>");
        let div = doc.root().children().next().unwrap();
        // <b> never sees its own close tag before </span>; the </span>
        // closes back through it.
        assert_eq!(div.tag_name(), "div");
        assert_eq!(div.text_content(), "x");
    }

    #[test]
    fn stray_close_tag_is_ignored() {
        let doc = parse("<div>hi</p></div>");
        let div = doc.root().children().next().unwrap();
        assert_eq!(div.text_content(), "hi");
    }

    #[test]
    fn synthesizes_root_when_missing() {
        let doc = parse("<p>one</p><p>two</p>");
        assert_eq!(doc.root().tag_name(), "html");
        assert_eq!(doc.root().children().count(), 2);
    }

    #[test]
    fn reuses_existing_single_html_root() {
        let doc = parse("<html><body>hi</body></html>");
        assert_eq!(doc.root().tag_name(), "html");
        assert_eq!(doc.root().children().count(), 1);
        assert_eq!(doc.root().children().next().unwrap().tag_name(), "body");
    }
}
