//! The in-memory document model.
//!
//! Modeled as an arena: `Document` owns a `Vec<ElementRecord>`, children are
//! index sequences, and a parent is an index. This is the idiomatic
//! alternative to a `Rc<RefCell<Node>>` tree when parent and child links
//! need to coexist without shared ownership or borrow-checker fights.

use super::attributes::Attributes;
use std::fmt;

/// Index of an element within its owning [`Document`]'s arena.
///
/// Stable for the lifetime of the `Document`; never reused, even across
/// detach operations, since elements are never removed from the arena (the
/// core never mutates a parsed tree in place — only the Fix Engine mutates
/// bytes, and it does so outside of the Document model entirely).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u32);

/// Byte-exact and line/column source location of an element's start tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceSpan {
    /// Inclusive start byte offset of the element's start tag.
    pub start: usize,
    /// Exclusive end byte offset of the element (after its closing tag, or
    /// after the start tag for void/self-closing elements).
    pub end: usize,
    /// 1-based line number of `start`.
    pub line: usize,
    /// 0-based column of `start`.
    pub column: usize,
}

/// One child slot of an element: either a nested element or a run of text.
///
/// Text is never exposed as a sibling node: it only ever surfaces through
/// [`ElementRef::text_content`]. Keeping it in the child
/// list (rather than e.g. concatenating eagerly at parse time) preserves
/// exact document order when a single element interleaves several text runs
/// with child elements, which matters for `textContent`'s "author order"
/// guarantee.
#[derive(Debug, Clone)]
pub(crate) enum Child {
    Element(ElementId),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct ElementRecord {
    pub tag_name: String,
    pub attributes: Attributes,
    pub children: Vec<Child>,
    pub parent: Option<ElementId>,
    pub span: Option<SourceSpan>,
}

/// Owns the element arena for one parsed document. Lives only for the
/// duration of one check call.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) arena: Vec<ElementRecord>,
    pub(crate) root: ElementId,
    /// The exact bytes this document's spans index into: the whole HTML
    /// input for an HTML document, or the whole component source for every
    /// branch lowered from one component — rules re-locate tokens by
    /// reading this text, not by threading a separate byte buffer through
    /// every predicate/fix call.
    pub(crate) source: String,
}

impl Document {
    pub(crate) fn with_root(tag_name: impl Into<String>) -> Self {
        Self::with_root_and_source(tag_name, String::new())
    }

    pub(crate) fn with_root_and_source(tag_name: impl Into<String>, source: String) -> Self {
        let root = ElementRecord {
            tag_name: tag_name.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
            parent: None,
            span: None,
        };
        Document {
            arena: vec![root],
            root: ElementId(0),
            source,
        }
    }

    /// The original source bytes this document's spans were computed
    /// against. Empty for documents constructed without real source text
    /// (e.g. directly from an arena in a unit test).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.at(self.root)
    }

    pub fn root_id(&self) -> ElementId {
        self.root
    }

    /// Replace the document root with an existing element, discarding the
    /// synthetic wrapper (used by the HTML adapter when the input already
    /// had its own single top-level `<html>` element).
    pub(crate) fn promote_root(&mut self, new_root: ElementId) {
        self.record_mut(new_root).parent = None;
        self.root = new_root;
    }

    pub fn at(&self, id: ElementId) -> ElementRef<'_> {
        ElementRef { doc: self, id }
    }

    pub(crate) fn record(&self, id: ElementId) -> &ElementRecord {
        &self.arena[id.0 as usize]
    }

    pub(crate) fn record_mut(&mut self, id: ElementId) -> &mut ElementRecord {
        &mut self.arena[id.0 as usize]
    }

    /// Allocate a new, detached element and return its id.
    pub(crate) fn alloc(
        &mut self,
        tag_name: impl Into<String>,
        attributes: Attributes,
        span: Option<SourceSpan>,
    ) -> ElementId {
        let id = ElementId(self.arena.len() as u32);
        self.arena.push(ElementRecord {
            tag_name: tag_name.into(),
            attributes,
            children: Vec::new(),
            parent: None,
            span,
        });
        id
    }

    pub(crate) fn append_child(&mut self, parent: ElementId, child: ElementId) {
        self.record_mut(parent).children.push(Child::Element(child));
        self.record_mut(child).parent = Some(parent);
    }

    pub(crate) fn append_text(&mut self, parent: ElementId, text: String) {
        if text.is_empty() {
            return;
        }
        self.record_mut(parent).children.push(Child::Text(text));
    }

    /// Set the end offset of an already-allocated element's span, used by
    /// parsers that discover an element's extent only once its closing tag
    /// (or implicit close) is reached.
    pub(crate) fn set_span_end(&mut self, id: ElementId, end: usize) {
        if let Some(span) = &mut self.record_mut(id).span {
            span.end = end;
        }
    }

    /// Whether every direct text child of `id` is whitespace-only (used by
    /// the HTML adapter to decide whether a synthetic root wrapped nothing
    /// but a single literal `<html>` element).
    pub(crate) fn direct_text_is_whitespace_only(&self, id: ElementId) -> bool {
        self.record(id).children.iter().all(|c| match c {
            Child::Text(t) => t.trim().is_empty(),
            Child::Element(_) => true,
        })
    }

    /// Depth-first, document-order iterator over every element in the tree
    /// (the root first), used by the whole-tree lookups and by the
    /// rule/selector engines.
    pub fn walk(&self) -> impl Iterator<Item = ElementRef<'_>> {
        dfs_preorder(self, self.root).into_iter().map(move |id| self.at(id))
    }

    pub fn by_id(&self, id_value: &str) -> Option<ElementRef<'_>> {
        self.walk().find(|el| el.get_attribute("id") == Some(id_value))
    }
}

/// A non-owning handle to one element within a [`Document`].
///
/// Cheap to copy (a reference plus a `u32` index); exposed by reference
/// rather than by value so that parent/child navigation never needs shared
/// ownership.
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    pub(crate) doc: &'a Document,
    pub(crate) id: ElementId,
}

impl<'a> ElementRef<'a> {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    pub fn tag_name(&self) -> &'a str {
        &self.doc.record(self.id).tag_name
    }

    pub fn get_attribute(&self, name: &str) -> Option<&'a str> {
        self.doc.record(self.id).attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.doc.record(self.id).attributes.has(name)
    }

    pub fn attributes(&self) -> &'a Attributes {
        &self.doc.record(self.id).attributes
    }

    pub fn parent(&self) -> Option<ElementRef<'a>> {
        self.doc.record(self.id).parent.map(|id| self.doc.at(id))
    }

    /// Direct element children, in document order (text runs are not
    /// surfaced here; use [`ElementRef::text_content`]).
    pub fn children(&self) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        let doc = self.doc;
        doc.record(self.id)
            .children
            .iter()
            .filter_map(|c| match c {
                Child::Element(id) => Some(doc.at(*id)),
                Child::Text(_) => None,
            })
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// All other children of this element's parent, excluding this element.
    pub fn siblings(&self) -> Vec<ElementRef<'a>> {
        match self.parent() {
            Some(parent) => parent
                .children()
                .filter(|c| c.id != self.id)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn ancestors(&self) -> impl Iterator<Item = ElementRef<'a>> {
        let mut current = self.parent();
        std::iter::from_fn(move || {
            let next = current;
            current = current.and_then(|c| c.parent());
            next
        })
    }

    /// Descendants in document order, not including this element.
    pub fn descendants(&self) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        let doc = self.doc;
        let children: Vec<ElementId> = element_children_ids(doc, self.id);
        let mut order = Vec::new();
        for child in children {
            order.extend(dfs_preorder(doc, child));
        }
        order.into_iter().map(move |id| doc.at(id))
    }

    /// Concatenation of all descendant text, in author order, with no
    /// normalization beyond joining.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.doc.record(self.id).children {
            match child {
                Child::Text(t) => out.push_str(t),
                Child::Element(id) => self.doc.at(*id).collect_text(out),
            }
        }
    }

    pub fn source_location(&self) -> Option<SourceSpan> {
        self.doc.record(self.id).span
    }

    /// Serialize as `<tag attr="v" ...>`, used for a violation's serialized
    /// element string and for fix-producer tag re-scanning.
    pub fn to_tag_string(&self) -> String {
        let rec = self.doc.record(self.id);
        let attrs = rec.attributes.to_tag_string();
        if attrs.is_empty() {
            format!("<{}>", rec.tag_name)
        } else {
            format!("<{} {}>", rec.tag_name, attrs)
        }
    }

    /// A short snippet of this element's own opening tag plus a bit of its
    /// text, truncated to roughly 100 bytes.
    pub fn snippet(&self) -> String {
        let mut s = self.to_tag_string();
        let text = self.text_content();
        if !text.is_empty() {
            s.push(' ');
            s.push_str(&text);
        }
        truncate_bytes(&s, 100)
    }
}

fn element_children_ids(doc: &Document, id: ElementId) -> Vec<ElementId> {
    doc.record(id)
        .children
        .iter()
        .filter_map(|c| match c {
            Child::Element(e) => Some(*e),
            Child::Text(_) => None,
        })
        .collect()
}

/// Pre-order depth-first traversal starting at (and including) `root`.
fn dfs_preorder(doc: &Document, root: ElementId) -> Vec<ElementId> {
    let mut stack = vec![root];
    let mut order = Vec::new();
    while let Some(id) = stack.pop() {
        order.push(id);
        stack.extend(element_children_ids(doc, id).into_iter().rev());
    }
    order
}

pub(crate) fn truncate_bytes(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementRef({})", self.to_tag_string())
    }
}

impl PartialEq for ElementRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}
impl Eq for ElementRef<'_> {}
