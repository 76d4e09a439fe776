//! Ordered attribute storage.
//!
//! Insertion order must survive so serialization and fix-targeting can
//! re-locate a given attribute token in the original source.

use indexmap::IndexMap;

/// An element's attributes, in the order they were authored.
///
/// Presence is simply "the key is in the map"; a value-less attribute
/// (`<input disabled>`) is stored with an empty string, which is enough to
/// answer both `hasAttribute` and `getAttribute` — the two queries are
/// distinguishable because `hasAttribute` checks key existence while
/// `getAttribute` returns the stored (possibly empty) value.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Attributes(IndexMap<String, String>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Insert a lower-cased attribute name. The caller is responsible for
    /// lower-casing the name (the HTML parser adapter and component-tree
    /// adapter both do this at the point of construction).
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Class list derived from the `class` attribute, split on ASCII
    /// whitespace. Empty tokens (repeated whitespace) are skipped.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.get("class")
            .into_iter()
            .flat_map(|c| c.split_ascii_whitespace())
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes().any(|c| c == name)
    }

    /// Serialize as `name="value"` tokens in insertion order.
    pub fn to_tag_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!(r#"{k}="{v}""#))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
