#![forbid(unsafe_code)]

//! Node handles and per-node storage.

use std::collections::BTreeMap;

use crate::event::ListenerEntry;

/// Handle to a node owned by a [`Document`](crate::Document).
///
/// Ids are only meaningful for the document that issued them. Operations
/// given an id the document does not know are silent no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    /// A persistent, transparent container. Its children take its place in
    /// [`flat_children`](crate::Document::flat_children) and in serialized
    /// output.
    Fragment,
}

/// A typed scalar property. Unlike attributes, `false` is a legal value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl std::fmt::Display for PropValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&weft_reactive::format_number(*n)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for PropValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) tag: String,
    pub(crate) text: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) styles: Vec<(String, String)>,
    pub(crate) props: BTreeMap<String, PropValue>,
    pub(crate) listeners: Vec<ListenerEntry>,
}

impl NodeData {
    pub(crate) fn new(kind: NodeKind, tag: String, text: String) -> Self {
        Self {
            kind,
            tag,
            text,
            parent: None,
            children: Vec::new(),
            attrs: Vec::new(),
            styles: Vec::new(),
            props: BTreeMap::new(),
            listeners: Vec::new(),
        }
    }

    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Map a camelCase dataset key to its `data-*` attribute name.
///
/// `fooBar` becomes `data-foo-bar`. Keys already starting with `data-` are
/// kept as they are.
#[must_use]
pub fn data_attribute_name(key: &str) -> String {
    if key.starts_with("data-") {
        return key.to_owned();
    }
    let mut name = String::with_capacity(key.len() + 6);
    name.push_str("data-");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            name.push('-');
            name.push(ch.to_ascii_lowercase());
        } else {
            name.push(ch);
        }
    }
    name
}

/// Map an ARIA key to its `aria-*` attribute name.
#[must_use]
pub fn aria_attribute_name(key: &str) -> String {
    if key.starts_with("aria-") {
        key.to_owned()
    } else {
        format!("aria-{}", key.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_names_are_kebab_cased() {
        assert_eq!(data_attribute_name("x"), "data-x");
        assert_eq!(data_attribute_name("fooBarBaz"), "data-foo-bar-baz");
        assert_eq!(data_attribute_name("data-kept"), "data-kept");
    }

    #[test]
    fn aria_names_are_prefixed() {
        assert_eq!(aria_attribute_name("label"), "aria-label");
        assert_eq!(aria_attribute_name("aria-hidden"), "aria-hidden");
    }

    #[test]
    fn prop_values_display() {
        assert_eq!(PropValue::Bool(false).to_string(), "false");
        assert_eq!(PropValue::Number(3.0).to_string(), "3");
        assert_eq!(PropValue::from("v").to_string(), "v");
    }
}
