#![forbid(unsafe_code)]

//! The document: an arena of nodes behind a shared handle.
//!
//! # Invariants
//!
//! 1. A node has at most one parent; inserting an attached node moves it.
//! 2. The tree is acyclic: an insert that would make a node its own
//!    ancestor is refused with a warning.
//! 3. Every write is appended to the edit journal.
//! 4. No borrow of the document is held while user callbacks (listeners,
//!    attribute observers) run.
//!
//! # Failure Modes
//!
//! - Unknown node ids and attribute writes on non-elements are ignored.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use weft_reactive::Scheduler;

use crate::edit::DomEdit;
use crate::mutation::MutationQueue;
use crate::node::{NodeData, NodeId, NodeKind, PropValue};

pub(crate) struct DocInner {
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) edits: Vec<DomEdit>,
    pub(crate) mutations: MutationQueue,
    pub(crate) scheduler: Option<Rc<dyn Scheduler>>,
    body: NodeId,
}

impl DocInner {
    pub(crate) fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.index())
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.node_mut(id).filter(|n| n.kind == NodeKind::Element)
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(data);
        id
    }

    /// `ancestor == node`, or `ancestor` is above `node`.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = None;
        }
    }

    fn can_adopt(&self, parent: NodeId, child: NodeId) -> bool {
        if self.node(parent).is_none() || self.node(child).is_none() {
            return false;
        }
        if self.contains(child, parent) {
            tracing::warn!(
                target: "weft_dom::document",
                %parent,
                %child,
                "refusing insert that would create a cycle"
            );
            return false;
        }
        true
    }

    /// Write or remove an attribute, returning the old value, or `None`
    /// when the node is not an element.
    fn write_attr(
        &mut self,
        node: NodeId,
        name: &str,
        value: Option<String>,
    ) -> Option<Option<String>> {
        let data = self.element_mut(node)?;
        let position = data.attrs.iter().position(|(k, _)| k == name);
        let old = match (position, value) {
            (Some(i), Some(v)) => Some(std::mem::replace(&mut data.attrs[i].1, v)),
            (Some(i), None) => Some(data.attrs.remove(i).1),
            (None, Some(v)) => {
                data.attrs.push((name.to_owned(), v));
                None
            }
            (None, None) => None,
        };
        Some(old)
    }
}

/// Shared handle to a node tree.
///
/// Cloning the handle shares the tree.
#[derive(Clone)]
pub struct Document {
    pub(crate) inner: Rc<RefCell<DocInner>>,
}

/// Non-owning handle to a [`Document`].
#[derive(Clone, Default)]
pub struct WeakDocument {
    inner: Weak<RefCell<DocInner>>,
}

impl WeakDocument {
    #[must_use]
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(|inner| Document { inner })
    }
}

impl std::fmt::Debug for WeakDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakDocument")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("nodes", &inner.nodes.len())
            .field("edits", &inner.edits.len())
            .field("has_scheduler", &inner.scheduler.is_some())
            .finish()
    }
}

impl Document {
    /// A new document holding a single detached `body` element.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(16);
        nodes.push(NodeData::new(
            NodeKind::Element,
            String::from("body"),
            String::new(),
        ));
        Self {
            inner: Rc::new(RefCell::new(DocInner {
                nodes,
                edits: Vec::new(),
                mutations: MutationQueue::default(),
                scheduler: None,
                body: NodeId(0),
            })),
        }
    }

    /// A document whose attribute mutation records are delivered from
    /// microtasks queued on `scheduler`.
    #[must_use]
    pub fn with_scheduler(scheduler: Rc<dyn Scheduler>) -> Self {
        let doc = Self::new();
        doc.set_scheduler(scheduler);
        doc
    }

    pub fn set_scheduler(&self, scheduler: Rc<dyn Scheduler>) {
        self.inner.borrow_mut().scheduler = Some(scheduler);
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Rc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The `body` element created with the document.
    #[must_use]
    pub fn body(&self) -> NodeId {
        self.inner.borrow().body
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    // ── Creation ────────────────────────────────────────────────────

    /// Create a detached element. Tag names are lower-cased.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.borrow_mut().alloc(NodeData::new(
            NodeKind::Element,
            tag.to_ascii_lowercase(),
            String::new(),
        ))
    }

    pub fn create_text(&self, text: &str) -> NodeId {
        self.inner
            .borrow_mut()
            .alloc(NodeData::new(NodeKind::Text, String::new(), text.to_owned()))
    }

    pub fn create_comment(&self, text: &str) -> NodeId {
        self.inner.borrow_mut().alloc(NodeData::new(
            NodeKind::Comment,
            String::new(),
            text.to_owned(),
        ))
    }

    pub fn create_fragment(&self) -> NodeId {
        self.inner.borrow_mut().alloc(NodeData::new(
            NodeKind::Fragment,
            String::new(),
            String::new(),
        ))
    }

    // ── Node data ───────────────────────────────────────────────────

    #[must_use]
    pub fn exists(&self, node: NodeId) -> bool {
        self.inner.borrow().node(node).is_some()
    }

    #[must_use]
    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.inner.borrow().node(node).map(|n| n.kind)
    }

    #[must_use]
    pub fn is_element(&self, node: NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Element)
    }

    #[must_use]
    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        let inner = self.inner.borrow();
        inner
            .node(node)
            .filter(|n| n.kind == NodeKind::Element)
            .map(|n| n.tag.clone())
    }

    /// Character data of a text or comment node.
    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<String> {
        let inner = self.inner.borrow();
        inner
            .node(node)
            .filter(|n| matches!(n.kind, NodeKind::Text | NodeKind::Comment))
            .map(|n| n.text.clone())
    }

    /// Replace the character data of a text or comment node in place.
    pub fn set_text(&self, node: NodeId, text: &str) {
        let mut inner = self.inner.borrow_mut();
        let Some(data) = inner
            .node_mut(node)
            .filter(|n| matches!(n.kind, NodeKind::Text | NodeKind::Comment))
        else {
            return;
        };
        text.clone_into(&mut data.text);
        inner.edits.push(DomEdit::SetText {
            node,
            text: text.to_owned(),
        });
    }

    /// Concatenated text of `node` and its descendants (comments excluded).
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        fn walk(inner: &DocInner, id: NodeId, out: &mut String) {
            let Some(data) = inner.node(id) else {
                return;
            };
            match data.kind {
                NodeKind::Text => out.push_str(&data.text),
                NodeKind::Comment => {}
                NodeKind::Element | NodeKind::Fragment => {
                    for child in &data.children {
                        walk(inner, *child, out);
                    }
                }
            }
        }
        let mut out = String::new();
        walk(&self.inner.borrow(), node, &mut out);
        out
    }

    // ── Tree ────────────────────────────────────────────────────────

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().node(node).and_then(|n| n.parent)
    }

    #[must_use]
    pub fn child_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn child_at(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.inner
            .borrow()
            .node(node)
            .and_then(|n| n.children.get(index).copied())
    }

    #[must_use]
    pub fn child_count(&self, node: NodeId) -> usize {
        self.inner
            .borrow()
            .node(node)
            .map_or(0, |n| n.children.len())
    }

    /// Children with fragments replaced by their own (flattened) children.
    #[must_use]
    pub fn flat_children(&self, node: NodeId) -> Vec<NodeId> {
        fn walk(inner: &DocInner, id: NodeId, out: &mut Vec<NodeId>) {
            let Some(data) = inner.node(id) else {
                return;
            };
            for child in &data.children {
                match inner.node(*child).map(|c| c.kind) {
                    Some(NodeKind::Fragment) => walk(inner, *child, out),
                    Some(_) => out.push(*child),
                    None => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.inner.borrow(), node, &mut out);
        out
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.inner.borrow().contains(ancestor, node)
    }

    /// Append `child` to `parent`, moving it if it is attached elsewhere.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.can_adopt(parent, child) {
            return false;
        }
        inner.detach(child);
        if let Some(p) = inner.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = inner.node_mut(child) {
            c.parent = Some(parent);
        }
        inner.edits.push(DomEdit::Append { parent, child });
        true
    }

    /// Insert `child` before `before` under `parent`. A missing or foreign
    /// reference node appends.
    pub fn insert_before(&self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> bool {
        if before == Some(child) {
            return self.parent(child) == Some(parent);
        }
        let mut inner = self.inner.borrow_mut();
        if !inner.can_adopt(parent, child) {
            return false;
        }
        inner.detach(child);
        let position = before.and_then(|b| {
            inner
                .node(parent)
                .and_then(|p| p.children.iter().position(|c| *c == b))
        });
        if let Some(p) = inner.node_mut(parent) {
            match position {
                Some(i) => p.children.insert(i, child),
                None => p.children.push(child),
            }
        }
        if let Some(c) = inner.node_mut(child) {
            c.parent = Some(parent);
        }
        let edit = match (position, before) {
            (Some(_), Some(before)) => DomEdit::Insert {
                parent,
                child,
                before,
            },
            _ => DomEdit::Append { parent, child },
        };
        inner.edits.push(edit);
        true
    }

    /// Detach `child` from `parent`. No-op if it is not a child of `parent`.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.node(child).and_then(|n| n.parent) != Some(parent) {
            return false;
        }
        inner.detach(child);
        inner.edits.push(DomEdit::Remove { parent, child });
        true
    }

    /// Detach `node` from whatever parent it has.
    pub fn remove(&self, node: NodeId) -> bool {
        match self.parent(node) {
            Some(parent) => self.remove_child(parent, node),
            None => false,
        }
    }

    /// Put `new` where `old` is under `parent`; `old` ends up detached.
    pub fn replace_child(&self, parent: NodeId, new: NodeId, old: NodeId) -> bool {
        if new == old {
            return self.parent(old) == Some(parent);
        }
        let mut inner = self.inner.borrow_mut();
        if inner.node(old).and_then(|n| n.parent) != Some(parent) {
            return false;
        }
        if !inner.can_adopt(parent, new) {
            return false;
        }
        inner.detach(new);
        let Some(position) = inner
            .node(parent)
            .and_then(|p| p.children.iter().position(|c| *c == old))
        else {
            return false;
        };
        if let Some(p) = inner.node_mut(parent) {
            p.children[position] = new;
        }
        if let Some(n) = inner.node_mut(new) {
            n.parent = Some(parent);
        }
        if let Some(o) = inner.node_mut(old) {
            o.parent = None;
        }
        inner.edits.push(DomEdit::Replace { parent, old, new });
        true
    }

    // ── Attributes ──────────────────────────────────────────────────

    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .node(node)
            .and_then(|n| n.attr(name).map(str::to_owned))
    }

    #[must_use]
    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.inner
            .borrow()
            .node(node)
            .is_some_and(|n| n.attr(name).is_some())
    }

    /// All attributes in insertion order.
    #[must_use]
    pub fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.inner
            .borrow()
            .node(node)
            .map(|n| n.attrs.clone())
            .unwrap_or_default()
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let old = {
            let mut inner = self.inner.borrow_mut();
            let Some(old) = inner.write_attr(node, name, Some(value.to_owned())) else {
                return;
            };
            inner.edits.push(DomEdit::SetAttribute {
                node,
                name: name.to_owned(),
                value: value.to_owned(),
            });
            old
        };
        self.queue_mutation(node, name, old);
    }

    /// Remove an attribute. Returns whether it was present.
    pub fn remove_attribute(&self, node: NodeId, name: &str) -> bool {
        let old = {
            let mut inner = self.inner.borrow_mut();
            let Some(Some(old)) = inner.write_attr(node, name, None) else {
                return false;
            };
            inner.edits.push(DomEdit::RemoveAttribute {
                node,
                name: name.to_owned(),
            });
            old
        };
        self.queue_mutation(node, name, Some(old));
        true
    }

    // ── Class list ──────────────────────────────────────────────────

    #[must_use]
    pub fn class_list(&self, node: NodeId) -> Vec<String> {
        self.attribute(node, "class")
            .map(|c| c.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_class(&self, node: NodeId, name: &str) -> bool {
        self.class_list(node).iter().any(|c| c == name)
    }

    /// Add `name` to the class list. Returns whether it was added.
    pub fn add_class(&self, node: NodeId, name: &str) -> bool {
        let mut classes = self.class_list(node);
        if name.is_empty() || classes.iter().any(|c| c == name) {
            return false;
        }
        classes.push(name.to_owned());
        self.write_class(node, &classes, DomEdit::AddClass {
            node,
            name: name.to_owned(),
        })
    }

    /// Remove `name` from the class list. Returns whether it was present.
    pub fn remove_class(&self, node: NodeId, name: &str) -> bool {
        let mut classes = self.class_list(node);
        let before = classes.len();
        classes.retain(|c| c != name);
        if classes.len() == before {
            return false;
        }
        self.write_class(node, &classes, DomEdit::RemoveClass {
            node,
            name: name.to_owned(),
        })
    }

    pub fn toggle_class(&self, node: NodeId, name: &str, on: bool) -> bool {
        if on {
            self.add_class(node, name)
        } else {
            self.remove_class(node, name)
        }
    }

    fn write_class(&self, node: NodeId, classes: &[String], edit: DomEdit) -> bool {
        let old = {
            let mut inner = self.inner.borrow_mut();
            let Some(old) = inner.write_attr(node, "class", Some(classes.join(" "))) else {
                return false;
            };
            inner.edits.push(edit);
            old
        };
        self.queue_mutation(node, "class", old);
        true
    }

    // ── Inline style ────────────────────────────────────────────────

    #[must_use]
    pub fn style(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner.borrow().node(node).and_then(|n| {
            n.styles
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        })
    }

    #[must_use]
    pub fn styles(&self, node: NodeId) -> Vec<(String, String)> {
        self.inner
            .borrow()
            .node(node)
            .map(|n| n.styles.clone())
            .unwrap_or_default()
    }

    pub fn set_style(&self, node: NodeId, name: &str, value: &str) {
        let mut inner = self.inner.borrow_mut();
        let Some(data) = inner.element_mut(node) else {
            return;
        };
        match data.styles.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => value.clone_into(&mut slot.1),
            None => data.styles.push((name.to_owned(), value.to_owned())),
        }
        inner.edits.push(DomEdit::SetStyle {
            node,
            name: name.to_owned(),
            value: value.to_owned(),
        });
    }

    pub fn remove_style(&self, node: NodeId, name: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(data) = inner.element_mut(node) else {
            return false;
        };
        let before = data.styles.len();
        data.styles.retain(|(k, _)| k != name);
        if data.styles.len() == before {
            return false;
        }
        inner.edits.push(DomEdit::RemoveStyle {
            node,
            name: name.to_owned(),
        });
        true
    }

    // ── Properties ──────────────────────────────────────────────────

    #[must_use]
    pub fn property(&self, node: NodeId, name: &str) -> Option<PropValue> {
        self.inner
            .borrow()
            .node(node)
            .and_then(|n| n.props.get(name).cloned())
    }

    pub fn set_property(&self, node: NodeId, name: &str, value: PropValue) {
        let mut inner = self.inner.borrow_mut();
        let Some(data) = inner.element_mut(node) else {
            return;
        };
        data.props.insert(name.to_owned(), value.clone());
        inner.edits.push(DomEdit::SetProperty {
            node,
            name: name.to_owned(),
            value,
        });
    }

    pub fn remove_property(&self, node: NodeId, name: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(data) = inner.element_mut(node) else {
            return false;
        };
        if data.props.remove(name).is_none() {
            return false;
        }
        inner.edits.push(DomEdit::RemoveProperty {
            node,
            name: name.to_owned(),
        });
        true
    }

    // ── Journal ─────────────────────────────────────────────────────

    #[must_use]
    pub fn edits(&self) -> Vec<DomEdit> {
        self.inner.borrow().edits.clone()
    }

    #[must_use]
    pub fn edit_count(&self) -> usize {
        self.inner.borrow().edits.len()
    }

    /// Drain the journal.
    pub fn take_edits(&self) -> Vec<DomEdit> {
        std::mem::take(&mut self.inner.borrow_mut().edits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_moves_attached_node() {
        let doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let t = doc.create_text("x");
        doc.append_child(a, t);
        doc.append_child(b, t);
        assert!(doc.child_nodes(a).is_empty());
        assert_eq!(doc.child_nodes(b), vec![t]);
        assert_eq!(doc.parent(t), Some(b));
    }

    #[test]
    fn cycle_forming_insert_is_refused() {
        let doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.append_child(outer, inner);
        assert!(!doc.append_child(inner, outer));
        assert!(!doc.append_child(outer, outer));
        assert_eq!(doc.parent(outer), None);
    }

    #[test]
    fn insert_before_and_replace() {
        let doc = Document::new();
        let p = doc.create_element("ul");
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        let c = doc.create_text("c");
        doc.append_child(p, a);
        doc.insert_before(p, b, Some(a));
        assert_eq!(doc.child_nodes(p), vec![b, a]);
        assert!(doc.replace_child(p, c, b));
        assert_eq!(doc.child_nodes(p), vec![c, a]);
        assert_eq!(doc.parent(b), None);
        assert!(!doc.replace_child(p, b, b));
    }

    #[test]
    fn replace_with_sibling_moves_it() {
        let doc = Document::new();
        let p = doc.create_element("ul");
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        doc.append_child(p, a);
        doc.append_child(p, b);
        assert!(doc.replace_child(p, a, b));
        assert_eq!(doc.child_nodes(p), vec![a]);
    }

    #[test]
    fn fragments_flatten() {
        let doc = Document::new();
        let p = doc.create_element("div");
        let frag = doc.create_fragment();
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        doc.append_child(frag, a);
        doc.append_child(p, frag);
        doc.append_child(p, b);
        assert_eq!(doc.flat_children(p), vec![a, b]);
        assert_eq!(doc.text_content(p), "ab");
    }

    #[test]
    fn attributes_and_classes() {
        let doc = Document::new();
        let el = doc.create_element("DIV");
        assert_eq!(doc.tag_name(el).as_deref(), Some("div"));
        doc.set_attribute(el, "id", "main");
        assert!(doc.add_class(el, "a"));
        assert!(!doc.add_class(el, "a"));
        assert!(doc.add_class(el, "b"));
        assert_eq!(doc.attribute(el, "class").as_deref(), Some("a b"));
        assert!(doc.remove_class(el, "a"));
        assert_eq!(doc.class_list(el), vec!["b".to_owned()]);
        assert!(doc.remove_attribute(el, "id"));
        assert!(!doc.remove_attribute(el, "id"));
    }

    #[test]
    fn non_elements_ignore_attribute_writes() {
        let doc = Document::new();
        let t = doc.create_text("x");
        doc.set_attribute(t, "id", "nope");
        assert_eq!(doc.attribute(t, "id"), None);
        assert_eq!(doc.edit_count(), 0);
    }

    #[test]
    fn every_write_is_journaled() {
        let doc = Document::new();
        let el = doc.create_element("p");
        doc.set_attribute(el, "title", "x");
        doc.set_attribute(el, "title", "x");
        doc.set_style(el, "color", "red");
        doc.set_property(el, "checked", PropValue::Bool(false));
        assert_eq!(doc.edit_count(), 4);
        assert_eq!(doc.property(el, "checked"), Some(PropValue::Bool(false)));
        assert_eq!(doc.take_edits().len(), 4);
        assert_eq!(doc.edit_count(), 0);
    }

    #[test]
    fn set_text_keeps_identity() {
        let doc = Document::new();
        let t = doc.create_text("old");
        doc.set_text(t, "new");
        assert_eq!(doc.text(t).as_deref(), Some("new"));
        assert_eq!(
            doc.edits(),
            vec![DomEdit::SetText {
                node: t,
                text: "new".into()
            }]
        );
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let doc = Document::new();
        let ghost = NodeId(999);
        assert!(!doc.append_child(doc.body(), ghost));
        assert_eq!(doc.kind(ghost), None);
        assert!(doc.child_nodes(ghost).is_empty());
    }
}
