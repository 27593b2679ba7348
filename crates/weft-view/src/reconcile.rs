#![forbid(unsafe_code)]

//! Child-list reconciliation.
//!
//! A [`Reconciler`] keeps the children of one parent node equal to a
//! model: the ordered node list derived from a [`ListOp`] stream (or set
//! directly with [`Reconciler::reset`]). Each op updates the model; the
//! tree is brought in line by an [`EditQueue`] computed from the current
//! children and the model.
//!
//! # Batching
//!
//! With `batch_child_edits` on, each op computes a fresh queue and
//! schedules it as a microtask, cancelling the previously scheduled queue.
//! Only the last queue of a synchronous burst is applied, and it already
//! accounts for every op in the burst. A cancelled queue is dropped whole.
//!
//! # Invariants
//!
//! - After a flush the parent's children are exactly the model, in order.
//! - A node that stays in the model is never detached and re-created; it is
//!   at most moved.
//! - Setting a text child over a text slot rewrites the existing node's
//!   data; the node keeps its identity.
//! - Emptying the list removes every child of the parent, including nodes
//!   that were added to it from outside.
//!
//! # Teardown
//!
//! Nodes the reconciler resolved itself (everything but [`Child::Node`])
//! belong to it. Once such a node has left the model and is detached after
//! a flush, a follow-up microtask releases it through
//! [`RenderRoot::release`], dropping the bindings of its subtree. A node
//! that another list picked up in the same burst is attached again by then
//! and is left alone.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::{AHashMap, AHashSet};
use weft_dom::{Document, NodeId, NodeKind};
use weft_reactive::{CancelToken, ListOp, ObservableList};

use crate::child::Child;
use crate::root::{RenderRoot, WeakRoot};

/// A non-removal, non-append edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// Put `new` where `old` is (one tree operation).
    Swap { old: NodeId, new: NodeId },
    /// Rewrite a text node in place.
    Text { node: NodeId, text: String },
    /// Move `node` before `before` (or to the end).
    Move { node: NodeId, before: Option<NodeId> },
}

/// Tree edits for one flush, applied removals first, then appends, then
/// replacements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditQueue {
    pub removals: Vec<NodeId>,
    pub appends: Vec<NodeId>,
    pub replacements: Vec<Replacement>,
}

impl EditQueue {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.appends.is_empty() && self.replacements.is_empty()
    }

    /// Number of structural edits (text rewrites excluded).
    #[must_use]
    pub fn structural_len(&self) -> usize {
        self.removals.len()
            + self.appends.len()
            + self
                .replacements
                .iter()
                .filter(|r| !matches!(r, Replacement::Text { .. }))
                .count()
    }

    /// Run the queue against a plain child list.
    #[must_use]
    pub fn simulate(&self, live: &[NodeId]) -> Vec<NodeId> {
        let mut list: Vec<NodeId> = live
            .iter()
            .copied()
            .filter(|n| !self.removals.contains(n))
            .collect();
        list.extend(self.appends.iter().copied());
        for replacement in &self.replacements {
            match replacement {
                Replacement::Swap { old, new } => {
                    if let Some(slot) = list.iter_mut().find(|n| **n == *old) {
                        *slot = *new;
                    }
                }
                Replacement::Text { .. } => {}
                Replacement::Move { node, before } => move_within(&mut list, *node, *before),
            }
        }
        list
    }
}

fn move_within(list: &mut Vec<NodeId>, node: NodeId, before: Option<NodeId>) {
    list.retain(|n| *n != node);
    let at = before
        .and_then(|b| list.iter().position(|n| *n == b))
        .unwrap_or(list.len());
    list.insert(at, node);
}

/// Drop repeated nodes, keeping the first occurrence.
fn dedupe(desired: &[NodeId]) -> Vec<NodeId> {
    let mut seen = AHashSet::with_capacity(desired.len());
    let unique: Vec<NodeId> = desired.iter().copied().filter(|n| seen.insert(*n)).collect();
    if unique.len() != desired.len() {
        tracing::warn!(
            target: "weft_view::reconcile",
            duplicates = desired.len() - unique.len(),
            "the same node appears twice in a child list; keeping the first"
        );
    }
    unique
}

/// Edits that turn `live` into `desired` (duplicates in `desired` are
/// collapsed to their first occurrence).
///
/// A position whose old node leaves and whose new node is fresh becomes a
/// [`Replacement::Swap`]; other departures are removals and other arrivals
/// appends. Order is then fixed with the fewest moves the left-to-right
/// scan finds.
#[must_use]
pub fn compute_queue(live: &[NodeId], desired: &[NodeId]) -> EditQueue {
    let desired = dedupe(desired);
    let live_set: AHashSet<NodeId> = live.iter().copied().collect();
    let desired_set: AHashSet<NodeId> = desired.iter().copied().collect();

    let mut queue = EditQueue::default();
    let mut swapped_out = AHashSet::new();
    let mut swapped_in = AHashSet::new();
    for (old, new) in live.iter().zip(desired.iter()) {
        if old != new && !desired_set.contains(old) && !live_set.contains(new) {
            swapped_out.insert(*old);
            swapped_in.insert(*new);
            queue.replacements.push(Replacement::Swap {
                old: *old,
                new: *new,
            });
        }
    }
    queue.removals = live
        .iter()
        .copied()
        .filter(|n| !desired_set.contains(n) && !swapped_out.contains(n))
        .collect();
    queue.appends = desired
        .iter()
        .copied()
        .filter(|n| !live_set.contains(n) && !swapped_in.contains(n))
        .collect();

    let mut sim = queue.simulate(live);
    for (i, want) in desired.iter().enumerate() {
        if sim.get(i) == Some(want) {
            continue;
        }
        let before = sim.get(i).copied();
        move_within(&mut sim, *want, before);
        queue.replacements.push(Replacement::Move {
            node: *want,
            before,
        });
    }
    queue
}

struct State {
    root: WeakRoot,
    parent: NodeId,
    slots: Vec<NodeId>,
    texts: AHashMap<NodeId, String>,
    /// Nodes resolved for this list.
    owned: AHashSet<NodeId>,
    pending: Option<CancelToken>,
    suspended: bool,
}

/// Keeps one parent's children equal to a model.
#[derive(Clone)]
pub struct Reconciler {
    state: Rc<RefCell<State>>,
}

impl Reconciler {
    fn new(root: &RenderRoot, parent: NodeId) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                root: root.downgrade(),
                parent,
                slots: Vec::new(),
                texts: AHashMap::new(),
                owned: AHashSet::new(),
                pending: None,
                suspended: false,
            })),
        }
    }

    /// Keep `parent`'s children in sync with `list`. The current contents
    /// are written before this returns; later ops are applied per the
    /// root's batching mode. The binding lives as long as `parent`'s scope
    /// in `root`.
    pub fn bind(root: &RenderRoot, parent: NodeId, list: &ObservableList<Child>) -> Self {
        let reconciler = Self::new(root, parent);
        reconciler.state.borrow_mut().suspended = true;
        let handle = reconciler.clone();
        let sub = list.observe(move |op: &ListOp<Child>| handle.on_op(op));
        reconciler.state.borrow_mut().suspended = false;
        reconciler.flush();
        root.hold(parent, sub);
        reconciler
    }

    /// Write `items` under `parent` once.
    pub fn bind_static(root: &RenderRoot, parent: NodeId, items: &[Child]) -> Self {
        let reconciler = Self::new(root, parent);
        let nodes: Vec<NodeId> = items
            .iter()
            .map(|c| reconciler.resolve_owned(root, c))
            .collect();
        reconciler.reset_now(nodes);
        reconciler
    }

    /// A reconciler fed through [`reset`](Self::reset) instead of a list.
    #[must_use]
    pub fn detached(root: &RenderRoot, parent: NodeId) -> Self {
        Self::new(root, parent)
    }

    #[must_use]
    pub fn parent(&self) -> NodeId {
        self.state.borrow().parent
    }

    /// The model: the children the parent has (or will have after the
    /// pending flush).
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeId> {
        self.state.borrow().slots.clone()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state
            .borrow()
            .pending
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }

    /// Mark `node` as created for this reconciler, so it is released once
    /// it leaves the model.
    pub fn adopt(&self, node: NodeId) {
        self.state.borrow_mut().owned.insert(node);
    }

    /// Number of nodes currently owned.
    #[must_use]
    pub fn owned_len(&self) -> usize {
        self.state.borrow().owned.len()
    }

    fn resolve_owned(&self, root: &RenderRoot, child: &Child) -> NodeId {
        let node = root.resolve(child);
        if !matches!(child, Child::Node(_)) {
            self.adopt(node);
        }
        node
    }

    /// Replace the model and schedule a flush.
    pub fn reset(&self, nodes: Vec<NodeId>) {
        self.state.borrow_mut().slots = nodes;
        self.schedule();
    }

    /// Replace the model and flush now.
    pub fn reset_now(&self, nodes: Vec<NodeId>) {
        self.state.borrow_mut().slots = nodes;
        self.flush();
    }

    fn on_op(&self, op: &ListOp<Child>) {
        let Some(root) = self.state.borrow().root.upgrade() else {
            return;
        };
        match op {
            ListOp::Push(child) => {
                let node = self.resolve_owned(&root, child);
                self.state.borrow_mut().slots.push(node);
            }
            ListOp::Pop(_) => {
                self.state.borrow_mut().slots.pop();
            }
            ListOp::Splice {
                index,
                removed,
                inserted,
            } => {
                let nodes: Vec<NodeId> = inserted
                    .iter()
                    .map(|c| self.resolve_owned(&root, c))
                    .collect();
                let mut state = self.state.borrow_mut();
                let start = (*index).min(state.slots.len());
                let end = (start + removed.len()).min(state.slots.len());
                state.slots.splice(start..end, nodes);
            }
            ListOp::Set { index, value } => self.on_set(&root, *index, value),
            ListOp::Delete { index, .. } => {
                let mut state = self.state.borrow_mut();
                if *index < state.slots.len() {
                    state.slots.remove(*index);
                }
            }
            ListOp::Get { .. } => return,
        }
        self.schedule();
    }

    fn on_set(&self, root: &RenderRoot, index: usize, value: &Child) {
        let existing = self.state.borrow().slots.get(index).copied();
        let doc = root.document();
        if let (Some(node), Child::Text(text)) = (existing, value) {
            if doc.kind(node) == Some(NodeKind::Text) {
                self.state.borrow_mut().texts.insert(node, text.clone());
                return;
            }
        }
        let node = root.resolve(value);
        if let Some(old) = existing {
            if old == node || same_text(doc, old, node) {
                return;
            }
        }
        if !matches!(value, Child::Node(_)) {
            self.adopt(node);
        }
        let mut state = self.state.borrow_mut();
        if index < state.slots.len() {
            state.slots[index] = node;
        } else {
            state.slots.push(node);
        }
    }

    fn plan(&self, doc: &Document) -> EditQueue {
        let state = self.state.borrow();
        let live = doc.child_nodes(state.parent);
        let mut queue = compute_queue(&live, &state.slots);
        for node in &state.slots {
            if let Some(text) = state.texts.get(node) {
                queue.replacements.push(Replacement::Text {
                    node: *node,
                    text: text.clone(),
                });
            }
        }
        queue
    }

    /// Queue the model for the next microtask, superseding any queued
    /// flush. Applies immediately when batching is off.
    fn schedule(&self) {
        let Some(root) = self.state.borrow().root.upgrade() else {
            return;
        };
        if self.state.borrow().suspended {
            return;
        }
        if !root.config().batch_child_edits {
            self.flush();
            return;
        }
        let queue = self.plan(root.document());
        let token = CancelToken::new();
        let previous = self.state.borrow_mut().pending.replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
            tracing::debug!(
                target: "weft_view::reconcile",
                parent = %self.parent(),
                "superseded a pending child-list flush"
            );
        }
        let weak = Rc::downgrade(&self.state);
        root.scheduler().schedule_microtask(Box::new(move || {
            if token.is_cancelled() {
                return;
            }
            if let Some(state) = weak.upgrade() {
                Self { state }.apply(&queue);
            }
        }));
    }

    /// Cancel anything pending and bring the tree in line now.
    pub fn flush(&self) {
        let Some(root) = self.state.borrow().root.upgrade() else {
            return;
        };
        let queue = self.plan(root.document());
        self.apply(&queue);
    }

    fn apply(&self, queue: &EditQueue) {
        let (root, parent, desired) = {
            let mut state = self.state.borrow_mut();
            if let Some(token) = state.pending.take() {
                token.cancel();
            }
            state.texts.clear();
            let Some(root) = state.root.upgrade() else {
                return;
            };
            (root, state.parent, state.slots.clone())
        };
        let doc = root.document();
        if !doc.exists(parent) {
            return;
        }
        for node in &queue.removals {
            if doc.parent(*node) == Some(parent) {
                doc.remove_child(parent, *node);
            }
        }
        for node in &queue.appends {
            doc.append_child(parent, *node);
        }
        for replacement in &queue.replacements {
            match replacement {
                Replacement::Swap { old, new } => {
                    doc.replace_child(parent, *new, *old);
                }
                Replacement::Text { node, text } => {
                    if doc.text(*node).as_deref() != Some(text.as_str()) {
                        doc.set_text(*node, text);
                    }
                }
                Replacement::Move { node, before } => {
                    doc.insert_before(parent, *node, *before);
                }
            }
        }
        tracing::trace!(
            target: "weft_view::reconcile",
            parent = %parent,
            removals = queue.removals.len(),
            appends = queue.appends.len(),
            replacements = queue.replacements.len(),
            "child-list flush"
        );

        let desired = dedupe(&desired);
        if doc.child_nodes(parent) != desired {
            tracing::warn!(
                target: "weft_view::reconcile",
                parent = %parent,
                "children changed under a queued flush; correcting"
            );
            let corrective = compute_queue(&doc.child_nodes(parent), &desired);
            for node in &corrective.removals {
                doc.remove_child(parent, *node);
            }
            for node in &desired {
                doc.append_child(parent, *node);
            }
        }
        self.release_departed(&root, &desired);
    }

    /// Hand owned nodes that left the model to a release microtask.
    fn release_departed(&self, root: &RenderRoot, desired: &[NodeId]) {
        let departed: Vec<NodeId> = {
            let mut state = self.state.borrow_mut();
            let keep: AHashSet<NodeId> = desired.iter().copied().collect();
            let gone: Vec<NodeId> = state
                .owned
                .iter()
                .copied()
                .filter(|n| !keep.contains(n))
                .collect();
            for node in &gone {
                state.owned.remove(node);
            }
            gone
        };
        if departed.is_empty() {
            return;
        }
        let weak = root.downgrade();
        root.scheduler().schedule_microtask(Box::new(move || {
            let Some(root) = weak.upgrade() else {
                return;
            };
            let mut scopes = 0;
            for node in &departed {
                if root.document().parent(*node).is_none() {
                    scopes += root.release(*node);
                }
            }
            tracing::trace!(
                target: "weft_view::reconcile",
                nodes = departed.len(),
                scopes,
                "released departed children"
            );
        }));
    }
}

fn same_text(doc: &Document, a: NodeId, b: NodeId) -> bool {
    doc.kind(a) == Some(NodeKind::Text)
        && doc.kind(b) == Some(NodeKind::Text)
        && doc.text(a) == doc.text(b)
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Reconciler")
            .field("parent", &state.parent)
            .field("slots", &state.slots.len())
            .field("owned", &state.owned.len())
            .field("pending", &state.pending.is_some())
            .finish()
    }
}
