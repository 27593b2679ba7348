#![forbid(unsafe_code)]

//! Projection of a data list into a child list.
//!
//! A [`Mapped`] owns a fragment host. On every op of its source list it
//! re-derives the projected node list and hands it to a [`Reconciler`]
//! bound to the host.
//!
//! Projection results are cached per source item: containers and cells by
//! identity, primitives by value and occurrence (the second `"a"` in the
//! list is a different item than the first). An item that stays in the
//! list keeps its node. Items that leave are dropped from the cache on the
//! next derivation, and the host's reconciler releases their nodes once
//! they are detached.
//!
//! When the host itself is released (its enclosing list dropped it), the
//! next [`Mapped::element`] call binds a fresh host.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use weft_dom::NodeId;
use weft_reactive::{ListOp, ObservableList, Value, ValueKey};

use crate::child::Child;
use crate::reconcile::Reconciler;
use crate::root::{RenderRoot, WeakRoot};

pub type Projection = Rc<dyn Fn(&Value) -> Child>;

type ItemKey = (ValueKey, usize);

#[derive(Default)]
struct MappedState {
    root: Option<WeakRoot>,
    host: Option<NodeId>,
    reconciler: Option<Reconciler>,
    cache: AHashMap<ItemKey, NodeId>,
}

struct MappedInner {
    source: ObservableList<Value>,
    projection: Projection,
    state: RefCell<MappedState>,
}

/// A live child list projected from a data list.
#[derive(Clone)]
pub struct Mapped {
    inner: Rc<MappedInner>,
}

impl Mapped {
    #[must_use]
    pub fn new(source: ObservableList<Value>, projection: impl Fn(&Value) -> Child + 'static) -> Self {
        Self::with_projection(source, Rc::new(projection))
    }

    #[must_use]
    pub fn with_projection(source: ObservableList<Value>, projection: Projection) -> Self {
        Self {
            inner: Rc::new(MappedInner {
                source,
                projection,
                state: RefCell::new(MappedState::default()),
            }),
        }
    }

    /// Each item becomes its own child form ([`Child::from_value`]).
    #[must_use]
    pub fn identity(source: ObservableList<Value>) -> Self {
        Self::new(source, Child::from_value)
    }

    #[must_use]
    pub fn source(&self) -> &ObservableList<Value> {
        &self.inner.source
    }

    /// The host fragment, created and bound on first call. Later calls
    /// return the same node while it is still bound.
    pub fn element(&self, root: &RenderRoot) -> NodeId {
        let existing = self.inner.state.borrow().host;
        if let Some(host) = existing {
            if root.binding_count(host) > 0 {
                return host;
            }
            tracing::debug!(
                target: "weft_view::mapped",
                host = %host,
                "host was released; rebinding"
            );
            *self.inner.state.borrow_mut() = MappedState::default();
        }
        let host = root.document().create_fragment();
        let reconciler = Reconciler::detached(root, host);
        {
            let mut state = self.inner.state.borrow_mut();
            state.root = Some(root.downgrade());
            state.host = Some(host);
            state.reconciler = Some(reconciler.clone());
        }
        reconciler.reset_now(self.derive(root));

        let handle = self.clone();
        let sub = self.inner.source.subscribe(move |op: &ListOp<Value>| {
            if op.is_mutation() {
                handle.refresh();
            }
        });
        root.hold(host, sub);
        tracing::debug!(
            target: "weft_view::mapped",
            host = %host,
            items = self.inner.source.len(),
            "projection bound"
        );
        host
    }

    /// Projected nodes, in order (empty before [`element`](Self::element)).
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeId> {
        self.inner
            .state
            .borrow()
            .reconciler
            .as_ref()
            .map(Reconciler::nodes)
            .unwrap_or_default()
    }

    /// Number of cached projections.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.inner.state.borrow().cache.len()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn refresh(&self) {
        let (root, reconciler) = {
            let state = self.inner.state.borrow();
            (
                state.root.as_ref().and_then(WeakRoot::upgrade),
                state.reconciler.clone(),
            )
        };
        let (Some(root), Some(reconciler)) = (root, reconciler) else {
            return;
        };
        reconciler.reset(self.derive(&root));
    }

    fn derive(&self, root: &RenderRoot) -> Vec<NodeId> {
        let mut previous = std::mem::take(&mut self.inner.state.borrow_mut().cache);
        let items = self.inner.source.to_vec();
        let mut occurrences: AHashMap<ValueKey, usize> = AHashMap::with_capacity(items.len());
        let mut cache = AHashMap::with_capacity(items.len());
        let mut nodes = Vec::with_capacity(items.len());
        let mut fresh = Vec::new();
        for item in &items {
            let key = item.key();
            let nth = occurrences.entry(key.clone()).or_insert(0);
            let item_key = (key, *nth);
            *nth += 1;
            let node = match previous.remove(&item_key) {
                Some(node) => node,
                None => {
                    let child = (self.inner.projection)(item);
                    let node = root.resolve(&child);
                    if !matches!(child, Child::Node(_)) {
                        fresh.push(node);
                    }
                    node
                }
            };
            cache.insert(item_key, node);
            nodes.push(node);
        }
        let reconciler = {
            let mut state = self.inner.state.borrow_mut();
            state.cache = cache;
            state.reconciler.clone()
        };
        if let Some(reconciler) = reconciler {
            for node in fresh {
                reconciler.adopt(node);
            }
        }
        nodes
    }
}

impl std::fmt::Debug for Mapped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Mapped")
            .field("items", &self.inner.source.len())
            .field("host", &state.host)
            .field("cached", &state.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::El;
    use weft_reactive::Observable;

    fn list(items: &[&str]) -> ObservableList<Value> {
        items.iter().map(|s| Value::from(*s)).collect()
    }

    #[test]
    fn projects_each_item() {
        let root = RenderRoot::new();
        let source = list(&["a", "b"]);
        let mapped = Mapped::new(source.clone(), |v| {
            Child::El(El::new("li").child(v.as_text().unwrap_or_default()))
        });
        let host = mapped.element(&root);
        assert_eq!(root.document().inner_html(host), "<li>a</li><li>b</li>");
        source.push(Value::from("c"));
        root.flush();
        assert_eq!(root.document().inner_html(host), "<li>a</li><li>b</li><li>c</li>");
    }

    #[test]
    fn surviving_items_keep_their_nodes() {
        let root = RenderRoot::new();
        let source = list(&["a", "b", "c"]);
        let mapped = Mapped::identity(source.clone());
        mapped.element(&root);
        let before = mapped.nodes();
        source.delete(1);
        root.flush();
        let after = mapped.nodes();
        assert_eq!(after, vec![before[0], before[2]]);
        assert_eq!(mapped.cached_len(), 2);
    }

    #[test]
    fn repeated_primitives_are_distinct_items() {
        let root = RenderRoot::new();
        let source = list(&["x", "x"]);
        let mapped = Mapped::identity(source);
        let host = mapped.element(&root);
        assert_eq!(root.document().child_count(host), 2);
        let nodes = mapped.nodes();
        assert_ne!(nodes[0], nodes[1]);
    }

    #[test]
    fn removed_items_release_their_bindings() {
        let root = RenderRoot::new();
        let cells: Vec<Observable<Value>> =
            (0..50).map(|i| Observable::new(Value::from(i))).collect();
        let source: ObservableList<Value> = cells.iter().cloned().map(Value::Cell).collect();
        let mapped = Mapped::identity(source.clone());
        mapped.element(&root);
        assert_eq!(root.scope_count(), 51);

        source.clear();
        root.flush();
        assert_eq!(mapped.cached_len(), 0);
        assert_eq!(root.scope_count(), 1);
        assert!(cells.iter().all(|c| c.subscriber_count() == 0));
    }

    #[test]
    fn released_host_rebinds_on_next_use() {
        let root = RenderRoot::new();
        let source = list(&["a"]);
        let mapped = Mapped::identity(source.clone());
        let items: ObservableList<Child> = ObservableList::new(vec![Child::Mapped(mapped.clone())]);
        let node = root.realize(&El::new("div").children(items.clone()));

        items.clear();
        root.flush();
        assert_eq!(root.document().text_content(node), "");

        items.push(Child::Mapped(mapped.clone()));
        root.flush();
        source.push(Value::from("b"));
        root.flush();
        assert_eq!(root.document().text_content(node), "ab");
    }

    #[test]
    fn element_is_stable() {
        let root = RenderRoot::new();
        let mapped = Mapped::identity(list(&["a"]));
        assert_eq!(mapped.element(&root), mapped.element(&root));
    }
}
