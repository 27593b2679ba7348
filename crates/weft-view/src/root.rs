#![forbid(unsafe_code)]

//! The render root: document, scheduler, caches and binding lifetimes.
//!
//! Everything realized through a [`RenderRoot`] is owned by it. The root
//! keeps
//!
//! - the identity cache (descriptor -> node), written once per descriptor;
//! - one [`BindingScope`] per node, holding every subscription that writes
//!   into that node;
//! - descriptors created on the caller's behalf (templates).
//!
//! [`release`](RenderRoot::release) drops the scopes of a subtree,
//! [`dispose`](RenderRoot::dispose) detaches and releases a descriptor's
//! node, [`sweep`](RenderRoot::sweep) drops cache rows whose descriptor is
//! gone, and [`unmount`](RenderRoot::unmount) tears the whole root down.
//!
//! # Failure Modes
//!
//! | Condition                            | Result                          |
//! |--------------------------------------|---------------------------------|
//! | selector shorthand partly invalid    | prefix used, debug log          |
//! | binding target node gone             | write skipped silently          |
//! | mount/require without a usable node  | `Err(ViewError::MissingNode)`   |

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use weft_dom::{Document, NodeId, NodeKind, WeakDocument};
use weft_reactive::{BindingScope, ManualScheduler, Observable, Scheduler, Subscription, Value};

use crate::child::Child;
use crate::config::RenderConfig;
use crate::descriptor::{Children, El, ElInner, Selector, ViewId};
use crate::error::ViewError;
use crate::reconcile::Reconciler;
use crate::reflect::apply_params;
use crate::selector::parse_selector;

struct CacheEntry {
    node: NodeId,
    owner: Weak<ElInner>,
}

struct RootInner {
    doc: Document,
    scheduler: Rc<dyn Scheduler>,
    manual: Option<Rc<ManualScheduler>>,
    config: RenderConfig,
    cache: RefCell<AHashMap<ViewId, CacheEntry>>,
    scopes: RefCell<AHashMap<NodeId, BindingScope>>,
    retained: RefCell<AHashMap<NodeId, El>>,
    mounts: RefCell<Vec<NodeId>>,
}

/// Owner of a document and of everything realized into it.
#[derive(Clone)]
pub struct RenderRoot {
    inner: Rc<RootInner>,
}

/// Non-owning handle to a [`RenderRoot`].
#[derive(Clone)]
pub struct WeakRoot {
    inner: Weak<RootInner>,
}

impl WeakRoot {
    #[must_use]
    pub fn upgrade(&self) -> Option<RenderRoot> {
        self.inner.upgrade().map(|inner| RenderRoot { inner })
    }
}

impl std::fmt::Debug for WeakRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakRoot")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Default for RenderRoot {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderRoot {
    /// A root with default config and a [`ManualScheduler`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RenderConfig::default())
    }

    /// A root with a [`ManualScheduler`]; drive it with
    /// [`flush`](Self::flush) and [`flush_frame`](Self::flush_frame).
    #[must_use]
    pub fn with_config(config: RenderConfig) -> Self {
        let manual = Rc::new(ManualScheduler::new().with_max_rounds(config.max_microtask_rounds));
        let scheduler: Rc<dyn Scheduler> = manual.clone();
        Self::build(scheduler, Some(manual), config)
    }

    /// A root driven by an external scheduler.
    #[must_use]
    pub fn with_scheduler(scheduler: Rc<dyn Scheduler>, config: RenderConfig) -> Self {
        Self::build(scheduler, None, config)
    }

    fn build(
        scheduler: Rc<dyn Scheduler>,
        manual: Option<Rc<ManualScheduler>>,
        config: RenderConfig,
    ) -> Self {
        Self {
            inner: Rc::new(RootInner {
                doc: Document::with_scheduler(Rc::clone(&scheduler)),
                scheduler,
                manual,
                config,
                cache: RefCell::new(AHashMap::new()),
                scopes: RefCell::new(AHashMap::new()),
                retained: RefCell::new(AHashMap::new()),
                mounts: RefCell::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.inner.doc
    }

    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn scheduler(&self) -> Rc<dyn Scheduler> {
        Rc::clone(&self.inner.scheduler)
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakRoot {
        WeakRoot {
            inner: Rc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ── Realization ─────────────────────────────────────────────────

    /// The node for `el`, created on first call. Later calls return the
    /// same node regardless of changes made to `el` since.
    pub fn realize(&self, el: &El) -> NodeId {
        if let Some(node) = self.cached(el) {
            return node;
        }
        let node = match el.selector() {
            Selector::Node(node) => node,
            Selector::Shorthand(shorthand) => self.create_from_shorthand(&shorthand),
        };
        // Registered before params and children run, so a child that
        // refers back to `el` gets this node instead of recursing.
        self.inner.cache.borrow_mut().insert(
            el.id(),
            CacheEntry {
                node,
                owner: el.downgrade(),
            },
        );

        let params = el.current_params();
        apply_params(self, node, &params);
        match el.current_children() {
            Some(Children::Live(list)) => {
                Reconciler::bind(self, node, &list);
            }
            Some(Children::Static(items)) => {
                Reconciler::bind_static(self, node, &items);
            }
            None => {}
        }
        tracing::trace!(
            target: "weft_view::root",
            view = el.id().get(),
            node = %node,
            capabilities = ?params.capabilities(),
            "realized"
        );
        node
    }

    /// The cached node for `el`, if it has been realized.
    #[must_use]
    pub fn cached(&self, el: &El) -> Option<NodeId> {
        self.inner.cache.borrow().get(&el.id()).map(|e| e.node)
    }

    fn create_from_shorthand(&self, shorthand: &str) -> NodeId {
        let spec = parse_selector(shorthand, &self.inner.config.default_tag);
        let doc = &self.inner.doc;
        let node = doc.create_element(&spec.tag);
        if let Some(id) = &spec.id {
            doc.set_attribute(node, "id", id);
        }
        for class in &spec.classes {
            doc.add_class(node, class);
        }
        for (name, value) in &spec.attrs {
            doc.set_attribute(node, name, value);
        }
        node
    }

    /// Turn one child-list entry into exactly one node.
    pub fn resolve(&self, child: &Child) -> NodeId {
        let doc = &self.inner.doc;
        match child {
            Child::Empty => doc.create_fragment(),
            Child::Text(text) => doc.create_text(text),
            Child::Node(node) => *node,
            Child::El(el) => self.realize(el),
            Child::Mapped(mapped) => mapped.element(self),
            Child::Switched(switched) => switched.host(self),
            Child::Items(items) => {
                let fragment = doc.create_fragment();
                Reconciler::bind_static(self, fragment, items);
                fragment
            }
            Child::Live(list) => {
                let fragment = doc.create_fragment();
                Reconciler::bind(self, fragment, list);
                fragment
            }
            Child::Cell(cell) => self.live_text(cell),
            Child::Lazy(produce) => self.resolve(&produce()),
        }
    }

    fn live_text(&self, cell: &Observable<Value>) -> NodeId {
        let node = self.inner.doc.create_text(&cell_text(&cell.get()));
        let doc: WeakDocument = self.inner.doc.downgrade();
        let sub = cell.subscribe(move |value: &Value| {
            let Some(doc) = doc.upgrade() else {
                return;
            };
            let text = cell_text(value);
            if doc.text(node).as_deref() != Some(text.as_str()) {
                doc.set_text(node, &text);
            }
        });
        self.hold(node, sub);
        node
    }

    // ── Structure ───────────────────────────────────────────────────

    /// Resolve `child` and append it under `parent`.
    pub fn mount(&self, parent: Option<NodeId>, child: impl Into<Child>) -> Result<NodeId, ViewError> {
        let parent = self.require(parent, "mount")?;
        if self.inner.doc.kind(parent) == Some(NodeKind::Text) {
            return Err(ViewError::MissingNode("mount"));
        }
        let node = self.resolve(&child.into());
        self.inner.doc.append_child(parent, node);
        self.inner.mounts.borrow_mut().push(node);
        Ok(node)
    }

    /// `node`, if it is present and still part of this root's document.
    pub fn require(&self, node: Option<NodeId>, what: &'static str) -> Result<NodeId, ViewError> {
        match node {
            Some(node) if self.inner.doc.exists(node) => Ok(node),
            _ => Err(ViewError::MissingNode(what)),
        }
    }

    // ── Lifetimes ───────────────────────────────────────────────────

    /// Tie `sub` to `node`: it lives until `node` is released.
    pub fn hold(&self, node: NodeId, sub: Subscription) {
        self.inner
            .scopes
            .borrow_mut()
            .entry(node)
            .or_default()
            .hold(sub);
    }

    /// Keep `el` alive for as long as `node` is.
    pub fn retain(&self, node: NodeId, el: El) {
        self.inner.retained.borrow_mut().insert(node, el);
    }

    /// Number of live bindings held for `node`.
    #[must_use]
    pub fn binding_count(&self, node: NodeId) -> usize {
        self.inner
            .scopes
            .borrow()
            .get(&node)
            .map_or(0, BindingScope::binding_count)
    }

    /// Number of nodes with at least one binding.
    #[must_use]
    pub fn scope_count(&self) -> usize {
        self.inner.scopes.borrow().len()
    }

    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.inner.cache.borrow().len()
    }

    /// Drop every binding and retained descriptor of `node`'s subtree, and
    /// forget its cache rows. Returns the number of scopes dropped.
    pub fn release(&self, node: NodeId) -> usize {
        let mut subtree = vec![node];
        let mut i = 0;
        while i < subtree.len() {
            subtree.extend(self.inner.doc.child_nodes(subtree[i]));
            i += 1;
        }

        let mut dropped = Vec::new();
        {
            let mut scopes = self.inner.scopes.borrow_mut();
            for n in &subtree {
                if let Some(scope) = scopes.remove(n) {
                    dropped.push(scope);
                }
            }
        }
        let retained: Vec<El> = {
            let mut map = self.inner.retained.borrow_mut();
            subtree.iter().filter_map(|n| map.remove(n)).collect()
        };
        self.inner
            .cache
            .borrow_mut()
            .retain(|_, entry| !subtree.contains(&entry.node));

        let count = dropped.len();
        // Dropped outside the borrows: scope teardown may release owners
        // that reach back into the root.
        drop(dropped);
        drop(retained);
        tracing::debug!(
            target: "weft_view::root",
            node = %node,
            scopes = count,
            "released subtree"
        );
        count
    }

    /// Detach `el`'s node and release it. Returns whether `el` was realized.
    pub fn dispose(&self, el: &El) -> bool {
        let Some(node) = self.cached(el) else {
            return false;
        };
        self.inner.doc.remove(node);
        self.release(node);
        self.inner.cache.borrow_mut().remove(&el.id());
        true
    }

    /// Forget cache rows whose descriptor no longer exists and release
    /// their nodes. Returns the number of rows removed.
    pub fn sweep(&self) -> usize {
        let dead: Vec<(ViewId, NodeId)> = self
            .inner
            .cache
            .borrow()
            .iter()
            .filter(|(_, entry)| entry.owner.strong_count() == 0)
            .map(|(id, entry)| (*id, entry.node))
            .collect();
        for (id, node) in &dead {
            self.inner.cache.borrow_mut().remove(id);
            if self.inner.doc.parent(*node).is_none() {
                self.release(*node);
            }
        }
        if !dead.is_empty() {
            tracing::debug!(target: "weft_view::root", rows = dead.len(), "swept identity cache");
        }
        dead.len()
    }

    /// Detach everything mounted through [`mount`](Self::mount) and drop
    /// every binding, cache row and retained descriptor.
    pub fn unmount(&self) {
        let mounts = std::mem::take(&mut *self.inner.mounts.borrow_mut());
        for node in &mounts {
            self.inner.doc.remove(*node);
        }
        let scopes = std::mem::take(&mut *self.inner.scopes.borrow_mut());
        let retained = std::mem::take(&mut *self.inner.retained.borrow_mut());
        self.inner.cache.borrow_mut().clear();
        tracing::debug!(
            target: "weft_view::root",
            mounts = mounts.len(),
            scopes = scopes.len(),
            "unmounted root"
        );
        drop(scopes);
        drop(retained);
    }

    // ── Scheduling ──────────────────────────────────────────────────

    /// Run queued microtasks (child-list flushes, attribute observers).
    /// Returns the number of tasks run; always 0 with an external
    /// scheduler.
    pub fn flush(&self) -> usize {
        self.inner.manual.as_ref().map_or(0, |m| m.run_microtasks())
    }

    /// Run the current frame's tasks, then microtasks.
    pub fn flush_frame(&self) -> usize {
        self.inner.manual.as_ref().map_or(0, |m| m.run_frame())
    }
}

fn cell_text(value: &Value) -> String {
    match value.resolved() {
        Value::Null => String::new(),
        other => other.as_text().unwrap_or_default(),
    }
}

impl std::fmt::Debug for RenderRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderRoot")
            .field("config", &self.inner.config)
            .field("cache", &self.inner.cache.borrow().len())
            .field("scopes", &self.inner.scopes.borrow().len())
            .field("mounts", &self.inner.mounts.borrow().len())
            .finish_non_exhaustive()
    }
}
