#![forbid(unsafe_code)]

//! Node descriptors.
//!
//! An [`El`] has a fixed identity ([`ViewId`]) and a configuration that can
//! be replaced at any time: selector, [`Params`], children. Realizing it
//! through a [`RenderRoot`](crate::RenderRoot) produces a node exactly once;
//! later configuration changes do not affect the realized node.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use weft_dom::NodeId;
use weft_reactive::ObservableList;

use crate::child::Child;
use crate::params::Params;

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    fn next() -> Self {
        Self(NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// What node a descriptor realizes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `tag#id.class[attr=value]` shorthand.
    Shorthand(String),
    /// Adopt an existing node.
    Node(NodeId),
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        Self::Shorthand(s.to_owned())
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Self::Shorthand(s)
    }
}

impl From<NodeId> for Selector {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

/// A descriptor's children.
#[derive(Clone, Debug)]
pub enum Children {
    /// Kept in sync with the list for the lifetime of the node.
    Live(ObservableList<Child>),
    /// Written once.
    Static(Vec<Child>),
}

impl From<ObservableList<Child>> for Children {
    fn from(list: ObservableList<Child>) -> Self {
        Self::Live(list)
    }
}

impl From<Vec<Child>> for Children {
    fn from(items: Vec<Child>) -> Self {
        Self::Static(items)
    }
}

impl From<Vec<El>> for Children {
    fn from(items: Vec<El>) -> Self {
        Self::Static(items.into_iter().map(Child::El).collect())
    }
}

pub(crate) struct ElInner {
    id: ViewId,
    selector: RefCell<Selector>,
    params: RefCell<Params>,
    children: RefCell<Option<Children>>,
}

/// A lazily realized node description. Cloning shares identity.
#[derive(Clone)]
pub struct El {
    inner: Rc<ElInner>,
}

impl El {
    #[must_use]
    pub fn new(selector: impl Into<Selector>) -> Self {
        Self {
            inner: Rc::new(ElInner {
                id: ViewId::next(),
                selector: RefCell::new(selector.into()),
                params: RefCell::new(Params::default()),
                children: RefCell::new(None),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> ViewId {
        self.inner.id
    }

    #[must_use]
    pub fn params(self, params: Params) -> Self {
        self.set_params(params);
        self
    }

    #[must_use]
    pub fn children(self, children: impl Into<Children>) -> Self {
        self.set_children(children);
        self
    }

    /// Add one child to the static child list (or push onto a live one).
    #[must_use]
    pub fn child(self, child: impl Into<Child>) -> Self {
        let child = child.into();
        {
            let mut slot = self.inner.children.borrow_mut();
            match slot.as_mut() {
                Some(Children::Static(items)) => items.push(child),
                Some(Children::Live(list)) => list.push(child),
                None => *slot = Some(Children::Static(vec![child])),
            }
        }
        self
    }

    pub fn set_selector(&self, selector: impl Into<Selector>) {
        *self.inner.selector.borrow_mut() = selector.into();
    }

    pub fn set_params(&self, params: Params) {
        *self.inner.params.borrow_mut() = params;
    }

    pub fn set_children(&self, children: impl Into<Children>) {
        *self.inner.children.borrow_mut() = Some(children.into());
    }

    #[must_use]
    pub fn selector(&self) -> Selector {
        self.inner.selector.borrow().clone()
    }

    /// A copy of the current parameters.
    #[must_use]
    pub fn current_params(&self) -> Params {
        self.inner.params.borrow().clone()
    }

    /// The current children (the live list is shared, not copied).
    #[must_use]
    pub fn current_children(&self) -> Option<Children> {
        self.inner.children.borrow().clone()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<ElInner> {
        Rc::downgrade(&self.inner)
    }
}

impl std::fmt::Debug for El {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("El")
            .field("id", &self.inner.id)
            .field("selector", &*self.inner.selector.borrow())
            .finish_non_exhaustive()
    }
}
