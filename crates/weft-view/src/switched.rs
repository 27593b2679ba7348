#![forbid(unsafe_code)]

//! Exclusive-child switch.
//!
//! A [`Switched`] shows at most one of its children, chosen by an
//! [`Observable`] index. A negative or out-of-range index selects nothing.
//!
//! | from          | to            | tree edit                          |
//! |---------------|---------------|------------------------------------|
//! | unselected    | selected(j)   | append `j` under the parent        |
//! | selected(i)   | selected(j)   | replace `i` with `j` in place      |
//! | selected(i)   | unselected    | remove `i`, remember its parent    |
//! | same          | same          | nothing                            |
//!
//! The parent is wherever the selected node currently is, so the switch
//! keeps working after its node has been moved into another container.

use std::cell::RefCell;
use std::rc::Rc;

use weft_dom::NodeId;
use weft_reactive::Observable;

use crate::descriptor::El;
use crate::root::{RenderRoot, WeakRoot};

#[derive(Default)]
struct SwitchState {
    root: Option<WeakRoot>,
    host: Option<NodeId>,
    /// Where the next selection is attached when nothing is selected.
    parent: Option<NodeId>,
    current: Option<(usize, NodeId)>,
}

struct SwitchedInner {
    index: Observable<i64>,
    children: Vec<El>,
    state: RefCell<SwitchState>,
}

/// One-of-N child chosen by an observable index.
#[derive(Clone)]
pub struct Switched {
    inner: Rc<SwitchedInner>,
}

impl Switched {
    #[must_use]
    pub fn new(index: Observable<i64>, children: Vec<El>) -> Self {
        Self {
            inner: Rc::new(SwitchedInner {
                index,
                children,
                state: RefCell::new(SwitchState::default()),
            }),
        }
    }

    #[must_use]
    pub fn index(&self) -> &Observable<i64> {
        &self.inner.index
    }

    #[must_use]
    pub fn children(&self) -> &[El] {
        &self.inner.children
    }

    /// Index of the shown child, if any.
    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.inner.state.borrow().current.map(|(i, _)| i)
    }

    /// The shown child's node (binding the switch on first call).
    pub fn element(&self, root: &RenderRoot) -> Option<NodeId> {
        self.host(root);
        self.inner.state.borrow().current.map(|(_, node)| node)
    }

    /// A fragment that holds the shown child while it has not been moved
    /// elsewhere. This is what a child list places. A host released by its
    /// enclosing list is replaced by a fresh one.
    pub fn host(&self, root: &RenderRoot) -> NodeId {
        let existing = self.inner.state.borrow().host;
        if let Some(host) = existing {
            if root.binding_count(host) > 0 {
                return host;
            }
            *self.inner.state.borrow_mut() = SwitchState::default();
        }
        let host = root.document().create_fragment();
        {
            let mut state = self.inner.state.borrow_mut();
            state.root = Some(root.downgrade());
            state.host = Some(host);
            state.parent = Some(host);
        }
        self.select(root, self.inner.index.get());

        let handle = self.clone();
        let sub = self.inner.index.subscribe(move |index: &i64| {
            let root = handle
                .inner
                .state
                .borrow()
                .root
                .as_ref()
                .and_then(WeakRoot::upgrade);
            if let Some(root) = root {
                handle.select(&root, *index);
            }
        });
        root.hold(host, sub);
        host
    }

    fn target(&self, index: i64) -> Option<usize> {
        usize::try_from(index)
            .ok()
            .filter(|i| *i < self.inner.children.len())
    }

    fn select(&self, root: &RenderRoot, index: i64) {
        let target = self.target(index);
        let (current, remembered, host) = {
            let state = self.inner.state.borrow();
            (state.current, state.parent, state.host)
        };
        let doc = root.document();
        let next = match (current, target) {
            (Some((i, _)), Some(j)) if i == j => return,
            (None, None) => return,
            (Some((_, old)), Some(j)) => {
                let new = root.realize(&self.inner.children[j]);
                match doc.parent(old) {
                    Some(parent) => {
                        doc.replace_child(parent, new, old);
                    }
                    None => {
                        if let Some(parent) = remembered.or(host) {
                            doc.append_child(parent, new);
                        }
                    }
                }
                Some((j, new))
            }
            (Some((_, old)), None) => {
                let parent = doc.parent(old);
                doc.remove(old);
                self.inner.state.borrow_mut().parent = parent.or(host);
                None
            }
            (None, Some(j)) => {
                let new = root.realize(&self.inner.children[j]);
                if let Some(parent) = remembered.or(host) {
                    doc.append_child(parent, new);
                }
                Some((j, new))
            }
        };
        tracing::debug!(
            target: "weft_view::switched",
            index,
            selected = ?next.map(|(i, _)| i),
            "switch transition"
        );
        self.inner.state.borrow_mut().current = next;
    }
}

impl std::fmt::Debug for Switched {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Switched")
            .field("index", &self.inner.index.get())
            .field("children", &self.inner.children.len())
            .field("selected", &self.selected())
            .finish()
    }
}
