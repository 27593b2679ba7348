#![forbid(unsafe_code)]

//! Event listeners and dispatch.
//!
//! Dispatch walks three phases: capture (root down to the target's parent),
//! target (capture listeners first, then the rest), bubble (parent up to
//! the root).
//!
//! # Invariants
//!
//! 1. Listeners on one node run in registration order within a phase.
//! 2. `ONCE` listeners are removed before they run.
//! 3. `prevent_default` is ignored while a `PASSIVE` listener runs.
//! 4. `stop_propagation` finishes the current node, then stops.
//!
//! # Failure Modes
//!
//! - A panicking listener is logged and skipped.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use weft_reactive::Value;

use crate::document::Document;
use crate::node::NodeId;

bitflags::bitflags! {
    /// Options attached to a listener.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ListenerFlags: u8 {
        const CAPTURE = 0b0000_0001;
        const PASSIVE = 0b0000_0010;
        const ONCE    = 0b0000_0100;
    }
}

pub type Handler = Rc<dyn Fn(&Event)>;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a registered listener for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub(crate) struct ListenerEntry {
    id: ListenerId,
    event: String,
    handler: Handler,
    flags: ListenerFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

/// An event in flight.
pub struct Event {
    name: String,
    target: NodeId,
    detail: Value,
    current_target: Cell<Option<NodeId>>,
    phase: Cell<EventPhase>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
    in_passive: Cell<bool>,
}

impl Event {
    fn new(name: &str, target: NodeId, detail: Value) -> Self {
        Self {
            name: name.to_owned(),
            target,
            detail,
            current_target: Cell::new(None),
            phase: Cell::new(EventPhase::None),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
            in_passive: Cell::new(false),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn target(&self) -> NodeId {
        self.target
    }

    #[must_use]
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    #[must_use]
    pub fn phase(&self) -> EventPhase {
        self.phase.get()
    }

    /// Payload supplied by the dispatcher.
    #[must_use]
    pub fn detail(&self) -> &Value {
        &self.detail
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn prevent_default(&self) {
        if !self.in_passive.get() {
            self.default_prevented.set(true);
        }
    }

    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("phase", &self.phase.get())
            .field("default_prevented", &self.default_prevented.get())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
enum Pass {
    Capture,
    TargetCapture,
    TargetBubble,
    Bubble,
}

impl Pass {
    fn accepts(self, flags: ListenerFlags) -> bool {
        let capture = flags.contains(ListenerFlags::CAPTURE);
        match self {
            Self::Capture | Self::TargetCapture => capture,
            Self::TargetBubble | Self::Bubble => !capture,
        }
    }
}

impl Document {
    /// Register `handler` for events named `event` on `node`.
    pub fn add_listener(
        &self,
        node: NodeId,
        event: &str,
        handler: Handler,
        flags: ListenerFlags,
    ) -> Option<ListenerId> {
        let mut inner = self.inner.borrow_mut();
        let data = inner.node_mut(node)?;
        let id = ListenerId::next();
        data.listeners.push(ListenerEntry {
            id,
            event: event.to_owned(),
            handler,
            flags,
        });
        Some(id)
    }

    pub fn remove_listener(&self, node: NodeId, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(data) = inner.node_mut(node) else {
            return false;
        };
        let before = data.listeners.len();
        data.listeners.retain(|l| l.id != id);
        data.listeners.len() != before
    }

    #[must_use]
    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.inner.borrow().node(node).map_or(0, |n| {
            n.listeners.iter().filter(|l| l.event == event).count()
        })
    }

    /// Dispatch `event` at `target`. Returns `false` if a listener called
    /// `prevent_default`.
    pub fn dispatch(&self, target: NodeId, event: &str) -> bool {
        self.dispatch_with(target, event, Value::Null)
    }

    /// Dispatch with a payload readable through [`Event::detail`].
    pub fn dispatch_with(&self, target: NodeId, event: &str, detail: Value) -> bool {
        if !self.exists(target) {
            return true;
        }
        let event = Event::new(event, target, detail);
        let mut path = Vec::new();
        let mut current = self.parent(target);
        while let Some(node) = current {
            path.push(node);
            current = self.parent(node);
        }

        event.phase.set(EventPhase::Capturing);
        for node in path.iter().rev() {
            self.invoke(*node, &event, Pass::Capture);
            if event.propagation_stopped.get() {
                return !event.default_prevented();
            }
        }

        event.phase.set(EventPhase::AtTarget);
        self.invoke(target, &event, Pass::TargetCapture);
        self.invoke(target, &event, Pass::TargetBubble);
        if event.propagation_stopped.get() {
            return !event.default_prevented();
        }

        event.phase.set(EventPhase::Bubbling);
        for node in &path {
            self.invoke(*node, &event, Pass::Bubble);
            if event.propagation_stopped.get() {
                break;
            }
        }
        event.phase.set(EventPhase::None);
        !event.default_prevented()
    }

    fn invoke(&self, node: NodeId, event: &Event, pass: Pass) {
        let matched: Vec<(Handler, ListenerFlags)> = {
            let mut inner = self.inner.borrow_mut();
            let Some(data) = inner.node_mut(node) else {
                return;
            };
            let matched = data
                .listeners
                .iter()
                .filter(|l| l.event == event.name && pass.accepts(l.flags))
                .map(|l| (Rc::clone(&l.handler), l.flags))
                .collect();
            data.listeners.retain(|l| {
                !(l.flags.contains(ListenerFlags::ONCE)
                    && l.event == event.name
                    && pass.accepts(l.flags))
            });
            matched
        };
        event.current_target.set(Some(node));
        for (handler, flags) in matched {
            event.in_passive.set(flags.contains(ListenerFlags::PASSIVE));
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(event)));
            event.in_passive.set(false);
            if outcome.is_err() {
                tracing::warn!(
                    target: "weft_dom::event",
                    event = %event.name,
                    %node,
                    "listener panicked"
                );
            }
        }
    }
}
