#![forbid(unsafe_code)]

//! Subscriber lists and the RAII [`Subscription`] guard.
//!
//! Every notifying type in this crate (scalar [`Observable`], list and record
//! containers) stores its callbacks in a [`Subscribers`] list. The list holds
//! only `Weak` references; the strong reference lives in the [`Subscription`]
//! returned to the caller, so dropping the guard unsubscribes.
//!
//! # Invariants
//!
//! 1. Callbacks run in registration order.
//! 2. A callback registered or dropped during a notification does not affect
//!    the delivery already in progress (delivery works on a snapshot).
//! 3. A panicking callback is contained: the remaining callbacks still run,
//!    and the failure is logged.
//!
//! [`Observable`]: crate::Observable

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

/// A boxed subscriber callback.
pub(crate) struct Callback<E: ?Sized>(Box<dyn Fn(&E)>);

impl<E: ?Sized + 'static> Callback<E> {
    /// Build a callback without registering it, so it can be fed a replay
    /// before it starts receiving live notifications.
    pub(crate) fn shared(callback: impl Fn(&E) + 'static) -> Rc<Self> {
        Rc::new(Self(Box::new(callback)))
    }
}

/// Registration-ordered list of weakly held callbacks.
pub(crate) struct Subscribers<E: ?Sized> {
    list: Vec<Weak<Callback<E>>>,
}

impl<E: ?Sized + 'static> Subscribers<E> {
    pub(crate) fn new() -> Self {
        Self { list: Vec::new() }
    }

    /// Register a callback, returning the guard that keeps it alive.
    pub(crate) fn add(&mut self, callback: impl Fn(&E) + 'static) -> Subscription {
        let strong = Rc::new(Callback(Box::new(callback)));
        self.list.push(Rc::downgrade(&strong));
        Subscription::hold(strong)
    }

    /// Register an already-built callback (see [`Callback::shared`]).
    pub(crate) fn attach(&mut self, callback: &Rc<Callback<E>>) {
        self.list.push(Rc::downgrade(callback));
    }

    /// Live callbacks, pruning the dead ones.
    pub(crate) fn snapshot(&mut self) -> Vec<Rc<Callback<E>>> {
        self.list.retain(|weak| weak.strong_count() > 0);
        self.list.iter().filter_map(Weak::upgrade).collect()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.list.iter().filter(|weak| weak.strong_count() > 0).count()
    }
}

/// Invoke each callback with `event`, containing panics per callback.
pub(crate) fn deliver<E: ?Sized>(callbacks: &[Rc<Callback<E>>], event: &E, source: &'static str) {
    for (position, callback) in callbacks.iter().enumerate() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (callback.0)(event)));
        if outcome.is_err() {
            tracing::warn!(
                target: "weft_reactive::subscription",
                source,
                position,
                "subscriber panicked; continuing delivery to remaining subscribers"
            );
        }
    }
}

/// Replay-then-live delivery for one new subscriber.
///
/// The gate's [`wrapper`](ReplayGate::new) is registered with the container
/// before the replay runs. Ops that reach it while the replay is still in
/// progress (a subscriber mutating the container from its own callback) are
/// queued and delivered right after the replay, in arrival order. Once the
/// queue drains the wrapper forwards directly.
pub(crate) struct ReplayGate<E> {
    target: Rc<Callback<E>>,
    backlog: RefCell<Option<VecDeque<E>>>,
    source: &'static str,
}

impl<E: Clone + 'static> ReplayGate<E> {
    /// The gate and the wrapper callback to register.
    pub(crate) fn new(
        callback: impl Fn(&E) + 'static,
        source: &'static str,
    ) -> (Rc<Self>, Rc<Callback<E>>) {
        let gate = Rc::new(Self {
            target: Callback::shared(callback),
            backlog: RefCell::new(Some(VecDeque::new())),
            source,
        });
        let forward = Rc::clone(&gate);
        let wrapper = Callback::shared(move |event: &E| forward.accept(event));
        (gate, wrapper)
    }

    fn accept(&self, event: &E) {
        let queued = match self.backlog.borrow_mut().as_mut() {
            Some(queue) => {
                queue.push_back(event.clone());
                true
            }
            None => false,
        };
        if !queued {
            deliver(std::slice::from_ref(&self.target), event, self.source);
        }
    }

    /// Deliver `replay`, then everything queued meanwhile, then open the gate.
    pub(crate) fn run(&self, replay: impl IntoIterator<Item = E>) {
        let target = std::slice::from_ref(&self.target);
        for event in replay {
            deliver(target, &event, self.source);
        }
        let mut drained = 0usize;
        loop {
            let next = self
                .backlog
                .borrow_mut()
                .as_mut()
                .and_then(VecDeque::pop_front);
            let Some(event) = next else { break };
            drained += 1;
            deliver(target, &event, self.source);
        }
        *self.backlog.borrow_mut() = None;
        if drained > 0 {
            tracing::debug!(
                target: "weft_reactive::subscription",
                source = self.source,
                drained,
                "delivered ops queued during replay"
            );
        }
    }
}

/// RAII guard for a subscription.
///
/// The callback stays registered while the guard is alive. Dropping the guard
/// removes the callback before the next notification cycle.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _held: Rc<dyn Any>,
}

impl Subscription {
    /// Wrap any reference-counted value as a subscription guard.
    ///
    /// Holding the guard keeps `value` alive; this is how callback owners
    /// outside this crate (attribute observers, reflector contexts) tie their
    /// lifetime to a [`BindingScope`](crate::BindingScope).
    pub fn hold<T: 'static>(value: Rc<T>) -> Self {
        Self { _held: value }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
