#![forbid(unsafe_code)]

//! Shared, version-tracked scalar values with change notification.
//!
//! [`Observable<T>`] is the boxed reference of the toolkit: a cell whose
//! `.get()` is the current value and whose subscribers hear every change.
//! Reflectors treat a [`Value::Cell`](crate::Value::Cell) as "bind to this
//! cell" and the exclusive-child switch uses an `Observable<i64>` as its
//! index.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order, after the value has
//!    been stored.
//! 3. Setting a value equal to the current value is a no-op (no version
//!    bump, no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//!
//! # Failure Modes
//!
//! - A subscriber that panics is logged and skipped; delivery continues.
//! - A subscriber may call `set` re-entrantly; the nested notification is
//!   delivered depth-first before the outer delivery resumes.

use std::cell::RefCell;
use std::rc::Rc;

use crate::subscription::{Subscribers, Subscription, deliver};

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Subscribers<T>,
}

/// A shared, version-tracked value wrapper with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** value.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new observable holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Subscribers::new(),
            })),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value, notifying subscribers if it changed.
    pub fn set(&self, value: T) {
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
            inner.subscribers.snapshot()
        };
        if callbacks.is_empty() {
            return;
        }
        let current = self.get();
        deliver(&callbacks, &current, "observable");
    }

    /// Mutate the value in place; notifies only if the result differs.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Subscribe to future changes (no replay of the current value).
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner.borrow_mut().subscribers.add(callback)
    }

    /// Number of value-changing mutations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.live_count()
    }

    /// Whether two handles share the same underlying cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Address of the shared cell, used as its identity key.
    #[must_use]
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn set_notifies_with_new_value() {
        let obs = Observable::new(1);
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let _sub = obs.subscribe(move |v| s.set(*v));
        obs.set(5);
        assert_eq!(seen.get(), 5);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn equal_set_is_noop() {
        let obs = Observable::new(3);
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let _sub = obs.subscribe(move |_| c.set(c.get() + 1));
        obs.set(3);
        assert_eq!(calls.get(), 0);
        assert_eq!(obs.version(), 0);
    }

    #[test]
    fn update_in_place() {
        let obs = Observable::new(vec![1, 2]);
        obs.update(|v| v.push(3));
        assert_eq!(obs.get(), vec![1, 2, 3]);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let obs = Observable::new(0);
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let sub = obs.subscribe(move |v| s.set(*v));
        obs.set(1);
        drop(sub);
        obs.set(2);
        assert_eq!(seen.get(), 1);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn reentrant_set_from_subscriber() {
        let obs = Observable::new(0);
        let inner = obs.clone();
        let _sub = obs.subscribe(move |v| {
            if *v == 1 {
                inner.set(2);
            }
        });
        obs.set(1);
        assert_eq!(obs.get(), 2);
        assert_eq!(obs.version(), 2);
    }

    #[test]
    fn clones_share_state() {
        let a = Observable::new("x".to_string());
        let b = a.clone();
        b.set("y".to_string());
        assert_eq!(a.get(), "y");
        assert!(a.ptr_eq(&b));
        assert_eq!(a.identity(), b.identity());
    }
}
