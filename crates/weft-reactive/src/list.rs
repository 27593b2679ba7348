#![forbid(unsafe_code)]

//! Observable sequence container.
//!
//! [`ObservableList<T>`] wraps a `Vec<T>` behind typed mutators. Each mutator
//! changes the data first and then synchronously delivers a [`ListOp`] to
//! every subscriber, in registration order. There is no batching at this
//! layer; the child-list reconciler batches on its own side.
//!
//! # Invariants
//!
//! 1. When a mutator returns, every live subscriber has seen its op.
//! 2. [`observe`](ObservableList::observe) replays the current contents as
//!    `Push` ops before any live op reaches the new subscriber.
//! 3. Out-of-range `set`/`splice` indices act at the end of the list.
//! 4. `pop`/`delete` of a missing element change nothing and notify nobody.
//!
//! # Failure Modes
//!
//! - Subscriber panics are contained (see [`crate::subscription`]).
//! - No borrow is held while subscribers run, so they may read or mutate
//!   the list re-entrantly.

use std::cell::RefCell;
use std::rc::Rc;

use crate::op::ListOp;
use crate::subscription::{ReplayGate, Subscribers, Subscription, deliver};

struct ListInner<T> {
    items: Vec<T>,
    subscribers: Subscribers<ListOp<T>>,
}

/// A shared sequence that notifies subscribers of every mutation.
///
/// Cloning creates another handle to the same list.
pub struct ObservableList<T> {
    inner: Rc<RefCell<ListInner<T>>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.inner.borrow().items.iter()).finish()
    }
}

impl<T: Clone + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Clone + 'static> FromIterator<T> for ObservableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T: Clone + 'static> ObservableList<T> {
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ListInner {
                items,
                subscribers: Subscribers::new(),
            })),
        }
    }

    fn emit(&self, op: ListOp<T>) {
        let callbacks = self.inner.borrow_mut().subscribers.snapshot();
        if callbacks.is_empty() {
            return;
        }
        deliver(&callbacks, &op, "list");
    }

    // ── Mutators ────────────────────────────────────────────────────

    /// Append `value`.
    pub fn push(&self, value: T) {
        self.inner.borrow_mut().items.push(value.clone());
        self.emit(ListOp::Push(value));
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<T> {
        let popped = self.inner.borrow_mut().items.pop()?;
        self.emit(ListOp::Pop(popped.clone()));
        Some(popped)
    }

    /// Remove `remove_count` elements at `index` and insert `insert` there.
    ///
    /// `index` is clamped to the length and `remove_count` to what is
    /// available. A call that neither removes nor inserts is silent.
    pub fn splice(&self, index: usize, remove_count: usize, insert: Vec<T>) -> Vec<T> {
        let (index, removed) = {
            let mut inner = self.inner.borrow_mut();
            let len = inner.items.len();
            let index = index.min(len);
            let end = index + remove_count.min(len - index);
            let removed: Vec<T> = inner
                .items
                .splice(index..end, insert.iter().cloned())
                .collect();
            (index, removed)
        };
        if removed.is_empty() && insert.is_empty() {
            return removed;
        }
        self.emit(ListOp::Splice {
            index,
            removed: removed.clone(),
            inserted: insert,
        });
        removed
    }

    /// Replace the element at `index`. An index at or past the end appends,
    /// and the op reports the index the value actually landed at.
    pub fn set(&self, index: usize, value: T) {
        let index = {
            let mut inner = self.inner.borrow_mut();
            if index < inner.items.len() {
                inner.items[index] = value.clone();
                index
            } else {
                inner.items.push(value.clone());
                inner.items.len() - 1
            }
        };
        self.emit(ListOp::Set { index, value });
    }

    /// Remove the element at `index`.
    pub fn delete(&self, index: usize) -> Option<T> {
        let value = {
            let mut inner = self.inner.borrow_mut();
            if index >= inner.items.len() {
                return None;
            }
            inner.items.remove(index)
        };
        self.emit(ListOp::Delete {
            index,
            value: value.clone(),
        });
        Some(value)
    }

    /// Remove everything (a single `Splice` op).
    pub fn clear(&self) {
        let len = self.len();
        self.splice(0, len, Vec::new());
    }

    /// Replace the whole contents (a single `Splice` op).
    pub fn replace_all(&self, items: Vec<T>) {
        let len = self.len();
        self.splice(0, len, items);
    }

    // ── Reads ───────────────────────────────────────────────────────

    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.borrow().items.get(index).cloned()
    }

    /// Read `index` and emit a `Get` op to subscribers.
    pub fn track(&self, index: usize) -> Option<T> {
        let value = self.get(index);
        self.emit(ListOp::Get { index });
        value
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().items.is_empty()
    }

    /// Borrow the contents. Mutating the list from inside `f` panics.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.borrow().items)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.borrow().items.clone()
    }

    // ── Subscription ────────────────────────────────────────────────

    /// Replay the current contents as `Push` ops, then deliver live ops.
    ///
    /// Ops caused during the replay (by this subscriber or another) are
    /// delivered after it, so the replay plus the live ops always add up to
    /// the list's contents.
    pub fn observe(&self, callback: impl Fn(&ListOp<T>) + 'static) -> Subscription {
        let (gate, wrapper) = ReplayGate::new(callback, "list-replay");
        self.inner.borrow_mut().subscribers.attach(&wrapper);
        gate.run(self.to_vec().into_iter().map(ListOp::Push));
        Subscription::hold(wrapper)
    }

    /// Deliver live ops only.
    pub fn subscribe(&self, callback: impl Fn(&ListOp<T>) + 'static) -> Subscription {
        self.inner.borrow_mut().subscribers.add(callback)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.live_count()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Address of the shared list, used as its identity key.
    #[must_use]
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + 'static>(
        list: &ObservableList<T>,
        replay: bool,
    ) -> (Rc<RefCell<Vec<ListOp<T>>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let cb = move |op: &ListOp<T>| sink.borrow_mut().push(op.clone());
        let sub = if replay {
            list.observe(cb)
        } else {
            list.subscribe(cb)
        };
        (log, sub)
    }

    #[test]
    fn push_notifies_once() {
        let list = ObservableList::new(Vec::<&str>::new());
        let (log, _sub) = recorder(&list, true);
        list.push("a");
        assert_eq!(*log.borrow(), vec![ListOp::Push("a")]);
    }

    #[test]
    fn observe_replays_existing_items() {
        let list = ObservableList::new(vec!["x", "y"]);
        let (log, _sub) = recorder(&list, true);
        assert_eq!(*log.borrow(), vec![ListOp::Push("x"), ListOp::Push("y")]);
    }

    #[test]
    fn subscribe_does_not_replay() {
        let list = ObservableList::new(vec![1, 2]);
        let (log, _sub) = recorder(&list, false);
        assert!(log.borrow().is_empty());
        list.pop();
        assert_eq!(*log.borrow(), vec![ListOp::Pop(2)]);
    }

    #[test]
    fn pop_on_empty_is_silent() {
        let list = ObservableList::<u8>::default();
        let (log, _sub) = recorder(&list, false);
        assert_eq!(list.pop(), None);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn splice_clamps_and_reports() {
        let list = ObservableList::new(vec![1, 2, 3]);
        let (log, _sub) = recorder(&list, false);
        let removed = list.splice(2, 10, vec![9]);
        assert_eq!(removed, vec![3]);
        assert_eq!(list.to_vec(), vec![1, 2, 9]);
        assert_eq!(
            *log.borrow(),
            vec![ListOp::Splice {
                index: 2,
                removed: vec![3],
                inserted: vec![9]
            }]
        );
    }

    #[test]
    fn empty_splice_is_silent() {
        let list = ObservableList::new(vec![1]);
        let (log, _sub) = recorder(&list, false);
        list.splice(5, 3, Vec::new());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn set_past_end_appends() {
        let list = ObservableList::new(vec!['a']);
        let (log, _sub) = recorder(&list, false);
        list.set(7, 'b');
        assert_eq!(list.to_vec(), vec!['a', 'b']);
        assert_eq!(
            *log.borrow(),
            vec![ListOp::Set {
                index: 1,
                value: 'b'
            }]
        );
    }

    #[test]
    fn delete_missing_index_is_silent() {
        let list = ObservableList::new(vec![1]);
        let (log, _sub) = recorder(&list, false);
        assert_eq!(list.delete(4), None);
        assert_eq!(list.delete(0), Some(1));
        assert_eq!(
            *log.borrow(),
            vec![ListOp::Delete { index: 0, value: 1 }]
        );
    }

    #[test]
    fn track_emits_get() {
        let list = ObservableList::new(vec![5]);
        let (log, _sub) = recorder(&list, false);
        assert_eq!(list.track(0), Some(5));
        assert_eq!(*log.borrow(), vec![ListOp::Get { index: 0 }]);
    }

    #[test]
    fn subscriber_may_read_during_delivery() {
        let list = ObservableList::new(Vec::<u32>::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let reader = list.clone();
        let sink = Rc::clone(&seen);
        let _sub = list.subscribe(move |_| sink.borrow_mut().push(reader.len()));
        list.push(1);
        list.push(2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn replay_callback_may_read_the_list() {
        let list = ObservableList::new(vec![1, 2]);
        let reader = list.clone();
        let lens = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&lens);
        let _sub = list.observe(move |_| sink.borrow_mut().push(reader.len()));
        assert_eq!(*lens.borrow(), vec![2, 2]);
    }

    #[test]
    fn clear_and_replace_all_use_one_splice() {
        let list = ObservableList::new(vec![1, 2]);
        let (log, _sub) = recorder(&list, false);
        list.replace_all(vec![3]);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(log.borrow().len(), 2);
    }
}
