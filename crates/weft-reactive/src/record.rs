#![forbid(unsafe_code)]

//! Observable keyed container.
//!
//! Keys are strings and iterate in sorted order, which keeps replays and
//! reflector writes deterministic.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::op::RecordOp;
use crate::subscription::{ReplayGate, Subscribers, Subscription, deliver};

struct RecordInner<V> {
    entries: BTreeMap<String, V>,
    subscribers: Subscribers<RecordOp<V>>,
}

/// A shared string-keyed map that notifies subscribers of every mutation.
pub struct ObservableRecord<V> {
    inner: Rc<RefCell<RecordInner<V>>>,
}

impl<V> Clone for ObservableRecord<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for ObservableRecord<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.inner.borrow().entries.iter()).finish()
    }
}

impl<V: Clone + 'static> Default for ObservableRecord<V> {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl<K: Into<String>, V: Clone + 'static> FromIterator<(K, V)> for ObservableRecord<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<V: Clone + 'static> ObservableRecord<V> {
    #[must_use]
    pub fn new(entries: BTreeMap<String, V>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RecordInner {
                entries,
                subscribers: Subscribers::new(),
            })),
        }
    }

    fn emit(&self, op: RecordOp<V>) {
        let callbacks = self.inner.borrow_mut().subscribers.snapshot();
        if callbacks.is_empty() {
            return;
        }
        deliver(&callbacks, &op, "record");
    }

    /// Store `value` under `key`. Always notifies, even if unchanged;
    /// consumers skip redundant writes on their side.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        self.inner
            .borrow_mut()
            .entries
            .insert(key.clone(), value.clone());
        self.emit(RecordOp::Set { key, value });
    }

    /// Remove `key`, notifying only if it was present.
    pub fn delete(&self, key: &str) -> Option<V> {
        let value = self.inner.borrow_mut().entries.remove(key)?;
        self.emit(RecordOp::Delete {
            key: key.to_owned(),
            value: value.clone(),
        });
        Some(value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.borrow().entries.get(key).cloned()
    }

    /// Read `key` and emit a `Get` op.
    pub fn track(&self, key: &str) -> Option<V> {
        let value = self.get(key);
        self.emit(RecordOp::Get {
            key: key.to_owned(),
        });
        value
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.borrow().entries.contains_key(key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().entries.keys().cloned().collect()
    }

    /// Sorted `(key, value)` pairs.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, V)> {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Replay current entries as `Set` ops, then deliver live ops.
    pub fn observe(&self, callback: impl Fn(&RecordOp<V>) + 'static) -> Subscription {
        let (gate, wrapper) = ReplayGate::new(callback, "record-replay");
        self.inner.borrow_mut().subscribers.attach(&wrapper);
        gate.run(
            self.entries()
                .into_iter()
                .map(|(key, value)| RecordOp::Set { key, value }),
        );
        Subscription::hold(wrapper)
    }

    pub fn subscribe(&self, callback: impl Fn(&RecordOp<V>) + 'static) -> Subscription {
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

    #[must_use]
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_of(record: &ObservableRecord<i32>) -> (Rc<RefCell<Vec<RecordOp<i32>>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let sub = record.observe(move |op| sink.borrow_mut().push(op.clone()));
        (log, sub)
    }

    #[test]
    fn observe_replays_sorted_entries() {
        let record: ObservableRecord<i32> = [("b", 2), ("a", 1)].into_iter().collect();
        let (log, _sub) = log_of(&record);
        assert_eq!(
            *log.borrow(),
            vec![
                RecordOp::Set {
                    key: "a".into(),
                    value: 1
                },
                RecordOp::Set {
                    key: "b".into(),
                    value: 2
                },
            ]
        );
    }

    #[test]
    fn set_always_notifies() {
        let record = ObservableRecord::default();
        let (log, _sub) = log_of(&record);
        record.set("k", 1);
        record.set("k", 1);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn delete_absent_is_silent() {
        let record: ObservableRecord<i32> = [("k", 4)].into_iter().collect();
        let (log, _sub) = log_of(&record);
        log.borrow_mut().clear();
        assert_eq!(record.delete("missing"), None);
        assert!(log.borrow().is_empty());
        assert_eq!(record.delete("k"), Some(4));
        assert_eq!(
            *log.borrow(),
            vec![RecordOp::Delete {
                key: "k".into(),
                value: 4
            }]
        );
        assert!(record.is_empty());
    }

    #[test]
    fn track_emits_get() {
        let record: ObservableRecord<i32> = [("k", 4)].into_iter().collect();
        let (log, _sub) = log_of(&record);
        assert_eq!(record.track("k"), Some(4));
        assert_eq!(log.borrow().last().map(RecordOp::tag), Some(crate::OpTag::Get));
    }
}
