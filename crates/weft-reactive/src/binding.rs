#![forbid(unsafe_code)]

//! Lifetime grouping for subscriptions.
//!
//! Everything a reflector or reconciler registers on behalf of one realized
//! node is parked in that node's [`BindingScope`]. Releasing the scope
//! disconnects all of it at once.

use crate::list::ObservableList;
use crate::observable::Observable;
use crate::op::{ListOp, RecordOp};
use crate::record::ObservableRecord;
use crate::subscription::Subscription;

/// Collects subscriptions for one logical owner (typically a realized node).
///
/// # Invariants
///
/// 1. Subscriptions are released in reverse registration order on drop.
/// 2. After drop or [`clear`](Self::clear), no callback from this scope fires.
/// 3. The scope is reusable after `clear()`.
pub struct BindingScope {
    subscriptions: Vec<Subscription>,
}

impl BindingScope {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Keep `sub` alive until the scope is cleared or dropped.
    pub fn hold(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    /// Subscribe to a scalar observable within this scope.
    pub fn subscribe<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        self.hold(source.subscribe(callback));
        self
    }

    /// Observe a list (with replay) within this scope.
    pub fn observe_list<T: Clone + 'static>(
        &mut self,
        source: &ObservableList<T>,
        callback: impl Fn(&ListOp<T>) + 'static,
    ) -> &mut Self {
        self.hold(source.observe(callback));
        self
    }

    /// Observe a record (with replay) within this scope.
    pub fn observe_record<V: Clone + 'static>(
        &mut self,
        source: &ObservableRecord<V>,
        callback: impl Fn(&RecordOp<V>) + 'static,
    ) -> &mut Self {
        self.hold(source.observe(callback));
        self
    }

    /// Move every subscription of `other` into this scope.
    pub fn absorb(&mut self, mut other: BindingScope) {
        self.subscriptions.append(&mut other.subscriptions);
    }

    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release all subscriptions now.
    pub fn clear(&mut self) {
        while self.subscriptions.pop().is_some() {}
    }
}

impl Drop for BindingScope {
    fn drop(&mut self) {
        self.clear();
    }
}

impl Default for BindingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingScope")
            .field("binding_count", &self.subscriptions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn scope_holds_until_cleared() {
        let obs = Observable::new(0);
        let hits = Rc::new(Cell::new(0));
        let mut scope = BindingScope::new();
        let h = Rc::clone(&hits);
        scope.subscribe(&obs, move |_| h.set(h.get() + 1));
        obs.set(1);
        assert_eq!(hits.get(), 1);
        assert_eq!(scope.binding_count(), 1);

        scope.clear();
        obs.set(2);
        assert_eq!(hits.get(), 1);
        assert!(scope.is_empty());
    }

    #[test]
    fn drop_releases() {
        let list = ObservableList::new(vec![1]);
        {
            let mut scope = BindingScope::new();
            scope.observe_list(&list, |_| {});
            assert_eq!(list.subscriber_count(), 1);
        }
        assert_eq!(list.subscriber_count(), 0);
    }

    #[test]
    fn absorb_moves_subscriptions() {
        let record: ObservableRecord<i32> = ObservableRecord::default();
        let mut a = BindingScope::new();
        let mut b = BindingScope::new();
        b.observe_record(&record, |_| {});
        a.absorb(b);
        assert_eq!(a.binding_count(), 1);
        assert_eq!(record.subscriber_count(), 1);
    }
}
