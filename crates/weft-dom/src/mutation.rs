#![forbid(unsafe_code)]

//! Attribute mutation observation.
//!
//! Observers registered with [`Document::observe_attributes`] receive one
//! [`AttrMutation`] per attribute write on the observed node. Records are
//! queued, not delivered inline: with a scheduler installed, a microtask
//! delivers them; otherwise they wait for
//! [`Document::deliver_mutations`].
//!
//! Records are only queued for nodes that have at least one observer.

use std::rc::{Rc, Weak};

use ahash::AHashMap;
use weft_reactive::Subscription;

use crate::document::Document;
use crate::node::NodeId;

/// One attribute write, as seen by an observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrMutation {
    pub target: NodeId,
    pub name: String,
    /// The value before the write (`None` if the attribute was absent).
    pub old_value: Option<String>,
}

pub(crate) struct AttrObserver(Box<dyn Fn(&AttrMutation)>);

#[derive(Default)]
pub(crate) struct MutationQueue {
    observers: AHashMap<NodeId, Vec<Weak<AttrObserver>>>,
    pending: Vec<AttrMutation>,
    scheduled: bool,
}

impl MutationQueue {
    fn is_observed(&mut self, target: NodeId) -> bool {
        let Some(list) = self.observers.get_mut(&target) else {
            return false;
        };
        list.retain(|w| w.strong_count() > 0);
        if list.is_empty() {
            self.observers.remove(&target);
            return false;
        }
        true
    }

    fn observers_for(&self, target: NodeId) -> Vec<Rc<AttrObserver>> {
        self.observers
            .get(&target)
            .map(|list| list.iter().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }
}

impl Document {
    /// Watch attribute writes on `node`. Dropping the guard stops delivery.
    pub fn observe_attributes(
        &self,
        node: NodeId,
        callback: impl Fn(&AttrMutation) + 'static,
    ) -> Subscription {
        let observer = Rc::new(AttrObserver(Box::new(callback)));
        self.inner
            .borrow_mut()
            .mutations
            .observers
            .entry(node)
            .or_default()
            .push(Rc::downgrade(&observer));
        Subscription::hold(observer)
    }

    /// Number of records waiting for delivery.
    #[must_use]
    pub fn pending_mutations(&self) -> usize {
        self.inner.borrow().mutations.pending.len()
    }

    /// Deliver every queued record now. Returns the number of records.
    pub fn deliver_mutations(&self) -> usize {
        let records = {
            let mut inner = self.inner.borrow_mut();
            inner.mutations.scheduled = false;
            std::mem::take(&mut inner.mutations.pending)
        };
        for record in &records {
            let observers = self.inner.borrow().mutations.observers_for(record.target);
            for observer in observers {
                (observer.0)(record);
            }
        }
        records.len()
    }

    pub(crate) fn queue_mutation(&self, target: NodeId, name: &str, old_value: Option<String>) {
        let scheduler = {
            let mut inner = self.inner.borrow_mut();
            if !inner.mutations.is_observed(target) {
                return;
            }
            inner.mutations.pending.push(AttrMutation {
                target,
                name: name.to_owned(),
                old_value,
            });
            if inner.mutations.scheduled {
                return;
            }
            let scheduler = inner.scheduler.clone();
            inner.mutations.scheduled = scheduler.is_some();
            scheduler
        };
        if let Some(scheduler) = scheduler {
            let weak = self.downgrade();
            scheduler.schedule_microtask(Box::new(move || {
                if let Some(doc) = weak.upgrade() {
                    doc.deliver_mutations();
                }
            }));
        }
    }
}
