//! Property-based invariant tests for observable containers.
//!
//! 1. Every subscriber receives the same op log (fan-out).
//! 2. `observe` replays current contents as pushes before any live op.
//! 3. The list always mirrors a plain `Vec` model under the same ops.
//! 4. Applying the delivered ops to a copy reproduces the list.
//! 5. Records mirror a `BTreeMap` model.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use proptest::prelude::*;
use weft_reactive::{ListOp, ObservableList, ObservableRecord, RecordOp, Subscription};

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Mutation {
    Push(u8),
    Pop,
    Splice(usize, usize, Vec<u8>),
    Set(usize, u8),
    Delete(usize),
    Track(usize),
}

fn mutation_strategy() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        any::<u8>().prop_map(Mutation::Push),
        Just(Mutation::Pop),
        (0usize..12, 0usize..4, proptest::collection::vec(any::<u8>(), 0..4))
            .prop_map(|(i, n, v)| Mutation::Splice(i, n, v)),
        (0usize..12, any::<u8>()).prop_map(|(i, v)| Mutation::Set(i, v)),
        (0usize..12).prop_map(Mutation::Delete),
        (0usize..12).prop_map(Mutation::Track),
    ]
}

fn apply(list: &ObservableList<u8>, model: &mut Vec<u8>, m: &Mutation) {
    match m {
        Mutation::Push(v) => {
            list.push(*v);
            model.push(*v);
        }
        Mutation::Pop => {
            assert_eq!(list.pop(), model.pop());
        }
        Mutation::Splice(i, n, v) => {
            list.splice(*i, *n, v.clone());
            let i = (*i).min(model.len());
            let end = i + (*n).min(model.len() - i);
            model.splice(i..end, v.iter().copied());
        }
        Mutation::Set(i, v) => {
            list.set(*i, *v);
            if *i < model.len() {
                model[*i] = *v;
            } else {
                model.push(*v);
            }
        }
        Mutation::Delete(i) => {
            list.delete(*i);
            if *i < model.len() {
                model.remove(*i);
            }
        }
        Mutation::Track(i) => {
            list.track(*i);
        }
    }
}

fn replay_op(target: &mut Vec<u8>, op: &ListOp<u8>) {
    match op {
        ListOp::Push(v) => target.push(*v),
        ListOp::Pop(_) => {
            target.pop();
        }
        ListOp::Splice {
            index,
            removed,
            inserted,
        } => {
            target.splice(*index..*index + removed.len(), inserted.iter().copied());
        }
        ListOp::Set { index, value } => {
            if *index < target.len() {
                target[*index] = *value;
            } else {
                target.push(*value);
            }
        }
        ListOp::Delete { index, .. } => {
            target.remove(*index);
        }
        ListOp::Get { .. } => {}
    }
}

fn recorder(list: &ObservableList<u8>) -> (Rc<RefCell<Vec<ListOp<u8>>>>, Subscription) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let sub = list.observe(move |op| sink.borrow_mut().push(op.clone()));
    (log, sub)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Fan-out correctness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn all_subscribers_see_identical_logs(
        ops in proptest::collection::vec(mutation_strategy(), 0..40),
        subscribers in 2usize..5,
    ) {
        let list = ObservableList::new(Vec::new());
        let mut model = Vec::new();
        let recorders: Vec<_> = (0..subscribers).map(|_| recorder(&list)).collect();
        for m in &ops {
            apply(&list, &mut model, m);
        }
        let first = recorders[0].0.borrow().clone();
        for (log, _) in &recorders[1..] {
            prop_assert_eq!(&*log.borrow(), &first);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Replay correctness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn observe_replays_contents_as_pushes(items in proptest::collection::vec(any::<u8>(), 0..16)) {
        let list = ObservableList::new(items.clone());
        let (_early, _early_sub) = recorder(&list);
        let (log, _sub) = recorder(&list);
        let expected: Vec<_> = items.into_iter().map(ListOp::Push).collect();
        prop_assert_eq!(&*log.borrow(), &expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3 + 4. Model agreement and op-log reconstruction
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn list_mirrors_vec_model(
        initial in proptest::collection::vec(any::<u8>(), 0..8),
        ops in proptest::collection::vec(mutation_strategy(), 0..60),
    ) {
        let list = ObservableList::new(initial.clone());
        let mut model = initial;
        let (log, _sub) = recorder(&list);
        for m in &ops {
            apply(&list, &mut model, m);
            prop_assert_eq!(list.to_vec(), model.clone());
        }

        let mut rebuilt = Vec::new();
        for op in log.borrow().iter() {
            replay_op(&mut rebuilt, op);
        }
        prop_assert_eq!(rebuilt, model);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Records mirror a BTreeMap model
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn record_mirrors_map_model(
        ops in proptest::collection::vec((0u8..6, proptest::option::of(any::<u8>())), 0..40),
    ) {
        let record: ObservableRecord<u8> = ObservableRecord::default();
        let mut model = BTreeMap::new();
        let rebuilt = Rc::new(RefCell::new(BTreeMap::new()));
        let sink = Rc::clone(&rebuilt);
        let _sub = record.observe(move |op| match op {
            RecordOp::Set { key, value } => {
                sink.borrow_mut().insert(key.clone(), *value);
            }
            RecordOp::Delete { key, .. } => {
                sink.borrow_mut().remove(key);
            }
            RecordOp::Get { .. } => {}
        });
        for (k, v) in ops {
            let key = format!("k{k}");
            match v {
                Some(v) => {
                    record.set(key.clone(), v);
                    model.insert(key, v);
                }
                None => {
                    prop_assert_eq!(record.delete(&key), model.remove(&key));
                }
            }
        }
        prop_assert_eq!(&*rebuilt.borrow(), &model);
        prop_assert_eq!(record.len(), model.len());
    }
}
