#![forbid(unsafe_code)]

//! Reflectors: keep one concern of a node in sync with a [`Bag`].
//!
//! Every concern (attributes, style, class list, properties, dataset, ARIA)
//! goes through the same pipeline:
//!
//! 1. a plain bag is written once, a live bag is observed (with replay);
//! 2. a [`Value::Cell`] entry subscribes to the cell and writes its value;
//! 3. the value is coerced ([`Concern::coerce`]): remove, write or invalid;
//! 4. the write is skipped when the node already holds the coerced value.
//!
//! # Invariants
//!
//! - A write never happens when the node already holds the incoming value,
//!   so an echo from the reverse channel ends after one no-op comparison.
//! - Invalid values (containers) remove the key and log a warning; nothing
//!   here returns an error.
//! - A reflector that outlives its document writes nothing.
//!
//! # Two-way attributes
//!
//! With a live attribute bag and `two_way_attributes` enabled, an attribute
//! observer copies external changes back into the record. It writes only
//! when the record's coerced value differs from the node, so one external
//! change causes at most one record write and the resulting reflector pass
//! is a no-op.

mod concerns;

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use weft_dom::{AttrMutation, Document, NodeId, WeakDocument};
use weft_reactive::{FrameBatch, ObservableRecord, RecordOp, Subscription, Value};

pub(crate) use concerns::{Aria, Attr, Class, Dataset, Prop, Style};

use crate::params::{Bag, Capabilities, Handlers, Params};
use crate::root::RenderRoot;

/// Result of mapping a [`Value`] onto a concern.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Coerced<T> {
    Remove,
    Write(T),
    Invalid,
}

/// One node concern addressed by string keys.
pub(crate) trait Concern: 'static {
    type Out: Clone + PartialEq + 'static;
    const NAME: &'static str;

    /// Node-side name for a bag key.
    fn key_name(key: &str) -> String {
        key.to_owned()
    }

    fn coerce(value: &Value) -> Coerced<Self::Out>;
    fn read(doc: &Document, node: NodeId, name: &str) -> Option<Self::Out>;
    fn write(doc: &Document, node: NodeId, name: &str, value: &Self::Out);
    fn remove(doc: &Document, node: NodeId, name: &str);
}

struct ReflectCtx<C: Concern> {
    doc: WeakDocument,
    node: NodeId,
    cells: RefCell<AHashMap<String, Subscription>>,
    frame: Option<FrameBatch<Value>>,
    _concern: PhantomData<C>,
}

impl<C: Concern> ReflectCtx<C> {
    fn new(root: &RenderRoot, node: NodeId, on_frame: bool) -> Rc<Self> {
        let doc = root.document().downgrade();
        let scheduler = root.scheduler();
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let frame = on_frame.then(|| {
                let weak = weak.clone();
                FrameBatch::new(scheduler, move |key: &str, value: Value| {
                    if let Some(ctx) = weak.upgrade() {
                        ctx.commit(key, &value);
                    }
                })
            });
            Self {
                doc,
                node,
                cells: RefCell::new(AHashMap::new()),
                frame,
                _concern: PhantomData,
            }
        })
    }

    /// Route one bag entry, following cells.
    fn apply(self: &Rc<Self>, key: &str, value: &Value) {
        // A new value for the key replaces any cell it was bound to.
        let previous = self.cells.borrow_mut().remove(key);
        drop(previous);

        if let Value::Cell(cell) = value {
            let weak = Rc::downgrade(self);
            let owned = key.to_owned();
            let sub = cell.subscribe(move |next: &Value| {
                if let Some(ctx) = weak.upgrade() {
                    ctx.stage(&owned, &next.resolved());
                }
            });
            self.cells.borrow_mut().insert(key.to_owned(), sub);
            self.stage(key, &value.resolved());
        } else {
            self.stage(key, value);
        }
    }

    fn stage(&self, key: &str, value: &Value) {
        match &self.frame {
            Some(batch) => batch.stage(key, value.clone()),
            None => self.commit(key, value),
        }
    }

    fn commit(&self, key: &str, value: &Value) {
        let Some(doc) = self.doc.upgrade() else {
            return;
        };
        if !doc.exists(self.node) {
            return;
        }
        let name = C::key_name(key);
        match C::coerce(value) {
            Coerced::Write(out) => {
                if C::read(&doc, self.node, &name).as_ref() != Some(&out) {
                    C::write(&doc, self.node, &name, &out);
                }
            }
            Coerced::Remove => {
                if C::read(&doc, self.node, &name).is_some() {
                    C::remove(&doc, self.node, &name);
                }
            }
            Coerced::Invalid => {
                tracing::warn!(
                    target: "weft_view::reflect",
                    concern = C::NAME,
                    key,
                    kind = value.kind(),
                    node = %self.node,
                    "invalid binding value; removing key"
                );
                if C::read(&doc, self.node, &name).is_some() {
                    C::remove(&doc, self.node, &name);
                }
            }
        }
    }
}

fn reflect<C: Concern>(root: &RenderRoot, node: NodeId, bag: &Bag, on_frame: bool) {
    let ctx = ReflectCtx::<C>::new(root, node, on_frame);
    match bag {
        Bag::Plain(map) => {
            for (key, value) in map {
                ctx.apply(key, value);
            }
        }
        Bag::Live(record) => {
            let held = Rc::clone(&ctx);
            let sub = record.observe(move |op: &RecordOp<Value>| match op {
                RecordOp::Set { key, value } => held.apply(key, value),
                RecordOp::Delete { key, .. } => held.apply(key, &Value::Null),
                RecordOp::Get { .. } => {}
            });
            root.hold(node, sub);
        }
    }
    root.hold(node, Subscription::hold(ctx));
}

/// Write (or bind) attributes from `bag`.
pub fn reflect_attrs(root: &RenderRoot, node: NodeId, bag: &Bag) {
    reflect::<Attr>(root, node, bag, false);
}

/// Write (or bind) inline styles. With `on_frame`, writes are staged and
/// only the latest value per property is committed on the next frame.
pub fn reflect_style(root: &RenderRoot, node: NodeId, bag: &Bag, on_frame: bool) {
    reflect::<Style>(root, node, bag, on_frame);
}

/// Toggle classes named by the bag's keys.
pub fn reflect_class_list(root: &RenderRoot, node: NodeId, bag: &Bag) {
    reflect::<Class>(root, node, bag, false);
}

pub fn reflect_props(root: &RenderRoot, node: NodeId, bag: &Bag) {
    reflect::<Prop>(root, node, bag, false);
}

/// Keys are camelCase dataset names (`userId` -> `data-user-id`).
pub fn reflect_dataset(root: &RenderRoot, node: NodeId, bag: &Bag) {
    reflect::<Dataset>(root, node, bag, false);
}

pub fn reflect_aria(root: &RenderRoot, node: NodeId, bag: &Bag) {
    reflect::<Aria>(root, node, bag, false);
}

/// Attach every handler of every bucket entry as a listener.
pub fn reflect_events(root: &RenderRoot, node: NodeId, on: &[(String, Handlers)]) {
    let doc = root.document();
    for (event, handlers) in on {
        for listener in handlers.iter() {
            if doc
                .add_listener(node, event, Rc::clone(&listener.handler), listener.flags)
                .is_none()
            {
                tracing::debug!(
                    target: "weft_view::reflect",
                    event = event.as_str(),
                    node = %node,
                    "listener target is gone"
                );
            }
        }
    }
}

/// Apply every present concern of `params` in the fixed order: attributes,
/// style, class list, properties, dataset, ARIA, mixins, events.
pub(crate) fn apply_params(root: &RenderRoot, node: NodeId, params: &Params) {
    let caps = params.capabilities();
    if let Some(bag) = &params.attrs {
        reflect_attrs(root, node, bag);
        if let Bag::Live(record) = bag {
            if root.config().two_way_attributes {
                bind_two_way(root, node, record, caps);
            }
        }
    }
    if let Some(bag) = &params.style {
        reflect_style(root, node, bag, params.style_on_frame);
    }
    if let Some(bag) = &params.class_list {
        reflect_class_list(root, node, bag);
    }
    if let Some(bag) = &params.props {
        reflect_props(root, node, bag);
    }
    if let Some(bag) = &params.dataset {
        reflect_dataset(root, node, bag);
    }
    if let Some(bag) = &params.aria {
        reflect_aria(root, node, bag);
    }
    for mixin in &params.mixins {
        mixin(root, node);
    }
    if !params.on.is_empty() {
        reflect_events(root, node, &params.on);
    }
}

/// Attribute names owned by another concern on the same node.
fn owned_elsewhere(name: &str, caps: Capabilities) -> bool {
    (name == "class" && caps.contains(Capabilities::CLASS_LIST))
        || (name == "style" && caps.contains(Capabilities::STYLE))
        || (name.starts_with("data-") && caps.contains(Capabilities::DATASET))
        || (name.starts_with("aria-") && caps.contains(Capabilities::ARIA))
}

/// What the node should show for a record entry, in attribute terms.
fn expected_attribute(value: Option<&Value>) -> Option<String> {
    match value.map(Value::resolved) {
        Some(v) => match Attr::coerce(&v) {
            Coerced::Write(s) => Some(s),
            Coerced::Remove | Coerced::Invalid => None,
        },
        None => None,
    }
}

fn bind_two_way(
    root: &RenderRoot,
    node: NodeId,
    record: &ObservableRecord<Value>,
    caps: Capabilities,
) {
    let doc = root.document().downgrade();
    let record = record.clone();
    let sub = root
        .document()
        .observe_attributes(node, move |mutation: &AttrMutation| {
            if owned_elsewhere(&mutation.name, caps) {
                return;
            }
            let Some(doc) = doc.upgrade() else {
                return;
            };
            let current = doc.attribute(mutation.target, &mutation.name);
            let entry = record.get(&mutation.name);
            if expected_attribute(entry.as_ref()) == current {
                return;
            }
            tracing::trace!(
                target: "weft_view::reflect",
                name = mutation.name.as_str(),
                node = %mutation.target,
                "external attribute change copied into record"
            );
            match (entry, current) {
                // A cell-bound entry is updated through its cell.
                (Some(Value::Cell(cell)), current) => {
                    cell.set(current.map_or(Value::Null, Value::Text));
                }
                (_, Some(text)) => record.set(mutation.name.clone(), Value::Text(text)),
                (_, None) => {
                    record.delete(&mutation.name);
                }
            }
        });
    root.hold(node, sub);
}
