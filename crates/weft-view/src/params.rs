#![forbid(unsafe_code)]

//! Parameter bags for descriptors.
//!
//! [`Params`] has one optional field per concern instead of an open-ended
//! record. Which concerns are present is summarized by [`Capabilities`].

use std::collections::BTreeMap;
use std::rc::Rc;

use weft_dom::{Event, Handler, ListenerFlags, NodeId};
use weft_reactive::{ObservableRecord, Value};

use crate::root::RenderRoot;

/// An extension hook run on the realized node after attribute-like
/// concerns and before listeners.
pub type Mixin = Rc<dyn Fn(&RenderRoot, NodeId)>;

/// Source for one concern: written once, or kept in sync.
#[derive(Clone, Debug)]
pub enum Bag {
    Plain(BTreeMap<String, Value>),
    Live(ObservableRecord<Value>),
}

impl Bag {
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    /// Current entries, sorted by key.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Value)> {
        match self {
            Self::Plain(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Self::Live(record) => record.entries(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Self::Plain(map) => map.get(key).cloned(),
            Self::Live(record) => record.get(key),
        }
    }
}

impl Default for Bag {
    fn default() -> Self {
        Self::Plain(BTreeMap::new())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Bag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Plain(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Bag {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for Bag {
    fn from(entries: Vec<(K, V)>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<BTreeMap<String, Value>> for Bag {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Plain(map)
    }
}

impl From<ObservableRecord<Value>> for Bag {
    fn from(record: ObservableRecord<Value>) -> Self {
        Self::Live(record)
    }
}

/// One listener with its options.
#[derive(Clone)]
pub struct Listener {
    pub handler: Handler,
    pub flags: ListenerFlags,
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// The listeners registered for one event name. A bare closure converts
/// into a one-element set.
#[derive(Clone, Debug, Default)]
pub struct Handlers(Vec<Listener>);

impl Handlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, handler: impl Fn(&Event) + 'static, flags: ListenerFlags) -> Self {
        self.push(handler, flags);
        self
    }

    pub fn push(&mut self, handler: impl Fn(&Event) + 'static, flags: ListenerFlags) {
        self.0.push(Listener {
            handler: Rc::new(handler),
            flags,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Listener> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<F: Fn(&Event) + 'static> From<F> for Handlers {
    fn from(handler: F) -> Self {
        Self::new().with(handler, ListenerFlags::empty())
    }
}

bitflags::bitflags! {
    /// Which concerns a [`Params`] carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u16 {
        const ATTRS       = 1 << 0;
        const STYLE       = 1 << 1;
        const FRAME_STYLE = 1 << 2;
        const CLASS_LIST  = 1 << 3;
        const PROPS       = 1 << 4;
        const DATASET     = 1 << 5;
        const ARIA        = 1 << 6;
        const MIXINS      = 1 << 7;
        const EVENTS      = 1 << 8;
    }
}

/// Per-concern configuration of a descriptor.
#[derive(Clone, Default)]
pub struct Params {
    pub attrs: Option<Bag>,
    pub style: Option<Bag>,
    /// Stage style writes and commit them on the next frame.
    pub style_on_frame: bool,
    pub class_list: Option<Bag>,
    pub props: Option<Bag>,
    pub dataset: Option<Bag>,
    pub aria: Option<Bag>,
    pub mixins: Vec<Mixin>,
    pub on: Vec<(String, Handlers)>,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn attrs(mut self, bag: impl Into<Bag>) -> Self {
        self.attrs = Some(bag.into());
        self
    }

    #[must_use]
    pub fn style(mut self, bag: impl Into<Bag>) -> Self {
        self.style = Some(bag.into());
        self
    }

    /// Style bag whose writes are committed once per frame.
    #[must_use]
    pub fn frame_style(mut self, bag: impl Into<Bag>) -> Self {
        self.style = Some(bag.into());
        self.style_on_frame = true;
        self
    }

    #[must_use]
    pub fn class_list(mut self, bag: impl Into<Bag>) -> Self {
        self.class_list = Some(bag.into());
        self
    }

    #[must_use]
    pub fn props(mut self, bag: impl Into<Bag>) -> Self {
        self.props = Some(bag.into());
        self
    }

    #[must_use]
    pub fn dataset(mut self, bag: impl Into<Bag>) -> Self {
        self.dataset = Some(bag.into());
        self
    }

    #[must_use]
    pub fn aria(mut self, bag: impl Into<Bag>) -> Self {
        self.aria = Some(bag.into());
        self
    }

    #[must_use]
    pub fn mixin(mut self, mixin: impl Fn(&RenderRoot, NodeId) + 'static) -> Self {
        self.mixins.push(Rc::new(mixin));
        self
    }

    #[must_use]
    pub fn on(mut self, event: impl Into<String>, handlers: impl Into<Handlers>) -> Self {
        self.on.push((event.into(), handlers.into()));
        self
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::empty();
        caps.set(Capabilities::ATTRS, self.attrs.is_some());
        caps.set(Capabilities::STYLE, self.style.is_some());
        caps.set(
            Capabilities::FRAME_STYLE,
            self.style.is_some() && self.style_on_frame,
        );
        caps.set(Capabilities::CLASS_LIST, self.class_list.is_some());
        caps.set(Capabilities::PROPS, self.props.is_some());
        caps.set(Capabilities::DATASET, self.dataset.is_some());
        caps.set(Capabilities::ARIA, self.aria.is_some());
        caps.set(Capabilities::MIXINS, !self.mixins.is_empty());
        caps.set(Capabilities::EVENTS, !self.on.is_empty());
        caps
    }
}

impl std::fmt::Debug for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Params")
            .field("capabilities", &self.capabilities())
            .field("attrs", &self.attrs)
            .field("style", &self.style)
            .field("class_list", &self.class_list)
            .field("props", &self.props)
            .field("dataset", &self.dataset)
            .field("aria", &self.aria)
            .field("mixins", &self.mixins.len())
            .field("on", &self.on)
            .finish()
    }
}
