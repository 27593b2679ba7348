#![forbid(unsafe_code)]

//! Descriptors, reflectors, child-list reconciliation and tagged templates.
//!
//! A [`RenderRoot`] owns a [`weft_dom::Document`] and realizes [`El`]
//! descriptors into it. Parameter bags ([`Params`]) are written through
//! reflectors and stay bound when they are live records; child lists are
//! kept in sync by a [`Reconciler`]; [`Mapped`] projects a data list and
//! [`Switched`] shows one child of many. [`compile`] / [`html!`] turn
//! markup with interpolated values into a realized subtree.

pub mod child;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod mapped;
pub mod params;
pub mod reconcile;
pub mod reflect;
pub mod root;
pub mod selector;
pub mod switched;
pub mod template;

pub use child::Child;
pub use config::RenderConfig;
pub use descriptor::{Children, El, Selector, ViewId};
pub use error::{ConfigError, ViewError};
pub use mapped::{Mapped, Projection};
pub use params::{Bag, Capabilities, Handlers, Listener, Mixin, Params};
pub use reconcile::{EditQueue, Reconciler, Replacement, compute_queue};
pub use reflect::{
    reflect_aria, reflect_attrs, reflect_class_list, reflect_dataset, reflect_events,
    reflect_props, reflect_style,
};
pub use root::{RenderRoot, WeakRoot};
pub use selector::{SelectorSpec, parse_selector};
pub use switched::Switched;
pub use template::{Part, compile};
