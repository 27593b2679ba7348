#![forbid(unsafe_code)]

//! In-memory node tree with DOM semantics.
//!
//! A [`Document`] owns every node; callers hold [`NodeId`] handles. The
//! tree supports elements, text, comments and transparent fragments,
//! attributes (with class-list and dataset helpers), inline styles, typed
//! properties, listeners with capture/target/bubble dispatch, attribute
//! mutation observation, and HTML serialization.
//!
//! Every write is recorded in an edit journal ([`DomEdit`]) so callers can
//! check that an update touched only what it had to.

pub mod document;
pub mod edit;
pub mod event;
pub mod html;
pub mod mutation;
pub mod node;

pub use document::{Document, WeakDocument};
pub use edit::DomEdit;
pub use event::{Event, EventPhase, Handler, ListenerFlags, ListenerId};
pub use mutation::AttrMutation;
pub use node::{NodeId, NodeKind, PropValue, aria_attribute_name, data_attribute_name};
