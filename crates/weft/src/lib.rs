#![forbid(unsafe_code)]

//! weft public facade.
//!
//! Re-exports the three layers and a prelude:
//!
//! - [`reactive`]: observable scalars, lists and records, binding scopes,
//!   the two-phase scheduler.
//! - [`dom`]: the in-memory node tree.
//! - [`view`]: descriptors, reflectors, reconciliation, templates.
//!
//! ```ignore
//! use weft::prelude::*;
//!
//! let root = RenderRoot::new();
//! let items: ObservableList<Child> = ObservableList::default();
//! let list = El::new("ul.todo").children(items.clone());
//! root.mount(Some(root.document().body()), list)?;
//! items.push(El::new("li").child("write docs").into());
//! root.flush();
//! ```

pub use weft_dom as dom;
pub use weft_reactive as reactive;
pub use weft_view as view;

pub use weft_view::html;

pub mod prelude {
    pub use weft_dom::{Document, Event, ListenerFlags, NodeId};
    pub use weft_reactive::{
        BindingScope, ListOp, Observable, ObservableList, ObservableRecord, RecordOp, Scheduler,
        Subscription, Value,
    };
    pub use weft_view::{
        Bag, Child, El, Handlers, Mapped, Params, Part, RenderConfig, RenderRoot, Switched,
        ViewError, compile, html,
    };
}
