#![forbid(unsafe_code)]

//! Reactive primitives for weft.
//!
//! - [`Observable`]: shared, version-tracked scalar with change notification.
//! - [`ObservableList`] / [`ObservableRecord`]: containers whose typed
//!   mutators deliver a [`ListOp`] / [`RecordOp`] after each change.
//! - [`Value`]: the dynamic value used by parameter bags and data lists,
//!   with nested containment.
//! - [`Subscription`] and [`BindingScope`]: RAII lifetime management.
//! - [`Scheduler`], [`ManualScheduler`], [`CancelToken`], [`FrameBatch`]:
//!   the two-phase (microtask / frame) scheduling interface.
//!
//! # Architecture
//!
//! Everything is single-threaded: shared state is `Rc<RefCell<..>>`, and
//! subscribers are held weakly by the source and strongly by the
//! [`Subscription`] guard. Notification is synchronous; deferral only happens
//! where a consumer explicitly goes through a [`Scheduler`].

pub mod binding;
pub mod list;
pub mod observable;
pub mod op;
pub mod record;
pub mod scheduler;
pub mod subscription;
pub mod value;

pub use binding::BindingScope;
pub use list::ObservableList;
pub use observable::Observable;
pub use op::{ListOp, OpTag, RecordOp};
pub use record::ObservableRecord;
pub use scheduler::{
    CancelToken, DEFAULT_MAX_MICROTASK_ROUNDS, FrameBatch, ManualScheduler, Scheduler, Task,
};
pub use subscription::Subscription;
pub use value::{Value, ValueKey, format_number};
