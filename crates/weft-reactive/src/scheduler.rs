#![forbid(unsafe_code)]

//! Two-phase scheduling: microtasks and frames.
//!
//! Nothing in the toolkit talks to a real event loop. Deferred work goes
//! through the [`Scheduler`] trait, and [`ManualScheduler`] lets the host (or
//! a test) decide exactly when each phase runs.
//!
//! - **Microtasks** run at the end of the current reactive propagation:
//!   child-list flushes and attribute mutation delivery.
//! - **Frames** run once per rendered frame: staged style writes
//!   ([`FrameBatch`]).
//!
//! # Invariants
//!
//! 1. Tasks in one phase run in FIFO order.
//! 2. A microtask scheduled while microtasks are running runs in the same
//!    `run_microtasks` call (next round), up to the round limit.
//! 3. A frame task scheduled during a frame runs on the *next* frame.
//! 4. `run_frame` drains microtasks after the frame tasks.
//!
//! # Failure Modes
//!
//! - A microtask chain that keeps rescheduling itself is cut off after
//!   `max_rounds` rounds; the remainder stays queued and a warning is logged.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

/// Default bound on microtask rounds per `run_microtasks` call.
pub const DEFAULT_MAX_MICROTASK_ROUNDS: usize = 64;

/// Where deferred work is queued.
pub trait Scheduler {
    fn schedule_microtask(&self, task: Task);
    fn schedule_frame(&self, task: Task);
}

/// A scheduler that only runs work when asked to.
pub struct ManualScheduler {
    microtasks: RefCell<VecDeque<Task>>,
    frames: RefCell<VecDeque<Task>>,
    max_rounds: Cell<usize>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            microtasks: RefCell::new(VecDeque::new()),
            frames: RefCell::new(VecDeque::new()),
            max_rounds: Cell::new(DEFAULT_MAX_MICROTASK_ROUNDS),
        }
    }

    #[must_use]
    pub fn with_max_rounds(self, rounds: usize) -> Self {
        self.max_rounds.set(rounds.max(1));
        self
    }

    pub fn set_max_rounds(&self, rounds: usize) {
        self.max_rounds.set(rounds.max(1));
    }

    /// Run queued microtasks, including ones they schedule, until the queue
    /// is empty or the round limit is reached. Returns the number run.
    pub fn run_microtasks(&self) -> usize {
        let mut ran = 0;
        for _ in 0..self.max_rounds.get() {
            let round: Vec<Task> = self.microtasks.borrow_mut().drain(..).collect();
            if round.is_empty() {
                return ran;
            }
            for task in round {
                task();
                ran += 1;
            }
        }
        let left = self.pending_microtasks();
        if left > 0 {
            tracing::warn!(
                target: "weft_reactive::scheduler",
                rounds = self.max_rounds.get(),
                left,
                "microtask round limit reached; remaining tasks stay queued"
            );
        }
        ran
    }

    /// Run the frame tasks queued so far, then drain microtasks.
    pub fn run_frame(&self) -> usize {
        let frame: Vec<Task> = self.frames.borrow_mut().drain(..).collect();
        let mut ran = frame.len();
        for task in frame {
            task();
        }
        ran += self.run_microtasks();
        ran
    }

    #[must_use]
    pub fn pending_microtasks(&self) -> usize {
        self.microtasks.borrow().len()
    }

    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending_microtasks() == 0 && self.pending_frames() == 0
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_microtask(&self, task: Task) {
        self.microtasks.borrow_mut().push_back(task);
    }

    fn schedule_frame(&self, task: Task) {
        self.frames.borrow_mut().push_back(task);
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending_microtasks", &self.pending_microtasks())
            .field("pending_frames", &self.pending_frames())
            .field("max_rounds", &self.max_rounds.get())
            .finish()
    }
}

/// Shared cancellation flag for a queued batch.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct Staged<T> {
    entries: Vec<(String, T)>,
    scheduled: bool,
}

/// Keyed writes committed on the next frame, latest value per key.
///
/// Intermediate values staged for a key between two frames are dropped.
/// Commit order follows the order in which keys were first staged.
pub struct FrameBatch<T> {
    staged: Rc<RefCell<Staged<T>>>,
    commit: Rc<dyn Fn(&str, T)>,
    scheduler: Rc<dyn Scheduler>,
}

impl<T: 'static> FrameBatch<T> {
    pub fn new(scheduler: Rc<dyn Scheduler>, commit: impl Fn(&str, T) + 'static) -> Self {
        Self {
            staged: Rc::new(RefCell::new(Staged {
                entries: Vec::new(),
                scheduled: false,
            })),
            commit: Rc::new(commit),
            scheduler,
        }
    }

    /// Stage `value` for `key`, replacing anything staged earlier.
    pub fn stage(&self, key: &str, value: T) {
        let needs_frame = {
            let mut staged = self.staged.borrow_mut();
            match staged.entries.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value,
                None => staged.entries.push((key.to_owned(), value)),
            }
            !std::mem::replace(&mut staged.scheduled, true)
        };
        if needs_frame {
            let staged: Weak<RefCell<Staged<T>>> = Rc::downgrade(&self.staged);
            let commit = Rc::clone(&self.commit);
            self.scheduler
                .schedule_frame(Box::new(move || commit_staged(&staged, &*commit)));
        }
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.staged.borrow().entries.len()
    }
}

fn commit_staged<T>(staged: &Weak<RefCell<Staged<T>>>, commit: &dyn Fn(&str, T)) {
    let Some(staged) = staged.upgrade() else {
        return;
    };
    let entries = {
        let mut staged = staged.borrow_mut();
        staged.scheduled = false;
        std::mem::take(&mut staged.entries)
    };
    tracing::trace!(
        target: "weft_reactive::scheduler",
        writes = entries.len(),
        "committing frame batch"
    );
    for (key, value) in entries {
        commit(&key, value);
    }
}

impl<T> std::fmt::Debug for FrameBatch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let staged = self.staged.borrow();
        f.debug_struct("FrameBatch")
            .field("pending", &staged.entries.len())
            .field("scheduled", &staged.scheduled)
            .finish()
    }
}
