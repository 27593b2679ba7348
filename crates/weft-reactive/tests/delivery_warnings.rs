//! Warnings emitted while delivering notifications.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use weft_reactive::{ManualScheduler, Observable, Scheduler};

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct WarnCapture {
    targets: Arc<Mutex<Vec<String>>>,
}

impl<S: Subscriber> Layer<S> for WarnCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::WARN {
            self.targets
                .lock()
                .expect("capture lock")
                .push(event.metadata().target().to_owned());
        }
    }
}

fn warnings<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    let capture = WarnCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let out = tracing::subscriber::with_default(subscriber, f);
    let targets = capture.targets.lock().expect("capture lock").clone();
    (out, targets)
}

#[test]
fn panicking_subscriber_warns_and_delivery_continues() {
    let value = Observable::new(0);
    let seen = Rc::new(Cell::new(0));
    let sink = Rc::clone(&seen);
    let _bad = value.subscribe(|_| panic!("subscriber failure"));
    let _good = value.subscribe(move |v: &i32| sink.set(*v));

    let ((), targets) = warnings(|| value.set(3));

    assert_eq!(seen.get(), 3);
    assert_eq!(targets, vec!["weft_reactive::subscription".to_owned()]);
}

#[test]
fn round_limit_warns_and_keeps_the_rest_queued() {
    let scheduler = Rc::new(ManualScheduler::new().with_max_rounds(1));
    let again = Rc::clone(&scheduler);
    scheduler.schedule_microtask(Box::new(move || {
        again.schedule_microtask(Box::new(|| {}));
    }));

    let (ran, targets) = warnings(|| scheduler.run_microtasks());

    assert_eq!(ran, 1);
    assert_eq!(scheduler.pending_microtasks(), 1);
    assert_eq!(targets, vec!["weft_reactive::scheduler".to_owned()]);
}
