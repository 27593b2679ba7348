//! Warnings emitted by refused tree edits and failing listeners.

use std::sync::{Arc, Mutex};

use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use weft_dom::Document;

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
fn cyclic_insert_is_refused_with_a_warning() {
    let doc = Document::new();
    let outer = doc.create_element("div");
    let inner = doc.create_element("span");
    assert!(doc.append_child(outer, inner));

    let (accepted, targets) = warnings(|| doc.append_child(inner, outer));

    assert!(!accepted);
    assert_eq!(doc.parent(outer), None);
    assert_eq!(targets, vec!["weft_dom::document".to_owned()]);
}

fn explode(_: &weft_dom::Event) {
    panic!("listener failure");
}

#[test]
fn panicking_listener_warns() {
    let doc = Document::new();
    let button = doc.create_element("button");
    let _id = doc.add_listener(
        button,
        "click",
        std::rc::Rc::new(explode),
        weft_dom::ListenerFlags::empty(),
    );

    let (_, targets) = warnings(|| doc.dispatch(button, "click"));

    assert_eq!(targets, vec!["weft_dom::event".to_owned()]);
}
