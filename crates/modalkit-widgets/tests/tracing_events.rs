//! Structured log events emitted across a dialog's lifetime.
//!
//! Run with `--features tracing`.

#![cfg(feature = "tracing")]
#![forbid(unsafe_code)]

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use modalkit_core::{Document, Size};
use modalkit_runtime::Scheduler;
use modalkit_widgets::modal::{HostScope, ModalConfig, ModalHandle, ModalStack};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

// =============================================================================
// Capture layer
// =============================================================================

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<String>>>);

impl Capture {
    fn messages(&self) -> Vec<String> {
        self.0.lock().expect("capture lock").clone()
    }

    fn position(&self, message: &str) -> Option<usize> {
        self.messages().iter().position(|m| m == message)
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{value:?}");
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));
        self.0.lock().expect("capture lock").push(message);
    }
}

fn capture<T>(f: impl FnOnce() -> T) -> (Capture, T) {
    let cap = Capture::default();
    let subscriber = tracing_subscriber::registry().with(cap.clone());
    let out = tracing::subscriber::with_default(subscriber, f);
    (cap, out)
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn lifecycle_events_in_order() {
    let (cap, ()) = capture(|| {
        let doc = Document::new(Size::new(80, 24));
        let sched = Scheduler::new();
        let stack = ModalStack::new(doc, sched.clone());
        let h: ModalHandle<(), ()> = stack.open(|_: HostScope<(), ()>| (), ModalConfig::new());
        sched.run_frame();
        h.close(None);
        sched.advance(Duration::from_millis(300));
    });

    let order: Vec<usize> = [
        "scroll lock engaged",
        "modal container mounted",
        "focus trap activated",
        "modal open",
        "modal closing",
        "modal exiting",
        "modal stack entry removed",
        "scroll lock released",
        "modal destroyed",
    ]
    .iter()
    .map(|m| cap.position(m).unwrap_or_else(|| panic!("missing event {m:?}")))
    .collect();

    assert!(
        order.windows(2).all(|w| w[0] < w[1]),
        "out of order: {:?}",
        cap.messages()
    );
}

#[test]
fn repeated_close_is_traced_once() {
    let (cap, ()) = capture(|| {
        let stack = ModalStack::new(Document::new(Size::new(80, 24)), Scheduler::new());
        let h: ModalHandle<(), ()> = stack.open(|_: HostScope<(), ()>| (), ModalConfig::new());
        h.close(None);
        h.dismiss();
    });
    let msgs = cap.messages();
    assert_eq!(msgs.iter().filter(|m| *m == "modal closing").count(), 1);
    assert!(msgs.iter().any(|m| m == "close ignored, already closing"));
}

#[test]
fn inert_open_warns() {
    let (cap, ()) = capture(|| {
        let stack = ModalStack::new(Document::detached(), Scheduler::new());
        let _h: ModalHandle<(), ()> = stack.open(|_: HostScope<(), ()>| (), ModalConfig::new());
    });
    assert!(cap.position("document is not live; returning inert modal handle").is_some());
}
