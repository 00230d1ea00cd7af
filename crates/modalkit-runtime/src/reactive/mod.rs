#![forbid(unsafe_code)]

//! Push-based notifications for overlay lifecycles.
//!
//! - [`OneShot`]: a value published at most once and fanned out to every
//!   current subscriber, and replayed to every later one.
//! - [`Notifier`]: a multi-shot broadcast that delivers each value to the
//!   subscribers registered at the time of the call.
//! - [`Subscription`]: RAII guard that unsubscribes on drop (or stays
//!   registered for the source's lifetime after [`Subscription::detach`]).
//!
//! # Architecture
//!
//! Both sources use `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Listener lists are moved or cloned out of the cell before any callback
//! runs, so a callback may subscribe, unsubscribe or publish re-entrantly.
//!
//! # Invariants
//!
//! 1. A `OneShot` publishes exactly once; later `emit` calls return `false`
//!    and notify nobody.
//! 2. Subscribers are notified in registration order.
//! 3. Subscribing to a completed `OneShot` runs the callback immediately.
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification.

pub mod notifier;
pub mod once;

pub use notifier::Notifier;
pub use once::OneShot;

/// Handle to a registered callback. Unsubscribes when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately; call detach() to keep it"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A subscription with nothing to undo.
    pub(crate) fn inert() -> Self {
        Self { unsubscribe: None }
    }

    /// Keep the callback registered for as long as the source lives.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }

    /// Unsubscribe now.
    pub fn cancel(mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
