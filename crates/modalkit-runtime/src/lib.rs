#![forbid(unsafe_code)]

//! Single-threaded runtime pieces for modalkit.
//!
//! - [`scheduler`]: animation-frame callbacks and timers on a virtual clock.
//! - [`reactive`]: one-shot and multi-shot notifications with RAII
//!   subscriptions.
//!
//! Everything here is `!Send`: the overlay layer runs on one event loop and
//! all suspension points are explicit scheduler callbacks.

pub mod reactive;
pub mod scheduler;

pub use reactive::{Notifier, OneShot, Subscription};
pub use scheduler::{Scheduler, TaskId};
