#![forbid(unsafe_code)]

//! One-shot broadcast.
//!
//! A [`OneShot<T>`] behaves like a promise observable by many listeners: the
//! first [`emit`](OneShot::emit) stores the value and calls every pending
//! listener once; listeners added afterwards are called immediately with the
//! stored value. After emission the listener list is empty forever.
//!
//! # Failure Modes
//!
//! - Emitting twice: second call returns `false`, no listener runs.
//! - Listener panics: propagates to the emitter; listeners after it in the
//!   batch do not run, but the value is already stored.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::Subscription;

type Listener<T> = Box<dyn FnOnce(&T)>;

struct OneShotInner<T> {
    value: Option<Rc<T>>,
    listeners: Vec<(u64, Listener<T>)>,
    next_id: u64,
}

/// A value published at most once to any number of listeners.
pub struct OneShot<T> {
    inner: Rc<RefCell<OneShotInner<T>>>,
}

impl<T> Clone for OneShot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for OneShot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for OneShot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("OneShot")
            .field("complete", &inner.value.is_some())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl<T> OneShot<T> {
    /// Create a pending one-shot.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(OneShotInner {
                value: None,
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Whether the value has been published.
    pub fn is_complete(&self) -> bool {
        self.inner.borrow().value.is_some()
    }

    /// The published value, if any.
    pub fn value(&self) -> Option<Rc<T>> {
        self.inner.borrow().value.clone()
    }

    /// Number of listeners still waiting.
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

impl<T: 'static> OneShot<T> {
    /// Register `f` to run with the value.
    ///
    /// If the value was already published, `f` runs before this returns and
    /// the returned subscription is inert.
    pub fn subscribe(&self, f: impl FnOnce(&T) + 'static) -> Subscription {
        let existing = self.inner.borrow().value.clone();
        if let Some(value) = existing {
            f(&value);
            return Subscription::inert();
        }

        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push((id, Box::new(f)));
            id
        };
        let weak: Weak<RefCell<OneShotInner<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().listeners.retain(|(lid, _)| *lid != id);
            }
        })
    }

    /// Publish `value`. Returns `false` (and drops `value`) if already published.
    pub fn emit(&self, value: T) -> bool {
        let (value, listeners) = {
            let mut inner = self.inner.borrow_mut();
            if inner.value.is_some() {
                return false;
            }
            let value = Rc::new(value);
            inner.value = Some(Rc::clone(&value));
            (value, std::mem::take(&mut inner.listeners))
        };
        for (_, listener) in listeners {
            listener(&value);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn emits_exactly_once() {
        let once = OneShot::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = once.subscribe(move |v: &i32| s.borrow_mut().push(*v));

        assert!(once.emit(1));
        assert!(!once.emit(2));
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(once.value().as_deref(), Some(&1));
        assert_eq!(once.listener_count(), 0);
    }

    #[test]
    fn late_subscriber_is_replayed() {
        let once = OneShot::new();
        once.emit("done");
        let hit = Rc::new(Cell::new(false));
        let h = Rc::clone(&hit);
        once.subscribe(move |v: &&str| {
            assert_eq!(*v, "done");
            h.set(true);
        })
        .detach();
        assert!(hit.get());
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let once = OneShot::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (Rc::clone(&order), Rc::clone(&order));
        once.subscribe(move |_: &()| a.borrow_mut().push("a")).detach();
        once.subscribe(move |_: &()| b.borrow_mut().push("b")).detach();
        once.emit(());
        assert_eq!(*order.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn dropped_subscription_is_not_called() {
        let once = OneShot::new();
        let hit = Rc::new(Cell::new(false));
        let h = Rc::clone(&hit);
        let sub = once.subscribe(move |_: &u8| h.set(true));
        drop(sub);
        once.emit(7);
        assert!(!hit.get());
    }

    #[test]
    fn listener_may_subscribe_reentrantly() {
        let once: OneShot<u8> = OneShot::new();
        let hits = Rc::new(Cell::new(0));
        let (o, h) = (once.clone(), Rc::clone(&hits));
        once.subscribe(move |_| {
            h.set(h.get() + 1);
            let h2 = Rc::clone(&h);
            o.subscribe(move |_| h2.set(h2.get() + 1)).detach();
        })
        .detach();
        once.emit(0);
        assert_eq!(hits.get(), 2);
    }
}
