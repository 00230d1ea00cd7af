#![forbid(unsafe_code)]

//! Multi-shot broadcast.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::Subscription;

type Listener<T> = Rc<dyn Fn(&T)>;

struct NotifierInner<T> {
    listeners: Vec<(u64, Listener<T>)>,
    next_id: u64,
    closed: bool,
}

/// Broadcasts every published value to the current subscribers.
///
/// Once [`close`](Notifier::close)d, the notifier drops its listeners and
/// ignores further notifications and subscriptions.
pub struct Notifier<T> {
    inner: Rc<RefCell<NotifierInner<T>>>,
}

impl<T> Clone for Notifier<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Notifier")
            .field("listeners", &inner.listeners.len())
            .field("closed", &inner.closed)
            .finish()
    }
}

impl<T> Notifier<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(NotifierInner {
                listeners: Vec::new(),
                next_id: 0,
                closed: false,
            })),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    /// Drop all listeners and stop accepting new ones.
    pub fn close(&self) {
        let dropped = {
            let mut inner = self.inner.borrow_mut();
            inner.closed = true;
            std::mem::take(&mut inner.listeners)
        };
        drop(dropped);
    }

    /// Deliver `value` to every subscriber. Returns how many were called.
    pub fn notify(&self, value: &T) -> usize {
        let listeners: Vec<Listener<T>> = {
            let inner = self.inner.borrow();
            if inner.closed {
                return 0;
            }
            inner.listeners.iter().map(|(_, l)| Rc::clone(l)).collect()
        };
        for listener in &listeners {
            listener(value);
        }
        listeners.len()
    }
}

impl<T: 'static> Notifier<T> {
    /// Register `f` for every subsequent notification.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                return Subscription::inert();
            }
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push((id, Rc::new(f)));
            id
        };
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().listeners.retain(|(lid, _)| *lid != id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn notifies_each_time() {
        let n = Notifier::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let _sub = n.subscribe(move |v: &u32| c.set(c.get() + *v));
        assert_eq!(n.notify(&2), 1);
        assert_eq!(n.notify(&3), 1);
        assert_eq!(count.get(), 5);
    }

    #[test]
    fn unsubscribe_on_drop() {
        let n: Notifier<()> = Notifier::new();
        let sub = n.subscribe(|_| {});
        assert_eq!(n.listener_count(), 1);
        drop(sub);
        assert_eq!(n.listener_count(), 0);
        assert_eq!(n.notify(&()), 0);
    }

    #[test]
    fn closed_notifier_is_silent() {
        let n: Notifier<()> = Notifier::new();
        let hit = Rc::new(Cell::new(false));
        let h = Rc::clone(&hit);
        n.subscribe(move |_| h.set(true)).detach();
        n.close();
        assert_eq!(n.notify(&()), 0);
        assert!(!hit.get());
        n.subscribe(|_| {}).detach();
        assert_eq!(n.listener_count(), 0);
    }
}
