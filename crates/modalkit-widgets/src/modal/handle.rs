#![forbid(unsafe_code)]

//! Per-dialog control handle.
//!
//! A [`ModalHandle`] is what the opener and the hosted content share: the
//! dialog's id, its data payload, its resolved settings, and the close path.
//!
//! # Invariants
//!
//! 1. A handle closes at most once. The first `close`/`dismiss`/accepted
//!    backdrop or Escape wins; later calls return `false` and do nothing.
//! 2. On close the container's teardown callback runs strictly before any
//!    [`after_closed`](ModalHandle::after_closed) subscriber.
//! 3. The close notification is delivered exactly once to every subscriber,
//!    including those subscribing after the fact.
//! 4. Only one teardown callback can be registered.
//!
//! # Failure Modes
//!
//! - Handle from a non-live document: no container is attached, but close
//!   still notifies subscribers.
//! - Content instance dropped early: [`content_instance`](ModalHandle::content_instance)
//!   returns `None`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use modalkit_runtime::{Notifier, OneShot, Subscription};

use crate::modal::ModalSettings;
use crate::modal::host::{HostedContent, HostedInstance};

/// Global counter for unique modal IDs.
static MODAL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of an opened dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModalId(u64);

impl ModalId {
    fn next() -> Self {
        Self(MODAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "modal-{}", self.0)
    }
}

/// What closed a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// [`ModalHandle::close`], typically from a button in the content.
    Button,
    /// Click on the backdrop.
    Backdrop,
    /// Escape key.
    Escape,
    /// [`ModalHandle::dismiss`] or [`ModalStack::close_all`](crate::modal::ModalStack::close_all).
    Programmatic,
}

/// Payload of the close notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent<R> {
    pub result: Option<R>,
    pub reason: CloseReason,
}

/// Type-erased view of a handle, used where the payload types do not matter.
pub trait AnyModal {
    fn id(&self) -> ModalId;
    fn settings(&self) -> &ModalSettings;
    fn is_closing(&self) -> bool;
    /// Close with no result. Returns `false` if already closing.
    fn dismiss(&self) -> bool;
}

/// Shared type-erased handle.
pub type ModalRef = Rc<dyn AnyModal>;

pub(crate) type TeardownFn = Box<dyn FnOnce(CloseReason)>;

/// Close paths reserved for the container.
pub(crate) trait ModalCloser {
    /// Notify backdrop subscribers; close only if `close_on_backdrop`.
    fn close_by_backdrop(&self) -> bool;
    /// Close only if `close_on_escape`.
    fn close_by_escape(&self) -> bool;
    fn mark_opened(&self);
    /// Hook cleanup that must run before external subscribers.
    fn register_close_callback(&self, callback: TeardownFn) -> bool;
}

struct HandleState<D, R> {
    id: ModalId,
    data: Rc<D>,
    settings: ModalSettings,
    closing: Cell<bool>,
    teardown: RefCell<Option<TeardownFn>>,
    teardown_registered: Cell<bool>,
    closed: OneShot<CloseEvent<R>>,
    opened: OneShot<()>,
    backdrop_clicks: Notifier<()>,
    content: RefCell<Option<Weak<RefCell<dyn HostedContent>>>>,
}

impl<D, R: 'static> HandleState<D, R> {
    fn finish(&self, result: Option<R>, reason: CloseReason) -> bool {
        if self.closing.replace(true) {
            #[cfg(feature = "tracing")]
            tracing::trace!(id = %self.id, ?reason, "close ignored, already closing");
            return false;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(id = %self.id, ?reason, "modal closing");

        let teardown = self.teardown.borrow_mut().take();
        if let Some(teardown) = teardown {
            teardown(reason);
        }
        self.closed.emit(CloseEvent { result, reason });
        self.backdrop_clicks.close();
        true
    }
}

impl<D, R: 'static> AnyModal for HandleState<D, R> {
    fn id(&self) -> ModalId {
        self.id
    }

    fn settings(&self) -> &ModalSettings {
        &self.settings
    }

    fn is_closing(&self) -> bool {
        self.closing.get()
    }

    fn dismiss(&self) -> bool {
        self.finish(None, CloseReason::Programmatic)
    }
}

impl<D, R: 'static> ModalCloser for HandleState<D, R> {
    fn close_by_backdrop(&self) -> bool {
        self.backdrop_clicks.notify(&());
        self.settings.close_on_backdrop && self.finish(None, CloseReason::Backdrop)
    }

    fn close_by_escape(&self) -> bool {
        self.settings.close_on_escape && self.finish(None, CloseReason::Escape)
    }

    fn mark_opened(&self) {
        self.opened.emit(());
    }

    fn register_close_callback(&self, callback: TeardownFn) -> bool {
        if self.teardown_registered.replace(true) {
            #[cfg(feature = "tracing")]
            tracing::warn!(id = %self.id, "close callback already registered");
            return false;
        }
        *self.teardown.borrow_mut() = Some(callback);
        true
    }
}

/// Control handle for one dialog.
///
/// `D` is the data payload given to `open`; `R` the result type passed to
/// [`close`](Self::close). Clones refer to the same dialog.
pub struct ModalHandle<D, R = ()> {
    inner: Rc<HandleState<D, R>>,
}

impl<D, R> Clone for ModalHandle<D, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D, R> fmt::Debug for ModalHandle<D, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalHandle")
            .field("id", &self.inner.id)
            .field("closing", &self.inner.closing.get())
            .finish_non_exhaustive()
    }
}

impl<D, R> ModalHandle<D, R> {
    pub(crate) fn new(data: Rc<D>, settings: ModalSettings) -> Self {
        Self {
            inner: Rc::new(HandleState {
                id: ModalId::next(),
                data,
                settings,
                closing: Cell::new(false),
                teardown: RefCell::new(None),
                teardown_registered: Cell::new(false),
                closed: OneShot::new(),
                opened: OneShot::new(),
                backdrop_clicks: Notifier::new(),
                content: RefCell::new(None),
            }),
        }
    }

    pub fn id(&self) -> ModalId {
        self.inner.id
    }

    /// The data payload, identical to the one hosted content received.
    pub fn data(&self) -> Rc<D> {
        Rc::clone(&self.inner.data)
    }

    /// Resolved configuration.
    pub fn config(&self) -> &ModalSettings {
        &self.inner.settings
    }

    /// Whether a close was accepted.
    pub fn is_closing(&self) -> bool {
        self.inner.closing.get()
    }

    /// Whether the dialog reached its open state.
    pub fn is_opened(&self) -> bool {
        self.inner.opened.is_complete()
    }

    /// The hosted content, while it is alive.
    pub fn content_instance(&self) -> Option<HostedInstance> {
        self.inner.content.borrow().as_ref()?.upgrade()
    }

    pub(crate) fn set_content(&self, content: &HostedInstance) {
        *self.inner.content.borrow_mut() = Some(Rc::downgrade(content));
    }
}

impl<D: 'static, R: 'static> ModalHandle<D, R> {
    /// Close with `result` (reason [`CloseReason::Button`]).
    ///
    /// Returns `false` if the dialog was already closing.
    pub fn close(&self, result: Option<R>) -> bool {
        self.inner.finish(result, CloseReason::Button)
    }

    /// Close without a result (reason [`CloseReason::Programmatic`]).
    pub fn dismiss(&self) -> bool {
        self.inner.finish(None, CloseReason::Programmatic)
    }

    /// Run `f` once with the close event. Runs immediately if already closed.
    pub fn after_closed(&self, f: impl FnOnce(&CloseEvent<R>) + 'static) -> Subscription {
        self.inner.closed.subscribe(f)
    }

    /// The close event, once emitted.
    pub fn close_event(&self) -> Option<Rc<CloseEvent<R>>> {
        self.inner.closed.value()
    }

    /// Run `f` once when the dialog reaches its open state.
    pub fn after_opened(&self, f: impl FnOnce() + 'static) -> Subscription {
        self.inner.opened.subscribe(move |_| f())
    }

    /// Run `f` on every backdrop click, whether or not it closes the dialog.
    pub fn backdrop_click(&self, f: impl Fn() + 'static) -> Subscription {
        self.inner.backdrop_clicks.subscribe(move |_| f())
    }

    pub fn as_modal_ref(&self) -> ModalRef {
        Rc::clone(&self.inner) as ModalRef
    }

    pub(crate) fn closer(&self) -> Rc<dyn ModalCloser> {
        Rc::clone(&self.inner) as Rc<dyn ModalCloser>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::ModalConfig;

    fn handle(config: ModalConfig) -> ModalHandle<&'static str, u32> {
        ModalHandle::new(Rc::new("payload"), config.resolve(&ModalConfig::default()))
    }

    fn recorder<R: Clone + 'static>(
        h: &ModalHandle<&'static str, R>,
    ) -> Rc<RefCell<Vec<CloseEvent<R>>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        h.after_closed(move |e| s.borrow_mut().push(e.clone())).detach();
        seen
    }

    #[test]
    fn ids_are_unique() {
        let a = handle(ModalConfig::new());
        let b = handle(ModalConfig::new());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn double_close_emits_once() {
        let h = handle(ModalConfig::new());
        let seen = recorder(&h);
        assert!(h.close(Some(7)));
        assert!(!h.close(Some(8)));
        assert!(!h.dismiss());
        assert_eq!(
            *seen.borrow(),
            vec![CloseEvent {
                result: Some(7),
                reason: CloseReason::Button
            }]
        );
        assert!(h.is_closing());
    }

    #[test]
    fn late_subscriber_sees_close() {
        let h = handle(ModalConfig::new());
        h.dismiss();
        let seen = recorder(&h);
        assert_eq!(seen.borrow()[0].reason, CloseReason::Programmatic);
        assert_eq!(h.close_event().map(|e| e.reason), Some(CloseReason::Programmatic));
    }

    #[test]
    fn teardown_runs_before_subscribers() {
        let h = handle(ModalConfig::new());
        let order = Rc::new(RefCell::new(Vec::new()));
        let o = Rc::clone(&order);
        h.after_closed(move |_| o.borrow_mut().push("subscriber")).detach();
        let o = Rc::clone(&order);
        assert!(
            h.closer()
                .register_close_callback(Box::new(move |_| o.borrow_mut().push("teardown")))
        );
        h.close(None);
        assert_eq!(*order.borrow(), vec!["teardown", "subscriber"]);
    }

    #[test]
    fn second_registration_rejected() {
        let h = handle(ModalConfig::new());
        assert!(h.closer().register_close_callback(Box::new(|_| {})));
        assert!(!h.closer().register_close_callback(Box::new(|_| {})));
    }

    #[test]
    fn backdrop_gated_but_always_notified() {
        let h = handle(ModalConfig::new().close_on_backdrop(false));
        let clicks = Rc::new(Cell::new(0));
        let c = Rc::clone(&clicks);
        let _sub = h.backdrop_click(move || c.set(c.get() + 1));
        let seen = recorder(&h);

        assert!(!h.closer().close_by_backdrop());
        assert!(!h.closer().close_by_backdrop());
        assert_eq!(clicks.get(), 2);
        assert!(!h.is_closing());

        assert!(h.closer().close_by_escape());
        assert_eq!(seen.borrow()[0].reason, CloseReason::Escape);
        assert_eq!(seen.borrow()[0].result, None);
    }

    #[test]
    fn escape_gated() {
        let h = handle(ModalConfig::new().close_on_escape(false));
        assert!(!h.closer().close_by_escape());
        assert!(!h.is_closing());
        assert!(h.closer().close_by_backdrop());
        assert_eq!(
            h.close_event().map(|e| e.reason),
            Some(CloseReason::Backdrop)
        );
    }

    #[test]
    fn opened_fires_once() {
        let h = handle(ModalConfig::new());
        let hits = Rc::new(Cell::new(0));
        let c = Rc::clone(&hits);
        let _sub = h.after_opened(move || c.set(c.get() + 1));
        h.closer().mark_opened();
        h.closer().mark_opened();
        assert_eq!(hits.get(), 1);
        assert!(h.is_opened());
    }

    #[test]
    fn modal_ref_shares_state() {
        let h = handle(ModalConfig::new());
        let r = h.as_modal_ref();
        assert_eq!(r.id(), h.id());
        assert!(r.dismiss());
        assert!(h.is_closing());
        assert!(r.is_closing());
    }

    #[test]
    fn content_is_weak() {
        let h = handle(ModalConfig::new());
        let content: HostedInstance = Rc::new(RefCell::new(()));
        h.set_content(&content);
        assert!(h.content_instance().is_some());
        drop(content);
        assert!(h.content_instance().is_none());
    }
}
