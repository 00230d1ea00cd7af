#![forbid(unsafe_code)]

//! Modal stack: the public entry point for opening dialogs.
//!
//! The `ModalStack` owns the open dialogs in LIFO order, assigns their
//! z-indices, mounts their containers under one shared overlay root and
//! restores focus when they close. Only the topmost dialog receives key and
//! pointer input.
//!
//! # Invariants
//!
//! - Stack order equals open order.
//! - Z-order is strictly increasing: each new dialog gets
//!   `max(base + len * increment, top + increment)`, so it lands above the
//!   current top even after dialogs below it closed out of order.
//! - A stack entry exists exactly while its handle is not closing.
//! - Closing removes the entry immediately, but the container stays mounted
//!   until its exit finishes. While a dialog is exiting, [`ModalStack::open_count`]
//!   and [`ModalStack::mounted_count`] therefore differ; they agree again once
//!   the container is destroyed.
//! - Focus stays in the topmost dialog. A dialog opened from another one's
//!   content factory keeps focus, and closing it returns focus into the
//!   dialog that opened it.
//!
//! # Failure Modes
//!
//! - `open()` on a non-live document returns an inert handle: it can be
//!   subscribed to and closed, but nothing is mounted and no entry is pushed.
//! - The focus-restore target was removed while the dialog was open: focus
//!   is left alone.
//! - `close_by_id()` for an unknown id returns `false`.
//! - The overlay root was removed from the tree: the next `open()` creates a
//!   new one.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use modalkit_core::event::Event;
use modalkit_core::{Document, NodeId, Rect};
use modalkit_runtime::Scheduler;

use crate::modal::animation::OVERLAY_ROOT_CLASS;
use crate::modal::container::{ModalContainer, ModalNodes, MountOptions};
use crate::modal::host::ContentFactory;
use crate::modal::{
    ModalConfig, ModalHandle, ModalId, ModalPhase, ModalRef, OriginOffset, StackConfig,
};

struct StackEntry {
    modal: ModalRef,
    z_index: u32,
    /// Focused element right before open. Restoration only.
    previous_focus: Option<NodeId>,
    restore_focus: bool,
    container_node: NodeId,
}

struct StackInner {
    document: Document,
    scheduler: Scheduler,
    config: StackConfig,
    entries: Vec<StackEntry>,
    containers: AHashMap<ModalId, ModalContainer>,
    overlay_root: Option<NodeId>,
}

impl StackInner {
    fn next_z_index(&self) -> u32 {
        let by_index = self.config.z_for_index(self.entries.len());
        match self.entries.last() {
            Some(top) => by_index.max(top.z_index.saturating_add(self.config.z_step())),
            None => by_index,
        }
    }

    fn entry(&self, id: ModalId) -> Option<&StackEntry> {
        self.entries.iter().find(|e| e.modal.id() == id)
    }
}

/// Orchestrates stacked dialogs over one document.
///
/// Clones share the same stack.
#[derive(Clone)]
pub struct ModalStack {
    inner: Rc<RefCell<StackInner>>,
}

impl fmt::Debug for ModalStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ModalStack")
            .field("open", &inner.entries.len())
            .field("mounted", &inner.containers.len())
            .field("config", &inner.config)
            .finish()
    }
}

impl ModalStack {
    /// Create a stack with the default [`StackConfig`].
    pub fn new(document: Document, scheduler: Scheduler) -> Self {
        Self::with_config(document, scheduler, StackConfig::default())
    }

    pub fn with_config(document: Document, scheduler: Scheduler, config: StackConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StackInner {
                document,
                scheduler,
                config,
                entries: Vec::new(),
                containers: AHashMap::new(),
                overlay_root: None,
            })),
        }
    }

    pub fn config(&self) -> StackConfig {
        self.inner.borrow().config.clone()
    }

    pub fn document(&self) -> Document {
        self.inner.borrow().document.clone()
    }

    pub fn scheduler(&self) -> Scheduler {
        self.inner.borrow().scheduler.clone()
    }

    /// Open a dialog without a data payload.
    pub fn open<R, F>(&self, content: F, config: ModalConfig) -> ModalHandle<(), R>
    where
        R: 'static,
        F: ContentFactory<(), R>,
    {
        self.open_with_data(content, (), config)
    }

    /// Open a dialog whose content receives `data`.
    pub fn open_with_data<D, R, F>(
        &self,
        content: F,
        data: D,
        config: ModalConfig,
    ) -> ModalHandle<D, R>
    where
        D: 'static,
        R: 'static,
        F: ContentFactory<D, R>,
    {
        let (document, scheduler, settings, z_index, exit_fallback) = {
            let inner = self.inner.borrow();
            let settings = config.resolve(&inner.config.defaults);
            let z_index = settings.z_index.unwrap_or_else(|| inner.next_z_index());
            (
                inner.document.clone(),
                inner.scheduler.clone(),
                settings,
                z_index,
                inner.config.exit_fallback_duration(),
            )
        };

        // Captured before any tree mutation.
        let previous_focus = document.active_element();
        let handle = ModalHandle::new(Rc::new(data), settings);
        let id = handle.id();

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("modal_open", id = %id, z_index).entered();

        if !document.is_live() {
            #[cfg(feature = "tracing")]
            tracing::warn!(id = %id, "document is not live; returning inert modal handle");
            return handle;
        }

        let overlay_root = self.ensure_overlay_root();
        let weak = Rc::downgrade(&self.inner);
        let is_top = move || {
            weak.upgrade().is_none_or(|inner| {
                inner.borrow().entries.last().is_some_and(|e| e.modal.id() == id)
            })
        };
        let container = ModalContainer::mount(MountOptions {
            document: &document,
            scheduler: &scheduler,
            overlay_root,
            id,
            settings: handle.config(),
            z_index,
            exit_fallback,
            is_top: Box::new(is_top),
        });

        {
            let mut inner = self.inner.borrow_mut();
            inner.entries.push(StackEntry {
                modal: handle.as_modal_ref(),
                z_index,
                previous_focus,
                restore_focus: handle.config().restore_focus,
                container_node: container.nodes().container,
            });
            inner.containers.insert(id, container.clone());
        }

        let weak = Rc::downgrade(&self.inner);
        container.on_destroyed(move |id| {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().containers.remove(&id);
            }
        });

        let weak = Rc::downgrade(&self.inner);
        handle
            .after_closed(move |_| {
                if let Some(inner) = weak.upgrade() {
                    ModalStack { inner }.remove_entry(id);
                }
            })
            .detach();

        if let Some(target) = container.attach(&handle, content) {
            self.retarget_focus_above(id, target);
        }
        handle
    }

    /// Dialogs opened while `id` built its content captured the focus `id`
    /// was about to replace. Point them at `target` instead.
    fn retarget_focus_above(&self, id: ModalId, target: NodeId) {
        let containers: Vec<ModalContainer> = {
            let mut inner = self.inner.borrow_mut();
            let inner = &mut *inner;
            let Some(pos) = inner.entries.iter().position(|e| e.modal.id() == id) else {
                return;
            };
            let replaced = inner.entries[pos].previous_focus;
            inner.entries[pos + 1..]
                .iter_mut()
                .filter(|above| above.previous_focus == replaced)
                .filter_map(|above| {
                    above.previous_focus = Some(target);
                    inner.containers.get(&above.modal.id()).cloned()
                })
                .collect()
        };
        for container in containers {
            container.retarget_restore(Some(target));
        }
    }

    /// Drop the entry for `id` and hand focus back.
    fn remove_entry(&self, id: ModalId) {
        let (entry, was_top, document, handoff) = {
            let mut inner = self.inner.borrow_mut();
            let inner = &mut *inner;
            let Some(pos) = inner.entries.iter().position(|e| e.modal.id() == id) else {
                return;
            };
            let was_top = pos + 1 == inner.entries.len();
            let entry = inner.entries.remove(pos);
            let mut handoff = None;
            if !was_top {
                // The dialog above may have captured focus inside the one
                // closing; point it at what this one would have restored.
                let doc = &inner.document;
                if let Some(above) = inner.entries.get_mut(pos)
                    && above
                        .previous_focus
                        .is_some_and(|f| doc.contains(entry.container_node, f))
                {
                    above.previous_focus = entry.previous_focus;
                    handoff = inner.containers.get(&above.modal.id()).cloned();
                }
            }
            (entry, was_top, inner.document.clone(), handoff)
        };

        if let Some(above) = handoff {
            above.retarget_restore(entry.previous_focus);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(id = %id, was_top, "modal stack entry removed");

        if was_top
            && entry.restore_focus
            && let Some(previous) = entry.previous_focus
            && document.is_connected(previous)
        {
            document.focus(previous);
        }
    }

    fn ensure_overlay_root(&self) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        if let Some(root) = inner.overlay_root
            && inner.document.is_connected(root)
        {
            return root;
        }
        let doc = inner.document.clone();
        let root = doc.create_element("div");
        doc.add_class(root, OVERLAY_ROOT_CLASS);
        doc.append_child(doc.body(), root);
        inner.overlay_root = Some(root);
        root
    }

    /// Dismiss every open dialog, topmost first. Returns how many closed.
    pub fn close_all(&self) -> usize {
        let modals: Vec<ModalRef> = self
            .inner
            .borrow()
            .entries
            .iter()
            .rev()
            .map(|e| Rc::clone(&e.modal))
            .collect();
        let mut closed = 0;
        for modal in modals {
            if modal.dismiss() {
                closed += 1;
            }
        }
        closed
    }

    /// Dismiss the dialog with `id`, wherever it sits in the stack.
    pub fn close_by_id(&self, id: ModalId) -> bool {
        let modal = self.inner.borrow().entry(id).map(|e| Rc::clone(&e.modal));
        modal.is_some_and(|m| m.dismiss())
    }

    /// The dialog currently receiving input.
    pub fn top_modal(&self) -> Option<ModalRef> {
        self.inner
            .borrow()
            .entries
            .last()
            .map(|e| Rc::clone(&e.modal))
    }

    pub fn top_id(&self) -> Option<ModalId> {
        self.inner.borrow().entries.last().map(|e| e.modal.id())
    }

    /// Open dialogs in open order.
    pub fn ids(&self) -> Vec<ModalId> {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|e| e.modal.id())
            .collect()
    }

    /// Dialogs not yet closing. Exiting dialogs are not counted.
    pub fn open_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    pub fn is_open(&self, id: ModalId) -> bool {
        self.inner.borrow().entry(id).is_some()
    }

    /// Backdrop z-index of an open dialog (the panel sits one above).
    pub fn z_index_of(&self, id: ModalId) -> Option<u32> {
        self.inner.borrow().entry(id).map(|e| e.z_index)
    }

    /// Containers still mounted, including ones playing their exit.
    ///
    /// Can exceed [`open_count`](Self::open_count) until exits finish.
    pub fn mounted_count(&self) -> usize {
        self.inner.borrow().containers.len()
    }

    pub fn overlay_root(&self) -> Option<NodeId> {
        self.inner.borrow().overlay_root
    }

    /// Lifecycle phase of a mounted container.
    pub fn phase_of(&self, id: ModalId) -> Option<ModalPhase> {
        let container = self.inner.borrow().containers.get(&id).cloned();
        container.map(|c| c.phase())
    }

    /// Elements of a mounted container.
    pub fn nodes_of(&self, id: ModalId) -> Option<ModalNodes> {
        let container = self.inner.borrow().containers.get(&id).cloned();
        container.map(|c| c.nodes())
    }

    /// Resting rectangle of a mounted panel.
    pub fn panel_rect(&self, id: ModalId) -> Option<Rect> {
        let container = self.inner.borrow().containers.get(&id).cloned();
        container.map(|c| c.resting_rect())
    }

    /// Start offset of an origin animation, measured when the dialog opened.
    pub fn origin_offset(&self, id: ModalId) -> Option<OriginOffset> {
        let container = self.inner.borrow().containers.get(&id).cloned();
        container.and_then(|c| c.origin())
    }

    /// Route an input event.
    ///
    /// Keys and pointer events go to the topmost dialog only; animation
    /// events go to whichever container owns the target. Events inside a
    /// panel that the dialog does not use are forwarded to its content.
    /// Returns `true` if the modal layer consumed the event.
    pub fn handle_event(&self, event: &Event) -> bool {
        match event {
            Event::Animation(_) => {
                let containers: Vec<ModalContainer> =
                    self.inner.borrow().containers.values().cloned().collect();
                containers.iter().any(|c| c.handle_event(event))
            }
            Event::Key(_) | Event::Mouse(_) => {
                let top = {
                    let inner = self.inner.borrow();
                    inner
                        .entries
                        .last()
                        .and_then(|e| inner.containers.get(&e.modal.id()).cloned())
                };
                top.is_some_and(|c| c.handle_event(event))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::{CloseReason, HostScope};
    use modalkit_core::Size;
    use modalkit_core::event::{AnimationEvent, KeyCode, KeyEvent, MouseEvent};
    use proptest::prelude::*;
    use std::time::Duration;

    fn stack() -> (Document, Scheduler, ModalStack) {
        let doc = Document::new(Size::new(80, 24));
        let sched = Scheduler::new();
        let stack = ModalStack::new(doc.clone(), sched.clone());
        (doc, sched, stack)
    }

    fn with_button(scope: HostScope<(), ()>) {
        let b = scope.document.create_element("button");
        scope.document.append_child(scope.host, b);
    }

    #[test]
    fn z_index_uses_base_and_increment() {
        let (_doc, _s, stack) = stack();
        let a = stack.open(with_button, ModalConfig::new());
        let b = stack.open(with_button, ModalConfig::new());
        assert_eq!(stack.z_index_of(a.id()), Some(1000));
        assert_eq!(stack.z_index_of(b.id()), Some(1010));
        assert_eq!(stack.top_id(), Some(b.id()));
        assert_eq!(stack.ids(), vec![a.id(), b.id()]);
    }

    #[test]
    fn z_index_override_and_out_of_order_close() {
        let (_doc, _s, stack) = stack();
        let a = stack.open(with_button, ModalConfig::new());
        let b = stack.open(with_button, ModalConfig::new());
        a.dismiss();
        // Only one entry left, but the new dialog still lands above `b`.
        let c = stack.open(with_button, ModalConfig::new());
        assert_eq!(stack.z_index_of(c.id()), Some(1020));

        let d = stack.open(with_button, ModalConfig::new().z_index(5000));
        assert_eq!(stack.z_index_of(d.id()), Some(5000));
        assert!(stack.is_open(b.id()));
        assert!(!stack.is_open(a.id()));
    }

    #[test]
    fn zero_increment_config_keeps_z_strictly_increasing() {
        let doc = Document::new(Size::new(80, 24));
        let config = StackConfig {
            z_increment: 0,
            ..StackConfig::default()
        };
        let stack = ModalStack::with_config(doc, Scheduler::new(), config);
        let a = stack.open(with_button, ModalConfig::new());
        let b = stack.open(with_button, ModalConfig::new());
        let za = stack.z_index_of(a.id()).expect("a open");
        let zb = stack.z_index_of(b.id()).expect("b open");
        assert!(zb > za, "{za} !< {zb}");
    }

    #[test]
    fn overlay_root_is_shared_and_recreated() {
        let (doc, _s, stack) = stack();
        assert_eq!(stack.overlay_root(), None);
        let a = stack.open(with_button, ModalConfig::new());
        let root = stack.overlay_root().expect("overlay root");
        assert!(doc.has_class(root, OVERLAY_ROOT_CLASS));
        stack.open(with_button, ModalConfig::new());
        assert_eq!(doc.children(root).len(), 2);

        a.dismiss();
        doc.remove(root);
        stack.open(with_button, ModalConfig::new());
        let new_root = stack.overlay_root().expect("overlay root");
        assert_ne!(root, new_root);
        assert!(doc.is_connected(new_root));
    }

    #[test]
    fn inert_handle_on_detached_document() {
        let doc = Document::detached();
        let stack = ModalStack::new(doc.clone(), Scheduler::new());
        let h = stack.open(with_button, ModalConfig::new());
        assert_eq!(stack.open_count(), 0);
        assert_eq!(stack.mounted_count(), 0);
        assert_eq!(stack.overlay_root(), None);
        assert!(doc.children(doc.body()).is_empty());

        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        h.after_closed(move |e| *s.borrow_mut() = Some(e.reason)).detach();
        assert!(h.close(None));
        assert_eq!(*seen.borrow(), Some(CloseReason::Button));
    }

    #[test]
    fn focus_restored_only_if_connected() {
        let (doc, _s, stack) = stack();
        let trigger = doc.create_element("button");
        doc.append_child(doc.body(), trigger);
        doc.focus(trigger);

        let h = stack.open(with_button, ModalConfig::new());
        assert_ne!(doc.active_element(), Some(trigger));
        h.close(None);
        assert_eq!(doc.active_element(), Some(trigger));

        let h = stack.open(with_button, ModalConfig::new());
        doc.remove(trigger);
        let inside = doc.active_element();
        h.close(None);
        assert_eq!(doc.active_element(), inside);
    }

    #[test]
    fn restore_focus_disabled_keeps_trap_restoration() {
        let (doc, _s, stack) = stack();
        let trigger = doc.create_element("button");
        doc.append_child(doc.body(), trigger);
        doc.focus(trigger);
        let h = stack.open(with_button, ModalConfig::new().restore_focus(false));
        assert_ne!(doc.active_element(), Some(trigger));
        h.close(None);
        assert_eq!(doc.active_element(), Some(trigger));
    }

    #[test]
    fn child_opened_from_content_factory_keeps_focus() {
        let (doc, _s, stack) = stack();
        let trigger = doc.create_element("button");
        doc.append_child(doc.body(), trigger);
        doc.focus(trigger);

        let slot = Rc::new(RefCell::new(None));
        let (nested, s) = (stack.clone(), Rc::clone(&slot));
        let parent = stack.open(
            move |scope: HostScope<(), ()>| {
                with_button(scope);
                *s.borrow_mut() = Some(nested.open(with_button, ModalConfig::new()));
            },
            ModalConfig::new(),
        );
        let child = slot.borrow_mut().take().expect("child opened");
        assert_eq!(stack.top_id(), Some(child.id()));

        let child_panel = stack.nodes_of(child.id()).expect("child").panel;
        let parent_panel = stack.nodes_of(parent.id()).expect("parent").panel;
        let active = doc.active_element().expect("focus");
        assert!(doc.contains(child_panel, active));

        child.close(None);
        let active = doc.active_element().expect("focus");
        assert!(doc.contains(parent_panel, active));

        parent.close(None);
        assert_eq!(doc.active_element(), Some(trigger));
    }

    #[test]
    fn closing_lower_dialog_hands_focus_target_up() {
        let (doc, _s, stack) = stack();
        let trigger = doc.create_element("button");
        doc.append_child(doc.body(), trigger);
        doc.focus(trigger);

        let a = stack.open(with_button, ModalConfig::new());
        let b = stack.open(with_button, ModalConfig::new());
        let focused_in_b = doc.active_element();

        assert!(stack.close_by_id(a.id()));
        // Not the top dialog: focus stays inside `b`.
        assert_eq!(doc.active_element(), focused_in_b);
        b.close(None);
        assert_eq!(doc.active_element(), Some(trigger));
    }

    #[test]
    fn close_all_topmost_first() {
        let (_doc, _s, stack) = stack();
        let order = Rc::new(RefCell::new(Vec::new()));
        let handles: Vec<_> = (0..3)
            .map(|_| stack.open(with_button, ModalConfig::new()))
            .collect();
        for h in &handles {
            let o = Rc::clone(&order);
            let id = h.id();
            h.after_closed(move |e| {
                assert_eq!(e.reason, CloseReason::Programmatic);
                o.borrow_mut().push(id);
            })
            .detach();
        }
        assert_eq!(stack.close_all(), 3);
        let expected: Vec<_> = handles.iter().rev().map(|h| h.id()).collect();
        assert_eq!(*order.borrow(), expected);
        assert!(stack.is_empty());
        assert_eq!(stack.close_all(), 0);
        assert!(!stack.close_by_id(handles[0].id()));
    }

    #[test]
    fn containers_leave_after_exit() {
        let (doc, sched, stack) = stack();
        let h = stack.open(with_button, ModalConfig::new());
        sched.run_frame();
        assert_eq!(stack.phase_of(h.id()), Some(ModalPhase::Open));
        let panel = stack.nodes_of(h.id()).expect("nodes").panel;

        h.close(None);
        assert_eq!(stack.open_count(), 0);
        assert_eq!(stack.mounted_count(), 1);
        assert_eq!(stack.phase_of(h.id()), Some(ModalPhase::Exiting));

        assert!(stack.handle_event(&AnimationEvent::end(panel).into()));
        assert_eq!(stack.mounted_count(), 0);
        assert!(!doc.exists(panel));
        assert_eq!(stack.phase_of(h.id()), None);
        sched.advance(Duration::from_secs(1));
    }

    #[test]
    fn input_goes_to_top_only() {
        let (_doc, _s, stack) = stack();
        let a = stack.open(with_button, ModalConfig::new());
        let b = stack.open(with_button, ModalConfig::new());
        let a_backdrop = stack.nodes_of(a.id()).and_then(|n| n.backdrop).expect("backdrop");

        // Clicking the lower backdrop does not reach `a`.
        assert!(!stack.handle_event(&MouseEvent::click(a_backdrop).into()));
        assert!(!a.is_closing());

        assert!(stack.handle_event(&KeyEvent::new(KeyCode::Escape).into()));
        assert!(b.is_closing());
        assert!(!a.is_closing());
        assert!(stack.handle_event(&KeyEvent::new(KeyCode::Escape).into()));
        assert!(a.is_closing());
        assert!(!stack.handle_event(&KeyEvent::new(KeyCode::Escape).into()));
    }

    #[test]
    fn stack_defaults_apply() {
        let doc = Document::new(Size::new(80, 24));
        let stack = ModalStack::with_config(
            doc.clone(),
            Scheduler::new(),
            StackConfig::default()
                .base_z_index(200)
                .defaults(ModalConfig::new().close_on_escape(false).panel_class("app")),
        );
        let h = stack.open(with_button, ModalConfig::new().panel_class("mine"));
        assert_eq!(stack.z_index_of(h.id()), Some(200));
        assert!(!h.config().close_on_escape);
        let panel = stack.nodes_of(h.id()).expect("nodes").panel;
        assert!(doc.has_class(panel, "app"));
        assert!(doc.has_class(panel, "mine"));
        // Escape is consumed by the modal layer but does not close.
        assert!(stack.handle_event(&KeyEvent::new(KeyCode::Escape).into()));
        assert!(!h.is_closing());
    }

    proptest! {
        #[test]
        fn z_order_strictly_increases(ops in proptest::collection::vec(0u8..4, 1..30)) {
            let (doc, sched, stack) = stack();
            let mut open: Vec<ModalHandle<(), ()>> = Vec::new();
            for op in ops {
                match op {
                    0 | 1 => {
                        let h = stack.open(with_button, ModalConfig::new());
                        let z = stack.z_index_of(h.id()).expect("z");
                        if let Some(top) = open.last() {
                            prop_assert!(z > stack.z_index_of(top.id()).expect("z"));
                        }
                        let nodes = stack.nodes_of(h.id()).expect("nodes");
                        let bz: u32 = doc.style(nodes.backdrop.expect("backdrop"), "z-index")
                            .and_then(|v| v.parse().ok()).expect("backdrop z");
                        let pz: u32 = doc.style(nodes.panel, "z-index")
                            .and_then(|v| v.parse().ok()).expect("panel z");
                        prop_assert_eq!(bz, z);
                        prop_assert_eq!(pz, z + 1);
                        open.push(h);
                    }
                    2 => {
                        if let Some(h) = open.pop() {
                            h.close(None);
                        }
                    }
                    _ => {
                        if !open.is_empty() {
                            let h = open.remove(0);
                            h.dismiss();
                        }
                    }
                }
                prop_assert_eq!(stack.open_count(), open.len());
                let zs: Vec<u32> = stack
                    .ids()
                    .iter()
                    .filter_map(|id| stack.z_index_of(*id))
                    .collect();
                prop_assert!(zs.windows(2).all(|w| w[0] < w[1]));
                sched.advance(Duration::from_millis(300));
                prop_assert_eq!(stack.mounted_count(), open.len());
            }
        }
    }
}
