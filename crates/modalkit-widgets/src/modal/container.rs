#![forbid(unsafe_code)]

//! Per-dialog container: backdrop, panel, content host and lifecycle.
//!
//! The container mounts this structure under the stack's overlay root:
//!
//! ```text
//! div.modal-container[data-modal-id]        (gets .modal-open while open)
//! ├── div.modal-backdrop                    z-index: z       (optional)
//! └── div.modal-panel.modal-anim-*          z-index: z + 1, role, aria-*
//!     └── div.modal-content                 hosted content mounts here
//! ```
//!
//! and drives it through [`ModalPhase`]: content is attached synchronously,
//! the open class is added one scheduler frame later, and after a close the
//! nodes stay mounted until the panel reports the end of its exit animation
//! or the fallback timer fires, whichever comes first.
//!
//! # Invariants
//!
//! 1. Panel z-index is exactly backdrop z-index + 1.
//! 2. The container holds one scroll lock from mount until destruction.
//! 3. Destruction runs once: the second of (animation end, fallback timer)
//!    finds the container already destroyed and does nothing.
//! 4. No container borrow is held while calling into the handle or hosted
//!    content, so either may re-enter the container or the stack.
//!
//! # Failure Modes
//!
//! - Panel never emits an animation-end event: the fallback timer destroys.
//! - Handle closed while the content factory is still running: the container
//!   skips focus activation and the enter frame and goes straight to exit.
//! - Content factory opened another dialog above this one: the trap is armed
//!   without moving focus, and [`ModalContainer::attach`] reports the element
//!   it would have focused.
//! - Origin element missing or disconnected: no origin offset is applied.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use modalkit_core::event::{AnimationEventKind, Event, KeyCode};
use modalkit_core::{Document, NodeId, Rect, ScrollLockGuard, Size};
use modalkit_runtime::{Scheduler, TaskId};

use crate::focus_trap::{AutoFocus, FocusTrap};
use crate::modal::animation::{
    BACKDROP_CLASS, CONTAINER_CLASS, CONTENT_CLASS, OPEN_CLASS, PANEL_CLASS,
};
use crate::modal::handle::ModalCloser;
use crate::modal::host::{ContentFactory, HostScope, HostedInstance};
use crate::modal::{ModalAnimation, ModalHandle, ModalId, ModalPhase, ModalSettings, OriginOffset};

/// Elements making up one mounted dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModalNodes {
    pub container: NodeId,
    pub backdrop: Option<NodeId>,
    pub panel: NodeId,
    /// Element hosted content is mounted under.
    pub content: NodeId,
}

/// What an input event means for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModalAction {
    /// Primary press on the backdrop.
    BackdropClicked,
    /// Escape was pressed.
    EscapePressed,
    /// Tab handled by the focus trap.
    FocusCycled,
    /// Event belongs to the hosted content.
    Forward,
    /// Panel finished its exit animation.
    ExitAnimationEnded,
    /// Event swallowed by the modal layer.
    Blocked,
}

/// Resting panel rectangle: `size` centred in `viewport`.
pub(crate) fn resting_rect(viewport: Size, size: Size) -> Rect {
    let width = size.width.min(viewport.width);
    let height = size.height.min(viewport.height);
    Rect::new(
        (viewport.width - width) / 2,
        (viewport.height - height) / 2,
        width,
        height,
    )
}

/// Inputs for [`ModalContainer::mount`].
pub(crate) struct MountOptions<'a> {
    pub document: &'a Document,
    pub scheduler: &'a Scheduler,
    pub overlay_root: NodeId,
    pub id: ModalId,
    pub settings: &'a ModalSettings,
    pub z_index: u32,
    pub exit_fallback: Duration,
    /// Whether this dialog is currently the topmost one.
    pub is_top: Box<dyn Fn() -> bool>,
}

struct ContainerState {
    id: ModalId,
    document: Document,
    scheduler: Scheduler,
    phase: ModalPhase,
    z_index: u32,
    nodes: ModalNodes,
    resting: Rect,
    origin: Option<OriginOffset>,
    auto_focus: AutoFocus,
    trap: FocusTrap,
    scroll_lock: Option<ScrollLockGuard>,
    closer: Option<Rc<dyn ModalCloser>>,
    content: Option<HostedInstance>,
    enter_task: Option<TaskId>,
    exit_task: Option<TaskId>,
    exit_fallback: Duration,
    is_top: Box<dyn Fn() -> bool>,
    on_destroyed: Option<Box<dyn FnOnce(ModalId)>>,
}

/// Shared handle to one dialog's container.
#[derive(Clone)]
pub(crate) struct ModalContainer {
    inner: Rc<RefCell<ContainerState>>,
}

impl fmt::Debug for ModalContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.inner.borrow();
        f.debug_struct("ModalContainer")
            .field("id", &st.id)
            .field("phase", &st.phase)
            .field("z_index", &st.z_index)
            .finish()
    }
}

impl ModalContainer {
    /// Build and attach the container nodes and take the scroll lock.
    ///
    /// The container starts in [`ModalPhase::Constructing`].
    pub(crate) fn mount(opts: MountOptions<'_>) -> Self {
        let doc = opts.document;
        let settings = opts.settings;
        let z = opts.z_index;
        let viewport = doc.viewport();
        let resting = resting_rect(viewport, settings.size.clamp(viewport));

        let container = doc.create_element("div");
        doc.add_class(container, CONTAINER_CLASS);
        doc.set_attribute(container, "data-modal-id", opts.id.id().to_string());

        let backdrop = settings.has_backdrop.then(|| {
            let backdrop = doc.create_element("div");
            doc.add_class(backdrop, BACKDROP_CLASS);
            for class in &settings.backdrop_class {
                doc.add_class(backdrop, class);
            }
            doc.set_style(backdrop, "z-index", z.to_string());
            doc.set_bounds(backdrop, Rect::from_size(viewport));
            doc.append_child(container, backdrop);
            backdrop
        });

        let panel = doc.create_element("div");
        doc.add_class(panel, PANEL_CLASS);
        if let Some(class) = settings.animation.class_name() {
            doc.add_class(panel, class);
        }
        for class in &settings.panel_class {
            doc.add_class(panel, class);
        }
        doc.set_style(panel, "z-index", z.saturating_add(1).to_string());
        doc.set_attribute(panel, "role", settings.role.as_str());
        doc.set_attribute(panel, "aria-modal", "true");
        let aria = [
            ("aria-label", &settings.aria_label),
            ("aria-labelledby", &settings.aria_labelledby),
            ("aria-describedby", &settings.aria_describedby),
        ];
        for (name, value) in aria {
            if let Some(value) = value {
                doc.set_attribute(panel, name, value.as_str());
            }
        }
        doc.set_bounds(panel, resting);
        doc.append_child(container, panel);

        let content = doc.create_element("div");
        doc.add_class(content, CONTENT_CLASS);
        doc.set_bounds(content, resting);
        doc.append_child(panel, content);

        doc.append_child(opts.overlay_root, container);

        // Origin is measured once, against the resting rect.
        let origin = (settings.animation == ModalAnimation::Origin)
            .then_some(settings.animation_origin)
            .flatten()
            .and_then(|trigger| doc.bounds(trigger))
            .map(|trigger| OriginOffset::between(trigger, resting));
        if let Some(origin) = origin {
            doc.set_style(panel, "--modal-origin-x", origin.dx.to_string());
            doc.set_style(panel, "--modal-origin-y", origin.dy.to_string());
        }

        let scroll_lock = doc.lock_scroll();
        let mut trap = FocusTrap::new(doc.clone(), panel);
        trap.remember_focus();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            id = %opts.id,
            z_index = z,
            ?resting,
            animation = ?settings.animation,
            "modal container mounted"
        );

        let nodes = ModalNodes {
            container,
            backdrop,
            panel,
            content,
        };
        Self {
            inner: Rc::new(RefCell::new(ContainerState {
                id: opts.id,
                document: doc.clone(),
                scheduler: opts.scheduler.clone(),
                phase: ModalPhase::Constructing,
                z_index: z,
                nodes,
                resting,
                origin,
                auto_focus: settings.auto_focus.clone(),
                trap,
                scroll_lock: Some(scroll_lock),
                closer: None,
                content: None,
                enter_task: None,
                exit_task: None,
                exit_fallback: opts.exit_fallback,
                is_top: opts.is_top,
                on_destroyed: None,
            })),
        }
    }

    /// Hook the handle's close path, create the hosted content, activate the
    /// focus trap and schedule the open state for the next frame.
    ///
    /// If the content factory stacked another dialog on top, focus stays with
    /// that dialog and the element this one would have focused is returned.
    pub(crate) fn attach<D, R, F>(&self, handle: &ModalHandle<D, R>, factory: F) -> Option<NodeId>
    where
        D: 'static,
        R: 'static,
        F: ContentFactory<D, R>,
    {
        let closer = handle.closer();
        let weak = Rc::downgrade(&self.inner);
        closer.register_close_callback(Box::new(move |_reason| {
            if let Some(inner) = weak.upgrade() {
                ModalContainer { inner }.begin_exit();
            }
        }));

        let (document, host) = {
            let mut st = self.inner.borrow_mut();
            st.closer = Some(closer);
            (st.document.clone(), st.nodes.content)
        };

        let scope = HostScope {
            handle: handle.clone(),
            data: handle.data(),
            document,
            host,
        };
        let content = factory.create_hosted(scope);
        handle.set_content(&content);

        let mut st = self.inner.borrow_mut();
        st.content = Some(content);
        if st.phase != ModalPhase::Constructing {
            return None;
        }
        st.phase = ModalPhase::Entering;
        let auto_focus = st.auto_focus.clone();
        let deferred = if (st.is_top)() {
            st.trap.activate(&auto_focus);
            None
        } else {
            st.trap.arm(&auto_focus)
        };

        let weak = Rc::downgrade(&self.inner);
        let task = st.scheduler.request_frame(move || {
            if let Some(inner) = weak.upgrade() {
                ModalContainer { inner }.enter();
            }
        });
        st.enter_task = Some(task);
        deferred
    }

    /// Point the trap's focus restoration at `target`.
    pub(crate) fn retarget_restore(&self, target: Option<NodeId>) {
        self.inner.borrow_mut().trap.set_restore_target(target);
    }

    /// Called when the container is fully torn down.
    pub(crate) fn on_destroyed(&self, f: impl FnOnce(ModalId) + 'static) {
        self.inner.borrow_mut().on_destroyed = Some(Box::new(f));
    }

    fn enter(&self) {
        let closer = {
            let mut st = self.inner.borrow_mut();
            if st.phase != ModalPhase::Entering {
                return;
            }
            st.enter_task = None;
            st.phase = ModalPhase::Open;
            st.document.add_class(st.nodes.container, OPEN_CLASS);

            #[cfg(feature = "tracing")]
            tracing::debug!(id = %st.id, "modal open");

            st.closer.clone()
        };
        if let Some(closer) = closer {
            closer.mark_opened();
        }
    }

    /// Start the exit sequence. Runs from the handle's close path.
    pub(crate) fn begin_exit(&self) {
        let mut st = self.inner.borrow_mut();
        if st.phase.is_closing() {
            return;
        }
        if let Some(task) = st.enter_task.take() {
            st.scheduler.cancel(task);
        }
        st.phase = ModalPhase::Exiting;
        st.document.remove_class(st.nodes.container, OPEN_CLASS);
        // Below the top, focus belongs to the dialog above.
        let restore = (st.is_top)();
        st.trap.deactivate_with_restore(restore);

        let weak = Rc::downgrade(&self.inner);
        let task = st.scheduler.set_timeout(st.exit_fallback, move || {
            if let Some(inner) = weak.upgrade() {
                #[cfg(feature = "tracing")]
                tracing::trace!("exit fallback timer fired");
                ModalContainer { inner }.finish_exit();
            }
        });
        st.exit_task = Some(task);

        #[cfg(feature = "tracing")]
        tracing::debug!(id = %st.id, fallback = ?st.exit_fallback, "modal exiting");
    }

    /// Tear down. Only acts once, and only after the exit sequence started.
    pub(crate) fn finish_exit(&self) {
        let (id, content, on_destroyed) = {
            let mut st = self.inner.borrow_mut();
            if st.phase != ModalPhase::Exiting {
                return;
            }
            st.phase = ModalPhase::Destroyed;
            for task in [st.exit_task.take(), st.enter_task.take()].into_iter().flatten() {
                st.scheduler.cancel(task);
            }
            if let Some(lock) = st.scroll_lock.take() {
                lock.release();
            }
            st.document.remove(st.nodes.container);
            st.closer = None;

            #[cfg(feature = "tracing")]
            tracing::debug!(id = %st.id, "modal destroyed");

            (st.id, st.content.take(), st.on_destroyed.take())
        };
        if let Some(content) = content {
            content.borrow_mut().on_destroy();
        }
        if let Some(on_destroyed) = on_destroyed {
            on_destroyed(id);
        }
    }

    fn classify(&self, event: &Event) -> Option<ModalAction> {
        let mut st = self.inner.borrow_mut();
        match event {
            Event::Animation(anim) => {
                let ends = matches!(
                    anim.kind,
                    AnimationEventKind::End | AnimationEventKind::Cancel
                );
                (ends && anim.target == st.nodes.panel && st.phase == ModalPhase::Exiting)
                    .then_some(ModalAction::ExitAnimationEnded)
            }
            Event::Key(key) => {
                if !st.phase.accepts_input() {
                    return None;
                }
                if key.is_press() && key.code == KeyCode::Escape {
                    Some(ModalAction::EscapePressed)
                } else if st.trap.handle_key(key) {
                    Some(ModalAction::FocusCycled)
                } else {
                    Some(ModalAction::Forward)
                }
            }
            Event::Mouse(mouse) => {
                if !st.phase.accepts_input() {
                    return None;
                }
                let target = mouse
                    .target
                    .or_else(|| st.document.hit_test(mouse.x, mouse.y))?;
                if Some(target) == st.nodes.backdrop {
                    Some(if mouse.is_primary_down() {
                        ModalAction::BackdropClicked
                    } else {
                        ModalAction::Blocked
                    })
                } else if st.document.contains(st.nodes.panel, target) {
                    Some(ModalAction::Forward)
                } else {
                    None
                }
            }
        }
    }

    /// Route an event. Returns `true` if the modal layer consumed it.
    pub(crate) fn handle_event(&self, event: &Event) -> bool {
        let Some(action) = self.classify(event) else {
            return false;
        };

        #[cfg(feature = "tracing")]
        tracing::trace!(id = %self.id(), ?action, "modal event");

        match action {
            ModalAction::BackdropClicked => {
                if let Some(closer) = self.closer() {
                    closer.close_by_backdrop();
                }
                true
            }
            ModalAction::EscapePressed => {
                if let Some(closer) = self.closer() {
                    closer.close_by_escape();
                }
                true
            }
            ModalAction::Forward => {
                let content = self.inner.borrow().content.clone();
                content.is_some_and(|c| c.borrow_mut().handle_event(event))
            }
            ModalAction::ExitAnimationEnded => {
                self.finish_exit();
                true
            }
            ModalAction::FocusCycled | ModalAction::Blocked => true,
        }
    }

    fn closer(&self) -> Option<Rc<dyn ModalCloser>> {
        self.inner.borrow().closer.clone()
    }

    pub(crate) fn id(&self) -> ModalId {
        self.inner.borrow().id
    }

    pub(crate) fn phase(&self) -> ModalPhase {
        self.inner.borrow().phase
    }

    pub(crate) fn nodes(&self) -> ModalNodes {
        self.inner.borrow().nodes
    }

    pub(crate) fn resting_rect(&self) -> Rect {
        self.inner.borrow().resting
    }

    pub(crate) fn origin(&self) -> Option<OriginOffset> {
        self.inner.borrow().origin
    }
}
