#![forbid(unsafe_code)]

//! Hosting arbitrary content inside a dialog panel.
//!
//! The stack never looks inside hosted content. It hands the factory a
//! [`HostScope`] (the control handle, the data payload and the node to build
//! under) and keeps the returned instance alive until the container is
//! destroyed.

use std::cell::RefCell;
use std::rc::Rc;

use modalkit_core::event::Event;
use modalkit_core::{Document, NodeId};

use crate::modal::ModalHandle;

/// Everything hosted content receives at creation.
pub struct HostScope<D, R> {
    /// Control handle of the dialog hosting this content.
    pub handle: ModalHandle<D, R>,
    /// The payload passed to `open`, shared with [`ModalHandle::data`].
    pub data: Rc<D>,
    pub document: Document,
    /// Element the content mounts its nodes under.
    pub host: NodeId,
}

/// A live content instance mounted in a dialog.
pub trait HostedContent {
    /// Handle an input event that landed inside the panel and was not
    /// consumed by the dialog itself. Return `true` if consumed.
    fn handle_event(&mut self, _event: &Event) -> bool {
        false
    }

    /// Called once after the container removed its nodes.
    fn on_destroy(&mut self) {}
}

impl HostedContent for () {}

/// Shared, type-erased content instance.
pub type HostedInstance = Rc<RefCell<dyn HostedContent>>;

/// Builds the content of a dialog.
///
/// Implemented for closures `FnOnce(HostScope<D, R>) -> C` where
/// `C: HostedContent`, and for [`Dialog`](crate::modal::Dialog).
pub trait ContentFactory<D, R> {
    fn create_hosted(self, scope: HostScope<D, R>) -> HostedInstance;
}

impl<D, R, F, C> ContentFactory<D, R> for F
where
    F: FnOnce(HostScope<D, R>) -> C,
    C: HostedContent + 'static,
{
    fn create_hosted(self, scope: HostScope<D, R>) -> HostedInstance {
        Rc::new(RefCell::new(self(scope)))
    }
}
