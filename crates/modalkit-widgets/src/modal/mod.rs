#![forbid(unsafe_code)]

//! Stacked overlay dialogs.
//!
//! [`ModalStack::open`] mounts a container (backdrop + panel) under a shared
//! overlay root, hands the content factory a [`HostScope`] and returns a
//! [`ModalHandle`]. Closing through the handle tears the container down in
//! two steps: the stack entry and focus restoration happen immediately, the
//! nodes are removed once the exit animation ends or the fallback timer
//! fires.
//!
//! # Example
//!
//! ```
//! use modalkit_core::{Document, Size};
//! use modalkit_runtime::Scheduler;
//! use modalkit_widgets::modal::{Dialog, DialogResult, ModalStack};
//!
//! let doc = Document::new(Size::new(80, 24));
//! let stack = ModalStack::new(doc.clone(), Scheduler::new());
//!
//! let dialog = Dialog::confirm("Delete file?", "This cannot be undone.");
//! let config = dialog.modal_config();
//! let handle = stack.open(dialog, config);
//! handle.close(Some(DialogResult::Ok));
//! assert_eq!(
//!     handle.close_event().and_then(|e| e.result.clone()),
//!     Some(DialogResult::Ok)
//! );
//! ```

mod animation;
mod config;
mod container;
mod dialog;
mod handle;
mod host;
mod stack;

pub use animation::{
    BACKDROP_CLASS, CONTAINER_CLASS, CONTENT_CLASS, ModalAnimation, ModalPhase, OPEN_CLASS,
    OVERLAY_ROOT_CLASS, OriginOffset, PANEL_CLASS,
};
pub use config::{
    BASE_MODAL_Z, EXIT_FALLBACK_MS, ModalConfig, ModalRole, ModalSettings, ModalSizeConstraints,
    StackConfig, Z_INCREMENT,
};
pub use container::ModalNodes;
pub use dialog::{Dialog, DialogBuilder, DialogButton, DialogContent, DialogKind, DialogResult};
pub use handle::{AnyModal, CloseEvent, CloseReason, ModalHandle, ModalId, ModalRef};
pub use host::{ContentFactory, HostScope, HostedContent, HostedInstance};
pub use stack::ModalStack;
