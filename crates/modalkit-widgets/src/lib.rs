#![forbid(unsafe_code)]

//! Overlay dialogs for modalkit.
//!
//! - [`modal::ModalStack`]: opens dialogs, owns z-order and focus restoration.
//! - [`modal::ModalHandle`]: per-dialog control object and close notification.
//! - [`focus_trap::FocusTrap`]: Tab cycling confined to one subtree.
//! - [`modal::Dialog`]: alert/confirm presets usable as dialog content.

pub mod focus_trap;
pub mod modal;

pub use focus_trap::{AutoFocus, FocusTrap};
pub use modal::{
    CloseEvent, CloseReason, Dialog, DialogResult, ModalAnimation, ModalConfig, ModalHandle,
    ModalId, ModalStack, StackConfig,
};
