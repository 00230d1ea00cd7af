#![forbid(unsafe_code)]

//! Platform primitives for modalkit.
//!
//! This crate owns the vocabulary the overlay layer is written against:
//!
//! - [`geometry`]: cell-space rectangles and sizes.
//! - [`event`]: key, mouse and animation events delivered by the host.
//! - [`document`]: a headless, single-threaded element tree with focus,
//!   viewport/scroll state, CSS-like selectors and a reference-counted
//!   scroll lock.
//!
//! Hosts (terminal, web, GUI) either drive their UI from a [`document::Document`]
//! directly or mirror their own tree into one.

pub mod document;
pub mod event;
pub mod geometry;

pub use document::{Document, NodeId, ScrollLockGuard, ScrollOffset};
pub use geometry::{Rect, Size};
