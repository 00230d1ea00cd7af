#![forbid(unsafe_code)]

//! Focus trap: Tab-key cycling confined to one element subtree.
//!
//! A [`FocusTrap`] computes the live set of tabbable descendants of its root
//! (elements matching the focusable selector, rendered, and without a
//! negative `tabindex`) every time it needs them, so content added or hidden
//! after activation is picked up without re-registration.
//!
//! # Invariants
//!
//! 1. Tab on the last tabbable wraps to the first; Shift+Tab on the first
//!    wraps to the last.
//! 2. If focus sits outside the root, the next Tab focuses the first tabbable.
//! 3. Deactivation restores the element focused before activation (or the
//!    one recorded by [`FocusTrap::remember_focus`]), but only if it is still
//!    connected and outside the root.
//! 4. A temporary `tabindex="-1"` added for [`AutoFocus::Dialog`] is removed
//!    on deactivation.
//!
//! # Failure Modes
//!
//! - No tabbable descendants: Tab is swallowed and focus stays put.
//! - [`AutoFocus::Selector`] that fails to parse or match: falls back to the
//!   first tabbable descendant.

use modalkit_core::document::selector::{SelectorError, SelectorList};
use modalkit_core::event::KeyEvent;
use modalkit_core::{Document, NodeId};

/// Selector list for elements that can take keyboard focus.
pub const DEFAULT_FOCUSABLE_SELECTOR: &str = "a[href], area[href], \
    button:not([disabled]), input:not([disabled]):not([type='hidden']), \
    select:not([disabled]), textarea:not([disabled]), iframe, \
    [tabindex]:not([tabindex='-1']), [contenteditable]";

/// Initial focus policy applied when a trap activates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AutoFocus {
    /// Focus the first tabbable descendant (the root if there is none).
    #[default]
    FirstTabbable,
    /// Focus the trap root itself.
    Dialog,
    /// Focus a specific element.
    Node(NodeId),
    /// Focus the first descendant matching a selector.
    Selector(String),
    /// Leave focus where it is.
    Disabled,
}

impl From<bool> for AutoFocus {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::FirstTabbable
        } else {
            Self::Disabled
        }
    }
}

impl From<NodeId> for AutoFocus {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

/// Constrains Tab navigation to the descendants of one element.
#[derive(Debug)]
pub struct FocusTrap {
    document: Document,
    root: NodeId,
    selector: SelectorList,
    previous: Option<NodeId>,
    temporary_tabindex: bool,
    restore: bool,
    active: bool,
}

impl FocusTrap {
    /// Create an inactive trap around `root` with the default selector.
    pub fn new(document: Document, root: NodeId) -> Self {
        Self {
            document,
            root,
            selector: SelectorList::parse(DEFAULT_FOCUSABLE_SELECTOR).unwrap_or_default(),
            previous: None,
            temporary_tabindex: false,
            restore: true,
            active: false,
        }
    }

    /// Whether [`deactivate`](Self::deactivate) refocuses the element that
    /// held focus before activation. Defaults to `true`.
    #[must_use]
    pub fn restore_focus(mut self, restore: bool) -> Self {
        self.restore = restore;
        self
    }

    /// Replace the focusable selector.
    #[must_use]
    pub fn with_selector(mut self, selector: SelectorList) -> Self {
        self.selector = selector;
        self
    }

    /// Treat elements matching `selector` as focusable too.
    pub fn extend_selector(&mut self, selector: &str) -> Result<(), SelectorError> {
        self.selector.extend(SelectorList::parse(selector)?);
        Ok(())
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The element that held focus when the trap activated.
    pub fn previously_focused(&self) -> Option<NodeId> {
        self.previous
    }

    /// Record the current focus as the restore target ahead of activation.
    pub fn remember_focus(&mut self) {
        if !self.active {
            self.previous = self.document.active_element();
        }
    }

    /// Replace the element focus returns to on deactivation.
    pub fn set_restore_target(&mut self, target: Option<NodeId>) {
        self.previous = target;
    }

    /// Live tabbable descendants of the root, in document order.
    pub fn focusable_elements(&self) -> Vec<NodeId> {
        let doc = &self.document;
        doc.query_all(self.root, &self.selector)
            .into_iter()
            .filter(|&id| {
                doc.is_rendered(id)
                    && doc
                        .attribute(id, "tabindex")
                        .and_then(|t| t.trim().parse::<i32>().ok())
                        .is_none_or(|t| t >= 0)
            })
            .collect()
    }

    /// Activate the trap: remember the current focus, then apply `auto_focus`.
    ///
    /// Returns the element that received focus, if any.
    pub fn activate(&mut self, auto_focus: &AutoFocus) -> Option<NodeId> {
        let focused = self
            .engage(auto_focus)
            .filter(|&target| self.document.focus(target));

        #[cfg(feature = "tracing")]
        tracing::debug!(root = %self.root, ?auto_focus, ?focused, "focus trap activated");

        focused
    }

    /// Activate without moving focus.
    ///
    /// Returns the element [`activate`](Self::activate) would have focused.
    pub fn arm(&mut self, auto_focus: &AutoFocus) -> Option<NodeId> {
        let target = self.engage(auto_focus);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            root = %self.root,
            ?auto_focus,
            ?target,
            "focus trap activated, focus deferred"
        );

        target
    }

    fn engage(&mut self, auto_focus: &AutoFocus) -> Option<NodeId> {
        if !self.active {
            if self.previous.is_none() {
                self.previous = self.document.active_element();
            }
            self.active = true;
        }
        self.initial_target(auto_focus)
    }

    fn initial_target(&mut self, auto_focus: &AutoFocus) -> Option<NodeId> {
        match auto_focus {
            AutoFocus::Disabled => None,
            AutoFocus::FirstTabbable => self.first_tabbable().or_else(|| self.root_target()),
            AutoFocus::Dialog => self.root_target(),
            AutoFocus::Node(node) if self.document.is_connected(*node) => Some(*node),
            AutoFocus::Node(_) => self.first_tabbable(),
            AutoFocus::Selector(selector) => {
                match self.document.query_selector(self.root, selector) {
                    Ok(Some(node)) => Some(node),
                    _ => self.first_tabbable(),
                }
            }
        }
    }

    fn first_tabbable(&self) -> Option<NodeId> {
        self.focusable_elements().first().copied()
    }

    fn root_target(&mut self) -> Option<NodeId> {
        if !self.document.has_attribute(self.root, "tabindex") {
            self.document.set_attribute(self.root, "tabindex", "-1");
            self.temporary_tabindex = true;
        }
        self.document.is_connected(self.root).then_some(self.root)
    }

    /// Handle a key event. Returns `true` if it was a Tab press the trap consumed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if !self.active || !key.is_press() {
            return false;
        }
        match key.tab_direction() {
            Some(reverse) => {
                self.cycle(reverse);
                true
            }
            None => false,
        }
    }

    /// Move focus to the next (or previous) tabbable element, wrapping at
    /// the ends. Returns the newly focused element.
    pub fn cycle(&mut self, reverse: bool) -> Option<NodeId> {
        let list = self.focusable_elements();
        let last = list.len().checked_sub(1)?;
        let active = self.document.active_element();
        let position = active.and_then(|a| list.iter().position(|&n| n == a));

        let next = match position {
            Some(i) if reverse => {
                if i == 0 {
                    last
                } else {
                    i - 1
                }
            }
            Some(i) => {
                if i == last {
                    0
                } else {
                    i + 1
                }
            }
            // Focus on the root itself or a non-tabbable descendant.
            None if reverse && active.is_some_and(|a| self.document.contains(self.root, a)) => {
                last
            }
            None => 0,
        };

        let target = list[next];
        self.document.focus(target).then_some(target)
    }

    /// Deactivate and, unless disabled, restore the previously focused element.
    ///
    /// Returns `true` if focus was restored.
    pub fn deactivate(&mut self) -> bool {
        self.deactivate_with_restore(self.restore)
    }

    /// Deactivate, restoring focus only if `restore` is set.
    pub fn deactivate_with_restore(&mut self, restore: bool) -> bool {
        let previous = self.previous.take();
        if !self.active {
            return false;
        }
        self.active = false;
        if std::mem::take(&mut self.temporary_tabindex) {
            self.document.remove_attribute(self.root, "tabindex");
        }
        let doc = &self.document;
        let restored = match previous {
            Some(prev) if restore && doc.is_connected(prev) && !doc.contains(self.root, prev) => {
                doc.focus(prev)
            }
            _ => false,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(root = %self.root, restored, "focus trap deactivated");

        restored
    }
}
