#![forbid(unsafe_code)]

//! Dialog presets usable as modal content.
//!
//! Provides common dialog patterns:
//! - Alert: message with an OK button
//! - Confirm: message with OK/Cancel
//! - Custom: builder for arbitrary buttons
//!
//! A [`Dialog`] is a [`ContentFactory`]: pass it to
//! [`ModalStack::open`](crate::modal::ModalStack::open) and its buttons close
//! the handle with the matching [`DialogResult`].
//!
//! # Example
//!
//! ```ignore
//! let dialog = Dialog::confirm("Delete file?", "This action cannot be undone.");
//! let handle = stack.open(dialog.clone(), dialog.modal_config());
//! handle.after_closed(|e| println!("{:?}", e.result)).detach();
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use modalkit_core::event::{Event, KeyCode};
use modalkit_core::{Document, NodeId};

use crate::modal::host::{ContentFactory, HostScope, HostedContent, HostedInstance};
use crate::modal::{ModalConfig, ModalHandle, ModalRole, ModalSizeConstraints};

/// Result from a dialog interaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DialogResult {
    /// OK / primary button pressed.
    Ok,
    /// Cancel / secondary button pressed.
    Cancel,
    /// Custom button pressed with its ID.
    Custom(String),
}

/// A button in a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogButton {
    /// Display label.
    pub label: String,
    /// Unique identifier.
    pub id: String,
    /// Whether this is the primary/default button.
    pub primary: bool,
}

impl DialogButton {
    /// Create a new dialog button.
    pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
            primary: false,
        }
    }

    /// Mark as primary button.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Result this button closes the dialog with.
    pub fn result(&self) -> DialogResult {
        match self.id.as_str() {
            "ok" => DialogResult::Ok,
            "cancel" => DialogResult::Cancel,
            other => DialogResult::Custom(other.to_owned()),
        }
    }
}

/// Dialog type variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    /// Alert: single OK button.
    Alert,
    /// Confirm: OK + Cancel buttons.
    Confirm,
    /// Custom dialog.
    Custom,
}

/// A title, a message and a row of buttons.
///
/// Invariants:
/// - At least one button is always present (builders fall back to OK).
/// - Arrow-key focus movement between buttons wraps around.
///
/// Failure modes:
/// - Empty title/message is allowed; the element is still created so
///   `aria-labelledby`/`aria-describedby` stay valid.
#[derive(Debug, Clone)]
pub struct Dialog {
    title: String,
    message: String,
    buttons: Vec<DialogButton>,
    kind: DialogKind,
    config: ModalConfig,
}

impl Dialog {
    /// Create an alert dialog (message + OK).
    pub fn alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            buttons: vec![DialogButton::new("OK", "ok").primary()],
            kind: DialogKind::Alert,
            config: ModalConfig::new().role(ModalRole::AlertDialog),
        }
    }

    /// Create a confirm dialog (message + OK/Cancel).
    pub fn confirm(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            buttons: vec![
                DialogButton::new("OK", "ok").primary(),
                DialogButton::new("Cancel", "cancel"),
            ],
            kind: DialogKind::Confirm,
            config: ModalConfig::new(),
        }
    }

    /// Create a custom dialog with a builder.
    pub fn custom(title: impl Into<String>, message: impl Into<String>) -> DialogBuilder {
        DialogBuilder {
            title: title.into(),
            message: message.into(),
            buttons: Vec::new(),
            config: ModalConfig::new(),
        }
    }

    /// Replace the modal configuration suggested by [`modal_config`](Self::modal_config).
    pub fn with_modal_config(mut self, config: ModalConfig) -> Self {
        self.config = config;
        self
    }

    /// Configuration to open this dialog with: dialog-sized panel plus the
    /// preset's role.
    pub fn modal_config(&self) -> ModalConfig {
        let mut config = self.config.clone();
        if config.size.is_none() {
            config.size = Some(ModalSizeConstraints::dialog());
        }
        config
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn buttons(&self) -> &[DialogButton] {
        &self.buttons
    }

    pub fn kind(&self) -> DialogKind {
        self.kind
    }
}

/// Builder for custom dialogs.
#[derive(Debug, Clone)]
pub struct DialogBuilder {
    title: String,
    message: String,
    buttons: Vec<DialogButton>,
    config: ModalConfig,
}

impl DialogBuilder {
    /// Add a button.
    pub fn button(mut self, button: DialogButton) -> Self {
        self.buttons.push(button);
        self
    }

    /// Add a primary OK button.
    pub fn ok_button(self) -> Self {
        self.button(DialogButton::new("OK", "ok").primary())
    }

    /// Add a Cancel button.
    pub fn cancel_button(self) -> Self {
        self.button(DialogButton::new("Cancel", "cancel"))
    }

    /// Add a button closing with [`DialogResult::Custom`].
    pub fn custom_button(self, label: impl Into<String>, id: impl Into<String>) -> Self {
        self.button(DialogButton::new(label, id))
    }

    /// Set the modal configuration.
    pub fn modal_config(mut self, config: ModalConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the dialog.
    pub fn build(self) -> Dialog {
        let mut buttons = self.buttons;
        if buttons.is_empty() {
            buttons.push(DialogButton::new("OK", "ok").primary());
        }
        Dialog {
            title: self.title,
            message: self.message,
            buttons,
            kind: DialogKind::Custom,
            config: self.config,
        }
    }
}

/// Mounted dialog content.
pub struct DialogContent<D> {
    handle: ModalHandle<D, DialogResult>,
    document: Document,
    title: NodeId,
    message: NodeId,
    buttons: Vec<(NodeId, DialogButton)>,
}

impl<D> fmt::Debug for DialogContent<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogContent")
            .field("modal", &self.handle.id())
            .field("buttons", &self.buttons.len())
            .finish()
    }
}

impl<D> DialogContent<D> {
    pub fn title_node(&self) -> NodeId {
        self.title
    }

    pub fn message_node(&self) -> NodeId {
        self.message
    }

    /// Button elements in display order.
    pub fn button_nodes(&self) -> Vec<NodeId> {
        self.buttons.iter().map(|(node, _)| *node).collect()
    }

    fn focused_button(&self) -> Option<usize> {
        let active = self.document.active_element()?;
        self.buttons.iter().position(|(node, _)| *node == active)
    }

    fn primary_button(&self) -> Option<usize> {
        self.buttons
            .iter()
            .position(|(_, b)| b.primary)
            .or((!self.buttons.is_empty()).then_some(0))
    }

    fn move_focus(&self, forward: bool) -> bool {
        let len = self.buttons.len();
        if len == 0 {
            return false;
        }
        let next = match self.focused_button() {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.document.focus(self.buttons[next].0)
    }
}

impl<D: 'static> DialogContent<D> {
    fn activate(&self, index: usize) -> bool {
        match self.buttons.get(index) {
            Some((_, button)) => {
                self.handle.close(Some(button.result()));
                true
            }
            None => false,
        }
    }
}

impl<D: 'static> HostedContent for DialogContent<D> {
    fn handle_event(&mut self, event: &Event) -> bool {
        match event {
            Event::Key(key) if key.is_press() => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    let index = match self.focused_button() {
                        Some(i) => Some(i),
                        None if key.code == KeyCode::Enter => self.primary_button(),
                        None => None,
                    };
                    index.is_some_and(|i| self.activate(i))
                }
                KeyCode::Left | KeyCode::Up => self.move_focus(false),
                KeyCode::Right | KeyCode::Down => self.move_focus(true),
                _ => false,
            },
            Event::Mouse(mouse) if mouse.is_primary_down() => {
                let target = mouse
                    .target
                    .or_else(|| self.document.hit_test(mouse.x, mouse.y));
                let index = target.and_then(|t| {
                    self.buttons
                        .iter()
                        .position(|(node, _)| self.document.contains(*node, t))
                });
                index.is_some_and(|i| self.activate(i))
            }
            _ => false,
        }
    }
}

impl<D: 'static> ContentFactory<D, DialogResult> for Dialog {
    fn create_hosted(self, scope: HostScope<D, DialogResult>) -> HostedInstance {
        let doc = scope.document;
        let prefix = scope.handle.id().to_string();

        let title = doc.create_element("h2");
        doc.add_class(title, "modal-title");
        doc.set_attribute(title, "id", format!("{prefix}-title"));
        doc.set_attribute(title, "data-text", self.title);
        doc.append_child(scope.host, title);

        let message = doc.create_element("p");
        doc.add_class(message, "modal-message");
        doc.set_attribute(message, "id", format!("{prefix}-message"));
        doc.set_attribute(message, "data-text", self.message);
        doc.append_child(scope.host, message);

        let actions = doc.create_element("div");
        doc.add_class(actions, "modal-actions");
        doc.append_child(scope.host, actions);

        let buttons = self
            .buttons
            .into_iter()
            .map(|button| {
                let node = doc.create_element("button");
                doc.set_attribute(node, "data-button-id", button.id.as_str());
                doc.set_attribute(node, "data-text", button.label.as_str());
                if button.primary {
                    doc.add_class(node, "primary");
                }
                doc.append_child(actions, node);
                (node, button)
            })
            .collect();

        // Label the panel by our own title unless configured otherwise.
        if let Some(panel) = doc.parent(scope.host) {
            if !doc.has_attribute(panel, "aria-labelledby")
                && !doc.has_attribute(panel, "aria-label")
            {
                doc.set_attribute(panel, "aria-labelledby", format!("{prefix}-title"));
            }
            if !doc.has_attribute(panel, "aria-describedby") {
                doc.set_attribute(panel, "aria-describedby", format!("{prefix}-message"));
            }
        }

        Rc::new(RefCell::new(DialogContent {
            handle: scope.handle,
            document: doc,
            title,
            message,
            buttons,
        }))
    }
}
