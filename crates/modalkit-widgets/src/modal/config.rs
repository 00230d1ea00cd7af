#![forbid(unsafe_code)]

//! Per-dialog and per-stack configuration.
//!
//! [`ModalConfig`] is a partial configuration: every field left unset falls
//! back to the stack's defaults (see [`StackConfig::defaults`]) and then to
//! the built-in value. [`ModalConfig::resolve`] produces the concrete
//! [`ModalSettings`] a dialog runs with.
//!
//! | Field | Built-in default |
//! |---|---|
//! | `animation` | [`ModalAnimation::Scale`] |
//! | `size` | unconstrained (fills the viewport) |
//! | `has_backdrop` | `true` |
//! | `close_on_backdrop` / `close_on_escape` | `true` |
//! | `restore_focus` | `true` |
//! | `auto_focus` | [`AutoFocus::FirstTabbable`] |
//! | `role` | [`ModalRole::Dialog`] |

use std::time::Duration;

use modalkit_core::{NodeId, Size};

use crate::focus_trap::AutoFocus;
use crate::modal::ModalAnimation;

/// ARIA role of the dialog panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ModalRole {
    #[default]
    Dialog,
    /// Interrupting dialog that demands a response.
    AlertDialog,
}

impl ModalRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dialog => "dialog",
            Self::AlertDialog => "alertdialog",
        }
    }
}

/// Panel size: preferred width/height plus min/max bounds.
///
/// The result never exceeds the available area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ModalSizeConstraints {
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub min_width: Option<u16>,
    pub max_width: Option<u16>,
    pub min_height: Option<u16>,
    pub max_height: Option<u16>,
}

impl ModalSizeConstraints {
    /// No preferred size and no bounds.
    pub const fn new() -> Self {
        Self {
            width: None,
            height: None,
            min_width: None,
            max_width: None,
            min_height: None,
            max_height: None,
        }
    }

    /// Bounds suited to a short message dialog.
    pub const fn dialog() -> Self {
        Self {
            width: None,
            height: None,
            min_width: Some(30),
            max_width: Some(60),
            min_height: Some(10),
            max_height: Some(20),
        }
    }

    pub fn width(mut self, value: u16) -> Self {
        self.width = Some(value);
        self
    }

    pub fn height(mut self, value: u16) -> Self {
        self.height = Some(value);
        self
    }

    pub fn min_width(mut self, value: u16) -> Self {
        self.min_width = Some(value);
        self
    }

    pub fn max_width(mut self, value: u16) -> Self {
        self.max_width = Some(value);
        self
    }

    pub fn min_height(mut self, value: u16) -> Self {
        self.min_height = Some(value);
        self
    }

    pub fn max_height(mut self, value: u16) -> Self {
        self.max_height = Some(value);
        self
    }

    /// Clamp to these constraints, never exceeding `available`.
    pub fn clamp(self, available: Size) -> Size {
        let axis = |preferred: Option<u16>, min: Option<u16>, max: Option<u16>, avail: u16| {
            let mut v = preferred.unwrap_or(avail).min(avail);
            if let Some(max) = max {
                v = v.min(max);
            }
            if let Some(min) = min {
                v = v.max(min).min(avail);
            }
            v
        };
        Size::new(
            axis(self.width, self.min_width, self.max_width, available.width),
            axis(self.height, self.min_height, self.max_height, available.height),
        )
    }
}

/// Partial per-dialog configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalConfig {
    pub animation: Option<ModalAnimation>,
    /// Element the origin animation grows out of.
    pub animation_origin: Option<NodeId>,
    pub size: Option<ModalSizeConstraints>,
    pub has_backdrop: Option<bool>,
    pub backdrop_class: Vec<String>,
    pub panel_class: Vec<String>,
    pub close_on_backdrop: Option<bool>,
    pub close_on_escape: Option<bool>,
    pub restore_focus: Option<bool>,
    pub auto_focus: Option<AutoFocus>,
    /// Explicit backdrop z-index; the stack computes one otherwise.
    pub z_index: Option<u32>,
    pub role: Option<ModalRole>,
    pub aria_label: Option<String>,
    pub aria_labelledby: Option<String>,
    pub aria_describedby: Option<String>,
}

impl ModalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn animation(mut self, animation: ModalAnimation) -> Self {
        self.animation = Some(animation);
        self
    }

    /// Use the origin animation, growing out of `trigger`.
    pub fn animate_from(mut self, trigger: NodeId) -> Self {
        self.animation = Some(ModalAnimation::Origin);
        self.animation_origin = Some(trigger);
        self
    }

    pub fn size(mut self, size: ModalSizeConstraints) -> Self {
        self.size = Some(size);
        self
    }

    pub fn backdrop(mut self, enabled: bool) -> Self {
        self.has_backdrop = Some(enabled);
        self
    }

    pub fn backdrop_class(mut self, class: impl Into<String>) -> Self {
        self.backdrop_class.push(class.into());
        self
    }

    pub fn panel_class(mut self, class: impl Into<String>) -> Self {
        self.panel_class.push(class.into());
        self
    }

    pub fn close_on_backdrop(mut self, close: bool) -> Self {
        self.close_on_backdrop = Some(close);
        self
    }

    pub fn close_on_escape(mut self, close: bool) -> Self {
        self.close_on_escape = Some(close);
        self
    }

    pub fn restore_focus(mut self, restore: bool) -> Self {
        self.restore_focus = Some(restore);
        self
    }

    pub fn auto_focus(mut self, auto_focus: impl Into<AutoFocus>) -> Self {
        self.auto_focus = Some(auto_focus.into());
        self
    }

    pub fn z_index(mut self, z: u32) -> Self {
        self.z_index = Some(z);
        self
    }

    pub fn role(mut self, role: ModalRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn aria_label(mut self, label: impl Into<String>) -> Self {
        self.aria_label = Some(label.into());
        self
    }

    pub fn aria_labelledby(mut self, id: impl Into<String>) -> Self {
        self.aria_labelledby = Some(id.into());
        self
    }

    pub fn aria_describedby(mut self, id: impl Into<String>) -> Self {
        self.aria_describedby = Some(id.into());
        self
    }

    /// Layer `self` over `defaults`: set fields win, class lists concatenate
    /// with the defaults first.
    pub fn merged(&self, defaults: &ModalConfig) -> ModalConfig {
        fn pick<T: Clone>(own: &Option<T>, fallback: &Option<T>) -> Option<T> {
            own.as_ref().or(fallback.as_ref()).cloned()
        }
        fn concat(defaults: &[String], own: &[String]) -> Vec<String> {
            defaults.iter().chain(own).cloned().collect()
        }
        ModalConfig {
            animation: pick(&self.animation, &defaults.animation),
            animation_origin: pick(&self.animation_origin, &defaults.animation_origin),
            size: pick(&self.size, &defaults.size),
            has_backdrop: pick(&self.has_backdrop, &defaults.has_backdrop),
            backdrop_class: concat(&defaults.backdrop_class, &self.backdrop_class),
            panel_class: concat(&defaults.panel_class, &self.panel_class),
            close_on_backdrop: pick(&self.close_on_backdrop, &defaults.close_on_backdrop),
            close_on_escape: pick(&self.close_on_escape, &defaults.close_on_escape),
            restore_focus: pick(&self.restore_focus, &defaults.restore_focus),
            auto_focus: pick(&self.auto_focus, &defaults.auto_focus),
            z_index: pick(&self.z_index, &defaults.z_index),
            role: pick(&self.role, &defaults.role),
            aria_label: pick(&self.aria_label, &defaults.aria_label),
            aria_labelledby: pick(&self.aria_labelledby, &defaults.aria_labelledby),
            aria_describedby: pick(&self.aria_describedby, &defaults.aria_describedby),
        }
    }

    /// Merge with `defaults` and fill the remaining gaps with built-ins.
    pub fn resolve(&self, defaults: &ModalConfig) -> ModalSettings {
        let m = self.merged(defaults);
        ModalSettings {
            animation: m.animation.unwrap_or_default(),
            animation_origin: m.animation_origin,
            size: m.size.unwrap_or_default(),
            has_backdrop: m.has_backdrop.unwrap_or(true),
            backdrop_class: m.backdrop_class,
            panel_class: m.panel_class,
            close_on_backdrop: m.close_on_backdrop.unwrap_or(true),
            close_on_escape: m.close_on_escape.unwrap_or(true),
            restore_focus: m.restore_focus.unwrap_or(true),
            auto_focus: m.auto_focus.unwrap_or_default(),
            z_index: m.z_index,
            role: m.role.unwrap_or_default(),
            aria_label: m.aria_label,
            aria_labelledby: m.aria_labelledby,
            aria_describedby: m.aria_describedby,
        }
    }
}

/// Fully resolved configuration a dialog runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalSettings {
    pub animation: ModalAnimation,
    pub animation_origin: Option<NodeId>,
    pub size: ModalSizeConstraints,
    pub has_backdrop: bool,
    pub backdrop_class: Vec<String>,
    pub panel_class: Vec<String>,
    pub close_on_backdrop: bool,
    pub close_on_escape: bool,
    pub restore_focus: bool,
    pub auto_focus: AutoFocus,
    pub z_index: Option<u32>,
    pub role: ModalRole,
    pub aria_label: Option<String>,
    pub aria_labelledby: Option<String>,
    pub aria_describedby: Option<String>,
}

impl Default for ModalSettings {
    fn default() -> Self {
        ModalConfig::default().resolve(&ModalConfig::default())
    }
}

/// Base z-index for the modal layer.
pub const BASE_MODAL_Z: u32 = 1000;

/// Z-index step between stacked dialogs (leaves room for internal layers).
pub const Z_INCREMENT: u32 = 10;

/// Default wait for an exit animation before tearing down anyway.
pub const EXIT_FALLBACK_MS: u64 = 300;

/// Orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StackConfig {
    pub base_z_index: u32,
    /// Z-index step between stacked dialogs. Zero is treated as one.
    pub z_increment: u32,
    /// Exit fallback in milliseconds.
    pub exit_fallback_ms: u64,
    /// Merged beneath every dialog's own configuration.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub defaults: ModalConfig,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            base_z_index: BASE_MODAL_Z,
            z_increment: Z_INCREMENT,
            exit_fallback_ms: EXIT_FALLBACK_MS,
            defaults: ModalConfig::default(),
        }
    }
}

impl StackConfig {
    pub fn base_z_index(mut self, z: u32) -> Self {
        self.base_z_index = z;
        self
    }

    pub fn z_increment(mut self, step: u32) -> Self {
        self.z_increment = step.max(1);
        self
    }

    pub fn exit_fallback(mut self, fallback: Duration) -> Self {
        self.exit_fallback_ms = u64::try_from(fallback.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn defaults(mut self, defaults: ModalConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn exit_fallback_duration(&self) -> Duration {
        Duration::from_millis(self.exit_fallback_ms)
    }

    /// The increment actually applied; never zero, whatever the field holds.
    pub fn z_step(&self) -> u32 {
        self.z_increment.max(1)
    }

    /// Z-index for the `index`-th stacked dialog.
    pub fn z_for_index(&self, index: usize) -> u32 {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        self.base_z_index
            .saturating_add(index.saturating_mul(self.z_step()))
    }
}
