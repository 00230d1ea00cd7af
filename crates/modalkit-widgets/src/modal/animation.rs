#![forbid(unsafe_code)]

//! Animation kinds, container lifecycle phases and origin math.
//!
//! Animations are declarative: the container tags its panel with the class
//! for the chosen [`ModalAnimation`] and toggles [`OPEN_CLASS`] on its root.
//! The host's styling decides what actually moves; the container only
//! listens for the panel's animation-end event (or a fallback timer) to know
//! when an exit has finished.

use modalkit_core::Rect;

/// Class toggled on the container root while the dialog is in its open state.
pub const OPEN_CLASS: &str = "modal-open";
/// Class of the full-viewport layer behind the panel.
pub const BACKDROP_CLASS: &str = "modal-backdrop";
/// Class of the dialog panel.
pub const PANEL_CLASS: &str = "modal-panel";
/// Class of the element hosted content is mounted into.
pub const CONTENT_CLASS: &str = "modal-content";
/// Class of a per-dialog container element.
pub const CONTAINER_CLASS: &str = "modal-container";
/// Class of the shared element every container is attached to.
pub const OVERLAY_ROOT_CLASS: &str = "modal-overlay-root";

/// Entrance/exit animation style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ModalAnimation {
    /// Opacity transition only.
    Fade,
    /// Scale up from slightly smaller while fading in.
    #[default]
    Scale,
    /// Rise from below the resting position.
    SlideUp,
    /// Drop from above the resting position.
    SlideDown,
    /// Grow out of the trigger element's position.
    Origin,
    /// No animation.
    None,
}

impl ModalAnimation {
    /// Panel class selecting this animation, or `None` for [`ModalAnimation::None`].
    pub const fn class_name(self) -> Option<&'static str> {
        match self {
            Self::Fade => Some("modal-anim-fade"),
            Self::Scale => Some("modal-anim-scale"),
            Self::SlideUp => Some("modal-anim-slide-up"),
            Self::SlideDown => Some("modal-anim-slide-down"),
            Self::Origin => Some("modal-anim-origin"),
            Self::None => None,
        }
    }

    pub const fn is_animated(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Lifecycle phase of a modal container.
///
/// ```text
/// Constructing ──attach─▶ Entering ──frame──▶ Open
///       │                    │                  │
///       └────────────────────┴──── close ───────┴──▶ Exiting ──end/timeout──▶ Destroyed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalPhase {
    /// Nodes mounted, content not yet attached.
    Constructing,
    /// Content attached, waiting one frame before showing the open state.
    Entering,
    /// Open state applied; fully interactive.
    Open,
    /// Close accepted; waiting for the exit animation or the fallback timer.
    Exiting,
    /// Nodes removed. Terminal.
    Destroyed,
}

impl ModalPhase {
    /// Whether backdrop clicks and keys are routed in this phase.
    pub const fn accepts_input(self) -> bool {
        matches!(self, Self::Entering | Self::Open)
    }

    /// Whether the exit sequence has started.
    pub const fn is_closing(self) -> bool {
        matches!(self, Self::Exiting | Self::Destroyed)
    }
}

/// Start offset of an origin animation, in cells.
///
/// The panel starts displaced by `(dx, dy)` from its resting position, so
/// that its centre coincides with the trigger element's centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OriginOffset {
    pub dx: i32,
    pub dy: i32,
}

impl OriginOffset {
    /// Offset from the resting panel centre to the trigger centre.
    pub fn between(trigger: Rect, resting: Rect) -> Self {
        let (tx, ty) = trigger.center();
        let (rx, ry) = resting.center();
        Self {
            dx: tx - rx,
            dy: ty - ry,
        }
    }
}
