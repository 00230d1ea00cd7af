#![forbid(unsafe_code)]

//! Input events delivered by the host.
//!
//! Events are plain data. Mouse events may carry the element they were
//! dispatched to; when absent, consumers resolve the target with
//! [`Document::hit_test`](crate::document::Document::hit_test).

use bitflags::bitflags;

use crate::document::NodeId;

/// A host event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Keyboard input.
    Key(KeyEvent),
    /// Pointer input.
    Mouse(MouseEvent),
    /// A transition or animation on an element changed state.
    Animation(AnimationEvent),
}

/// Key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Tab,
    /// Shift+Tab as reported by terminals that fold the modifier in.
    BackTab,
    Backspace,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

bitflags! {
    /// Keyboard modifiers held during an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const CTRL = 0b0000_0010;
        const ALT = 0b0000_0100;
        const SUPER = 0b0000_1000;
    }
}

/// Key press phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A key press with no modifiers.
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
        }
    }

    /// Set the held modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether this is a press (or auto-repeat) rather than a release.
    #[inline]
    pub fn is_press(&self) -> bool {
        matches!(self.kind, KeyEventKind::Press | KeyEventKind::Repeat)
    }

    /// Tab navigation direction: `Some(false)` forward, `Some(true)` backward.
    ///
    /// `None` when a modifier other than Shift is held, so chords such as
    /// Ctrl+Tab stay with the host.
    pub fn tab_direction(&self) -> Option<bool> {
        if !(self.modifiers - Modifiers::SHIFT).is_empty() {
            return None;
        }
        match self.code {
            KeyCode::Tab => Some(self.modifiers.contains(Modifiers::SHIFT)),
            KeyCode::BackTab => Some(true),
            _ => None,
        }
    }
}

impl From<KeyEvent> for Event {
    fn from(key: KeyEvent) -> Self {
        Self::Key(key)
    }
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Mouse event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Down(MouseButton),
    Up(MouseButton),
    Moved,
}

/// A pointer event in cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub x: u16,
    pub y: u16,
    /// Element the host dispatched this event to, if already resolved.
    pub target: Option<NodeId>,
}

impl MouseEvent {
    /// Create a mouse event at `(x, y)` with no resolved target.
    pub const fn new(kind: MouseEventKind, x: u16, y: u16) -> Self {
        Self {
            kind,
            x,
            y,
            target: None,
        }
    }

    /// A left-button press dispatched directly to `target`.
    pub const fn click(target: NodeId) -> Self {
        Self {
            kind: MouseEventKind::Down(MouseButton::Left),
            x: 0,
            y: 0,
            target: Some(target),
        }
    }

    /// Attach a resolved target.
    #[must_use]
    pub const fn with_target(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }

    /// Whether this is a primary-button press.
    #[inline]
    pub fn is_primary_down(&self) -> bool {
        matches!(self.kind, MouseEventKind::Down(MouseButton::Left))
    }
}

impl From<MouseEvent> for Event {
    fn from(mouse: MouseEvent) -> Self {
        Self::Mouse(mouse)
    }
}

/// Animation event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationEventKind {
    Start,
    /// The element finished its transition or animation.
    End,
    Cancel,
}

/// An animation lifecycle event targeted at one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationEvent {
    pub kind: AnimationEventKind,
    pub target: NodeId,
}

impl AnimationEvent {
    /// Completion event for `target`.
    pub const fn end(target: NodeId) -> Self {
        Self {
            kind: AnimationEventKind::End,
            target,
        }
    }
}

impl From<AnimationEvent> for Event {
    fn from(animation: AnimationEvent) -> Self {
        Self::Animation(animation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_direction() {
        assert_eq!(KeyEvent::new(KeyCode::Tab).tab_direction(), Some(false));
        assert_eq!(
            KeyEvent::new(KeyCode::Tab)
                .with_modifiers(Modifiers::SHIFT)
                .tab_direction(),
            Some(true)
        );
        assert_eq!(KeyEvent::new(KeyCode::BackTab).tab_direction(), Some(true));
        assert_eq!(KeyEvent::new(KeyCode::Enter).tab_direction(), None);
    }

    #[test]
    fn tab_chords_are_not_navigation() {
        for mods in [
            Modifiers::CTRL,
            Modifiers::ALT,
            Modifiers::SUPER,
            Modifiers::CTRL | Modifiers::SHIFT,
        ] {
            let key = KeyEvent::new(KeyCode::Tab).with_modifiers(mods);
            assert_eq!(key.tab_direction(), None, "{mods:?}");
        }
        let back = KeyEvent::new(KeyCode::BackTab).with_modifiers(Modifiers::ALT);
        assert_eq!(back.tab_direction(), None);
    }

    #[test]
    fn release_is_not_press() {
        let mut key = KeyEvent::new(KeyCode::Escape);
        assert!(key.is_press());
        key.kind = KeyEventKind::Release;
        assert!(!key.is_press());
    }
}
