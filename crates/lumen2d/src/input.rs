//! Per-frame input snapshot
//!
//! The engine does not poll devices; the host translates whatever input
//! it reads into an [`InputState`] and hands it to every update. Buttons
//! are abstract indices so the core stays agnostic of keyboards,
//! gamepads, and editor shortcuts alike.

use crate::foundation::math::Vec2;

/// Abstract button identified by a bit index in the range `0..64`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Button(pub u8);

/// Immutable input snapshot for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputState {
    buttons: u64,
    cursor: Vec2,
}

impl InputState {
    /// An empty snapshot with nothing held
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: mark a button as held
    pub fn with_button(mut self, button: Button) -> Self {
        self.buttons |= Self::mask(button);
        self
    }

    /// Builder-style: set the cursor position in world units
    pub fn with_cursor(mut self, cursor: Vec2) -> Self {
        self.cursor = cursor;
        self
    }

    /// Whether a button is held this frame
    pub fn is_down(&self, button: Button) -> bool {
        self.buttons & Self::mask(button) != 0
    }

    /// Cursor position in world units
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    fn mask(button: Button) -> u64 {
        1u64 << u64::from(button.0.min(63))
    }
}
