//! Input events consumed by the editor.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Double-click detection constants.
pub const DOUBLE_CLICK_TIME_MS: u64 = 500;
pub const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Where wheel events come from; decides pan vs zoom semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WheelSource {
    #[default]
    Mouse,
    Trackpad,
}

/// A wheel or two-finger scroll, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub position: Point,
    pub delta: Vec2,
    pub modifiers: Modifiers,
    pub source: WheelSource,
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Enter,
    Shift,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Character(char),
}

/// Tracks presses for double-click detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickTracker {
    last: Option<(u64, Point)>,
}

impl ClickTracker {
    /// Register a press at a screen position. Returns `true` when it
    /// completes a double-click.
    pub fn press(&mut self, position: Point, now_ms: u64) -> bool {
        if let Some((time, pos)) = self.last {
            let elapsed = now_ms.saturating_sub(time);
            if elapsed < DOUBLE_CLICK_TIME_MS && (position - pos).hypot() < DOUBLE_CLICK_DISTANCE {
                // Reset so a triple click is not a second double-click.
                self.last = None;
                return true;
            }
        }
        self.last = Some((now_ms, position));
        false
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
