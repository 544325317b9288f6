//! Event objects handed to listeners.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of input device owned by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Keyboard,
    Mouse,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Keyboard => f.write_str("keyboard"),
            DeviceKind::Mouse => f.write_str("mouse"),
        }
    }
}

/// A key press or release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key name, e.g. `"a"`, `"Space"`, `"Escape"`.
    pub key: String,
    /// Character produced by the key, if any.
    pub text: Option<char>,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), text: None }
    }

    pub fn with_text(key: impl Into<String>, text: char) -> Self {
        Self { key: key.into(), text: Some(text) }
    }
}

/// Mouse buttons, numbered 0..=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Button3,
    Button4,
    Button5,
    Button6,
    Button7,
}

impl MouseButton {
    /// Numeric button id.
    pub fn id(self) -> u8 {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
            MouseButton::Button3 => 3,
            MouseButton::Button4 => 4,
            MouseButton::Button5 => 5,
            MouseButton::Button6 => 6,
            MouseButton::Button7 => 7,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => MouseButton::Left,
            1 => MouseButton::Right,
            2 => MouseButton::Middle,
            3 => MouseButton::Button3,
            4 => MouseButton::Button4,
            5 => MouseButton::Button5,
            6 => MouseButton::Button6,
            7 => MouseButton::Button7,
            _ => return None,
        })
    }

    fn mask(self) -> u8 {
        1 << self.id()
    }
}

/// One mouse axis: absolute position and change since the previous event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Axis {
    pub abs: i32,
    pub rel: i32,
}

impl Axis {
    /// Move by `delta`, keeping `abs` within `0..=max` when `max` is set.
    pub fn shift(&mut self, delta: i32, max: Option<i32>) {
        self.rel = delta;
        let next = self.abs.saturating_add(delta);
        self.abs = match max {
            Some(max) => next.clamp(0, max.max(0)),
            None => next,
        };
    }

    /// Jump to an absolute position, recording the delta.
    pub fn set(&mut self, abs: i32, max: Option<i32>) {
        let abs = match max {
            Some(max) => abs.clamp(0, max.max(0)),
            None => abs,
        };
        self.rel = abs.saturating_sub(self.abs);
        self.abs = abs;
    }
}

/// Snapshot of the mouse at the time of an event.
///
/// `width`/`height` are the clipping extents; the x/y axes never leave
/// `0..=width` / `0..=height`. The z axis is the wheel and is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseState {
    pub x: Axis,
    pub y: Axis,
    pub z: Axis,
    pub width: u32,
    pub height: u32,
    buttons: u8,
}

impl MouseState {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, ..Self::default() }
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons & button.mask() != 0
    }

    pub fn set_button(&mut self, button: MouseButton, down: bool) {
        if down {
            self.buttons |= button.mask();
        } else {
            self.buttons &= !button.mask();
        }
    }

    /// Raw pressed-button bitmask, bit `n` is button id `n`.
    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    /// Clear relative movement before the next event is applied.
    pub fn clear_relative(&mut self) {
        self.x.rel = 0;
        self.y.rel = 0;
        self.z.rel = 0;
    }

    /// Move the pointer to an absolute position inside the extents.
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.x.set(x, Some(extent(self.width)));
        self.y.set(y, Some(extent(self.height)));
        self.z.rel = 0;
    }

    /// Move the pointer by a relative offset, staying inside the extents.
    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.x.shift(dx, Some(extent(self.width)));
        self.y.shift(dy, Some(extent(self.height)));
        self.z.rel = 0;
    }

    /// Scroll the wheel by `delta`.
    pub fn scroll(&mut self, delta: i32) {
        self.x.rel = 0;
        self.y.rel = 0;
        self.z.shift(delta, None);
    }

    /// Update the clipping extents and pull the pointer back inside them.
    pub fn set_extents(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.x.abs = self.x.abs.clamp(0, extent(width));
        self.y.abs = self.y.abs.clamp(0, extent(height));
    }
}

/// Extents above `i32::MAX` saturate instead of wrapping negative.
fn extent(size: u32) -> i32 {
    i32::try_from(size).unwrap_or(i32::MAX)
}

/// A mouse move, press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub state: MouseState,
}

impl MouseEvent {
    pub fn new(state: MouseState) -> Self {
        Self { state }
    }
}
