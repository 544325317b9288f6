//! Seams to the outside world: the render surface that owns the window and
//! the input backend that owns the devices.
//!
//! Implementations:
//! - `memory` - queue-fed backend for headless runs and tests
//! - `tickinput-platform` - rdev-backed global hook

use crate::error::InputResult;
use crate::event::MouseState;
use crate::listener::{KeyListener, MouseListener};

mod memory;

pub use memory::{LifecycleStep, MemoryBackend, MemoryFeed};

/// Parameter key carrying the native window handle.
pub const WINDOW_PARAM: &str = "WINDOW";

/// Native window handle as an opaque integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub usize);

/// Pixel metrics of a render window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowMetrics {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub left: i32,
    pub top: i32,
}

/// The render window input is bound to.
pub trait RenderSurface {
    fn window_handle(&self) -> WindowHandle;
    fn metrics(&self) -> WindowMetrics;
}

/// Ordered key/value parameters used to open a device session.
///
/// Keys may repeat; lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamList {
    pairs: Vec<(String, String)>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters for `handle`, with `WINDOW` set to its decimal value.
    pub fn for_window(handle: WindowHandle) -> Self {
        let mut params = Self::new();
        params.insert(WINDOW_PARAM, handle.0.to_string());
        params
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The window handle, if `WINDOW` is present and numeric.
    pub fn window(&self) -> Option<WindowHandle> {
        self.get(WINDOW_PARAM)
            .and_then(|v| v.parse().ok())
            .map(WindowHandle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Factory for device sessions.
pub trait InputBackend {
    fn open_session(&mut self, params: &ParamList) -> InputResult<Box<dyn DeviceSession>>;
}

/// A live connection to the backend, parent of the keyboard and mouse.
///
/// Devices handed out by a session must be given back through the matching
/// `destroy_*` call before the session is closed.
pub trait DeviceSession {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    fn create_keyboard(&mut self) -> InputResult<Box<dyn KeyboardDevice>>;
    fn create_mouse(&mut self) -> InputResult<Box<dyn MouseDevice>>;

    fn destroy_keyboard(&mut self, keyboard: Box<dyn KeyboardDevice>);
    fn destroy_mouse(&mut self, mouse: Box<dyn MouseDevice>);

    fn close(self: Box<Self>);
}

/// A keyboard owned by a session.
pub trait KeyboardDevice {
    /// Deliver every key event queued since the last capture to `sink`.
    /// Must not block.
    fn capture(&mut self, sink: &mut dyn KeyListener);

    /// Whether `key` is currently held, as of the last capture.
    fn is_key_down(&self, key: &str) -> bool;
}

/// A mouse owned by a session.
pub trait MouseDevice {
    /// Deliver every mouse event queued since the last capture to `sink`.
    /// Must not block.
    fn capture(&mut self, sink: &mut dyn MouseListener);

    fn state(&self) -> MouseState;

    /// Set the area absolute positions are clipped to.
    fn set_window_extents(&mut self, width: u32, height: u32);
}
