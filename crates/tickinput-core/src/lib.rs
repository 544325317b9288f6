//! tickinput-core: named key/mouse listener registry + per-tick dispatch.
//!
//! Design goal: keep this crate platform-agnostic.
//! The OS input hook lives in `tickinput-platform`; this crate only sees it
//! through the [`InputBackend`] traits.
//!
//! ## Module Structure
//!
//! - `error` - Common error types
//! - `event` - Key and mouse event objects
//! - `listener` - Listener traits and name-keyed registries
//! - `backend` - Render surface / backend / device traits, in-memory backend
//! - `config` - YAML configuration
//! - `manager` - `InputManager`, the session owner and dispatcher

mod backend;
mod config;
mod error;
mod event;
mod listener;
mod manager;

pub use backend::{
    DeviceSession, InputBackend, KeyboardDevice, LifecycleStep, MemoryBackend, MemoryFeed,
    MouseDevice, ParamList, RenderSurface, WindowHandle, WindowMetrics, WINDOW_PARAM,
};
pub use config::InputConfig;
pub use error::{InputError, InputResult};
pub use event::{Axis, DeviceKind, KeyEvent, MouseButton, MouseEvent, MouseState};
pub use listener::{
    KeyListener, KeyListenerRegistry, ListenerRegistry, MouseListener, MouseListenerRegistry,
    Propagation,
};
pub use manager::InputManager;
