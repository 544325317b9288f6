//! tickinput-platform: OS input adapters for tickinput.
//!
//! This crate provides:
//! - A global keyboard/mouse hook via `rdev`, running on its own thread
//! - `RdevBackend`, an `InputBackend` whose devices drain the hook's queues
//!   on every `InputManager::poll`
//!
//! ## Module Structure
//!
//! - `hook` - Hook thread and raw event conversion
//! - `backend` - Session, keyboard and mouse devices

mod backend;
mod hook;

pub use backend::{RdevBackend, WHEEL_DELTA, WINDOW_LEFT_PARAM, WINDOW_TOP_PARAM};
pub use hook::{start_hook, HookHandle, HookQueues, RawEvent, RawKeyEvent, RawMouseEvent};
