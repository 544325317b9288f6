//! Queue-fed backend.
//!
//! Events are pushed through a [`MemoryFeed`] and delivered on the next
//! capture, exactly like a hardware backend that buffers between polls.
//! The feed also records the session/device lifecycle so callers can check
//! teardown order.

use super::{DeviceSession, InputBackend, KeyboardDevice, MouseDevice, ParamList};
use crate::error::{InputError, InputResult};
use crate::event::{DeviceKind, KeyEvent, MouseButton, MouseEvent, MouseState};
use crate::listener::{KeyListener, MouseListener};
use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;
use tracing::debug;

/// Session and device lifecycle transitions, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStep {
    SessionOpened,
    KeyboardCreated,
    MouseCreated,
    KeyboardDestroyed,
    MouseDestroyed,
    SessionClosed,
}

#[derive(Debug, Clone)]
enum QueuedKey {
    Pressed(KeyEvent),
    Released(KeyEvent),
}

#[derive(Debug, Clone, Copy)]
enum QueuedMouse {
    MoveTo { x: i32, y: i32 },
    MoveBy { dx: i32, dy: i32 },
    Scroll { delta: i32 },
    Pressed(MouseButton),
    Released(MouseButton),
}

#[derive(Default)]
struct FeedState {
    keys: VecDeque<QueuedKey>,
    mouse: VecDeque<QueuedMouse>,
    lifecycle: Vec<LifecycleStep>,
    sessions_opened: usize,
    last_params: Option<ParamList>,
    session_failure: Option<String>,
    keyboard_failure: Option<String>,
    mouse_failure: Option<String>,
}

/// Shared handle for pushing events into a [`MemoryBackend`].
///
/// Cloning is cheap; all clones feed the same queues.
#[derive(Clone, Default)]
pub struct MemoryFeed {
    inner: Rc<RefCell<FeedState>>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_pressed(&self, key: impl Into<String>) {
        self.push_key(QueuedKey::Pressed(KeyEvent::new(key)));
    }

    pub fn key_released(&self, key: impl Into<String>) {
        self.push_key(QueuedKey::Released(KeyEvent::new(key)));
    }

    /// Queue a press of a key producing `text`.
    pub fn key_typed(&self, key: impl Into<String>, text: char) {
        self.push_key(QueuedKey::Pressed(KeyEvent::with_text(key, text)));
    }

    pub fn mouse_moved_to(&self, x: i32, y: i32) {
        self.push_mouse(QueuedMouse::MoveTo { x, y });
    }

    pub fn mouse_moved_by(&self, dx: i32, dy: i32) {
        self.push_mouse(QueuedMouse::MoveBy { dx, dy });
    }

    pub fn mouse_scrolled(&self, delta: i32) {
        self.push_mouse(QueuedMouse::Scroll { delta });
    }

    pub fn mouse_pressed(&self, button: MouseButton) {
        self.push_mouse(QueuedMouse::Pressed(button));
    }

    pub fn mouse_released(&self, button: MouseButton) {
        self.push_mouse(QueuedMouse::Released(button));
    }

    /// Make the next `open_session` fail with `reason`.
    pub fn fail_session(&self, reason: impl Into<String>) {
        self.inner.borrow_mut().session_failure = Some(reason.into());
    }

    /// Make creation of the `kind` device fail with `reason`.
    pub fn fail_device(&self, kind: DeviceKind, reason: impl Into<String>) {
        let mut state = self.inner.borrow_mut();
        match kind {
            DeviceKind::Keyboard => state.keyboard_failure = Some(reason.into()),
            DeviceKind::Mouse => state.mouse_failure = Some(reason.into()),
        }
    }

    pub fn pending_keys(&self) -> usize {
        self.inner.borrow().keys.len()
    }

    pub fn pending_mouse(&self) -> usize {
        self.inner.borrow().mouse.len()
    }

    pub fn sessions_opened(&self) -> usize {
        self.inner.borrow().sessions_opened
    }

    pub fn lifecycle(&self) -> Vec<LifecycleStep> {
        self.inner.borrow().lifecycle.clone()
    }

    /// Parameters passed to the most recent `open_session`.
    pub fn last_params(&self) -> Option<ParamList> {
        self.inner.borrow().last_params.clone()
    }

    fn push_key(&self, event: QueuedKey) {
        self.inner.borrow_mut().keys.push_back(event);
    }

    fn push_mouse(&self, event: QueuedMouse) {
        self.inner.borrow_mut().mouse.push_back(event);
    }

    fn log(&self, step: LifecycleStep) {
        self.inner.borrow_mut().lifecycle.push(step);
    }

    fn take_keys(&self) -> Vec<QueuedKey> {
        self.inner.borrow_mut().keys.drain(..).collect()
    }

    fn take_mouse(&self) -> Vec<QueuedMouse> {
        self.inner.borrow_mut().mouse.drain(..).collect()
    }
}

/// Backend whose devices read from a [`MemoryFeed`].
pub struct MemoryBackend {
    feed: MemoryFeed,
}

impl MemoryBackend {
    pub fn new(feed: MemoryFeed) -> Self {
        Self { feed }
    }

    pub fn feed(&self) -> &MemoryFeed {
        &self.feed
    }
}

impl InputBackend for MemoryBackend {
    fn open_session(&mut self, params: &ParamList) -> InputResult<Box<dyn DeviceSession>> {
        let mut state = self.feed.inner.borrow_mut();
        if let Some(reason) = state.session_failure.take() {
            return Err(InputError::SessionCreation(reason));
        }
        state.sessions_opened += 1;
        state.last_params = Some(params.clone());
        state.lifecycle.push(LifecycleStep::SessionOpened);
        drop(state);

        debug!(params = params.len(), "memory session opened");
        Ok(Box::new(MemorySession {
            feed: self.feed.clone(),
        }))
    }
}

struct MemorySession {
    feed: MemoryFeed,
}

impl DeviceSession for MemorySession {
    fn name(&self) -> &str {
        "memory"
    }

    fn create_keyboard(&mut self) -> InputResult<Box<dyn KeyboardDevice>> {
        if let Some(reason) = self.feed.inner.borrow_mut().keyboard_failure.take() {
            return Err(InputError::DeviceCreation {
                kind: DeviceKind::Keyboard,
                reason,
            });
        }
        self.feed.log(LifecycleStep::KeyboardCreated);
        Ok(Box::new(MemoryKeyboard {
            feed: self.feed.clone(),
            down: HashSet::new(),
        }))
    }

    fn create_mouse(&mut self) -> InputResult<Box<dyn MouseDevice>> {
        if let Some(reason) = self.feed.inner.borrow_mut().mouse_failure.take() {
            return Err(InputError::DeviceCreation {
                kind: DeviceKind::Mouse,
                reason,
            });
        }
        self.feed.log(LifecycleStep::MouseCreated);
        Ok(Box::new(MemoryMouse {
            feed: self.feed.clone(),
            state: MouseState::default(),
        }))
    }

    fn destroy_keyboard(&mut self, _keyboard: Box<dyn KeyboardDevice>) {
        self.feed.log(LifecycleStep::KeyboardDestroyed);
    }

    fn destroy_mouse(&mut self, _mouse: Box<dyn MouseDevice>) {
        self.feed.log(LifecycleStep::MouseDestroyed);
    }

    fn close(self: Box<Self>) {
        self.feed.log(LifecycleStep::SessionClosed);
    }
}

struct MemoryKeyboard {
    feed: MemoryFeed,
    down: HashSet<String>,
}

impl KeyboardDevice for MemoryKeyboard {
    fn capture(&mut self, sink: &mut dyn KeyListener) {
        // Drained up front so listeners may push follow-up events for the next poll.
        for queued in self.feed.take_keys() {
            match queued {
                QueuedKey::Pressed(event) => {
                    self.down.insert(event.key.clone());
                    sink.key_pressed(&event);
                }
                QueuedKey::Released(event) => {
                    self.down.remove(&event.key);
                    sink.key_released(&event);
                }
            }
        }
    }

    fn is_key_down(&self, key: &str) -> bool {
        self.down.contains(key)
    }
}

struct MemoryMouse {
    feed: MemoryFeed,
    state: MouseState,
}

impl MouseDevice for MemoryMouse {
    fn capture(&mut self, sink: &mut dyn MouseListener) {
        for queued in self.feed.take_mouse() {
            self.state.clear_relative();
            match queued {
                QueuedMouse::MoveTo { x, y } => {
                    self.state.move_to(x, y);
                    sink.mouse_moved(&MouseEvent::new(self.state));
                }
                QueuedMouse::MoveBy { dx, dy } => {
                    self.state.move_by(dx, dy);
                    sink.mouse_moved(&MouseEvent::new(self.state));
                }
                QueuedMouse::Scroll { delta } => {
                    self.state.scroll(delta);
                    sink.mouse_moved(&MouseEvent::new(self.state));
                }
                QueuedMouse::Pressed(button) => {
                    self.state.set_button(button, true);
                    sink.mouse_pressed(&MouseEvent::new(self.state), button);
                }
                QueuedMouse::Released(button) => {
                    self.state.set_button(button, false);
                    sink.mouse_released(&MouseEvent::new(self.state), button);
                }
            }
        }
    }

    fn state(&self) -> MouseState {
        self.state
    }

    fn set_window_extents(&mut self, width: u32, height: u32) {
        self.state.set_extents(width, height);
    }
}
