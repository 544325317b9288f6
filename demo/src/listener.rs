//! Listener that logs every event it receives.

use tickinput_core::{KeyEvent, KeyListener, MouseButton, MouseEvent, MouseListener};
use tracing::info;

pub struct EventLogger {
    quit_key: String,
    quit_requested: bool,
    key_events: usize,
    mouse_events: usize,
}

impl EventLogger {
    pub fn new(quit_key: impl Into<String>) -> Self {
        Self {
            quit_key: quit_key.into(),
            quit_requested: false,
            key_events: 0,
            mouse_events: 0,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn key_events(&self) -> usize {
        self.key_events
    }

    pub fn mouse_events(&self) -> usize {
        self.mouse_events
    }
}

impl KeyListener for EventLogger {
    fn key_pressed(&mut self, event: &KeyEvent) -> bool {
        self.key_events += 1;
        info!(key = %event.key, text = ?event.text, "key pressed");
        if event.key == self.quit_key {
            self.quit_requested = true;
        }
        true
    }

    fn key_released(&mut self, event: &KeyEvent) -> bool {
        self.key_events += 1;
        info!(key = %event.key, "key released");
        true
    }
}

impl MouseListener for EventLogger {
    fn mouse_moved(&mut self, event: &MouseEvent) -> bool {
        self.mouse_events += 1;
        let s = &event.state;
        info!(x = s.x.abs, y = s.y.abs, dx = s.x.rel, dy = s.y.rel, wheel = s.z.rel, "mouse moved");
        true
    }

    fn mouse_pressed(&mut self, event: &MouseEvent, button: MouseButton) -> bool {
        self.mouse_events += 1;
        info!(?button, x = event.state.x.abs, y = event.state.y.abs, "mouse pressed");
        true
    }

    fn mouse_released(&mut self, event: &MouseEvent, button: MouseButton) -> bool {
        self.mouse_events += 1;
        info!(?button, x = event.state.x.abs, y = event.state.y.abs, "mouse released");
        true
    }
}
