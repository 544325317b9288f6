//! `InputBackend` implementation on top of the global rdev hook.

use crate::hook::{start_hook, HookHandle, HookQueues, RawKeyEvent, RawMouseEvent};
use crossbeam_channel::Receiver;
use std::collections::HashSet;
use tickinput_core::{
    DeviceKind, DeviceSession, InputBackend, InputConfig, InputError, InputResult, KeyEvent,
    KeyListener, KeyboardDevice, MouseDevice, MouseEvent, MouseListener, MouseState, ParamList,
};
use tracing::{debug, info, warn};

/// Session parameter: screen x of the window's client area.
pub const WINDOW_LEFT_PARAM: &str = "window_left";
/// Session parameter: screen y of the window's client area.
pub const WINDOW_TOP_PARAM: &str = "window_top";

/// Wheel units reported per notch.
pub const WHEEL_DELTA: i32 = 120;

/// Backend capturing global keyboard/mouse input with `rdev`.
///
/// The hook thread is started by the first `open_session` and shared by
/// every later session of the same backend. Opening a session discards
/// whatever was queued while no session was listening. The hook is
/// stopped when the backend is dropped; rdev cannot be unhooked, so the
/// thread itself stays parked until the process exits.
pub struct RdevBackend {
    queue_capacity: usize,
    hook: Option<(HookHandle, HookQueues)>,
}

impl RdevBackend {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            queue_capacity: queue_capacity.max(1),
            hook: None,
        }
    }

    pub fn from_config(config: &InputConfig) -> Self {
        Self::new(config.queue_capacity)
    }
}

impl Default for RdevBackend {
    fn default() -> Self {
        Self::from_config(&InputConfig::default())
    }
}

impl InputBackend for RdevBackend {
    fn open_session(&mut self, params: &ParamList) -> InputResult<Box<dyn DeviceSession>> {
        let origin = (param_i32(params, WINDOW_LEFT_PARAM)?, param_i32(params, WINDOW_TOP_PARAM)?);
        let session = RdevSession::attach(self.hook_queues(), origin);
        info!(window = ?params.window(), ?origin, "rdev session opened");
        Ok(Box::new(session))
    }
}

impl RdevBackend {
    /// Queues of the running hook, starting it if needed.
    fn hook_queues(&mut self) -> &HookQueues {
        let exited = self
            .hook
            .as_ref()
            .map_or(false, |(hook, _)| !hook.is_running());
        if exited {
            warn!("input hook thread exited, restarting");
            self.hook = None;
        }
        let capacity = self.queue_capacity;
        &self.hook.get_or_insert_with(|| start_hook(capacity)).1
    }
}

fn param_i32(params: &ParamList, key: &str) -> InputResult<i32> {
    match params.get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| InputError::SessionCreation(format!("{key} is not an integer: {value}"))),
        None => Ok(0),
    }
}

struct RdevSession {
    keys: Option<Receiver<RawKeyEvent>>,
    mouse: Option<Receiver<RawMouseEvent>>,
    origin: (i32, i32),
}

impl RdevSession {
    fn attach(queues: &HookQueues, origin: (i32, i32)) -> Self {
        let stale = queues.discard_pending();
        if stale > 0 {
            debug!(stale, "discarded events queued before the session opened");
        }
        let queues = queues.clone();
        Self {
            keys: Some(queues.keys),
            mouse: Some(queues.mouse),
            origin,
        }
    }
}

impl DeviceSession for RdevSession {
    fn name(&self) -> &str {
        "rdev"
    }

    fn create_keyboard(&mut self) -> InputResult<Box<dyn KeyboardDevice>> {
        let events = self.keys.take().ok_or_else(|| InputError::DeviceCreation {
            kind: DeviceKind::Keyboard,
            reason: "keyboard already created for this session".into(),
        })?;
        debug!("rdev keyboard created");
        Ok(Box::new(RdevKeyboard::new(events)))
    }

    fn create_mouse(&mut self) -> InputResult<Box<dyn MouseDevice>> {
        let events = self.mouse.take().ok_or_else(|| InputError::DeviceCreation {
            kind: DeviceKind::Mouse,
            reason: "mouse already created for this session".into(),
        })?;
        debug!("rdev mouse created");
        Ok(Box::new(RdevMouse::new(events, self.origin)))
    }

    fn destroy_keyboard(&mut self, keyboard: Box<dyn KeyboardDevice>) {
        drop(keyboard);
        debug!("rdev keyboard released");
    }

    fn destroy_mouse(&mut self, mouse: Box<dyn MouseDevice>) {
        drop(mouse);
        debug!("rdev mouse released");
    }

    fn close(self: Box<Self>) {
        info!(origin = ?self.origin, "rdev session closed");
    }
}

/// Keyboard fed by the hook's key queue.
struct RdevKeyboard {
    events: Receiver<RawKeyEvent>,
    down: HashSet<String>,
}

impl RdevKeyboard {
    fn new(events: Receiver<RawKeyEvent>) -> Self {
        Self {
            events,
            down: HashSet::new(),
        }
    }
}

impl KeyboardDevice for RdevKeyboard {
    fn capture(&mut self, sink: &mut dyn KeyListener) {
        for raw in self.events.try_iter() {
            match raw {
                RawKeyEvent::Down { key, text } => {
                    self.down.insert(key.clone());
                    sink.key_pressed(&KeyEvent { key, text });
                }
                RawKeyEvent::Up { key } => {
                    self.down.remove(&key);
                    sink.key_released(&KeyEvent::new(key));
                }
            }
        }
    }

    fn is_key_down(&self, key: &str) -> bool {
        self.down.contains(key)
    }
}

/// Mouse fed by the hook's mouse queue.
///
/// Screen positions are made window-relative using the session origin and
/// clipped to the window extents.
struct RdevMouse {
    events: Receiver<RawMouseEvent>,
    origin: (i32, i32),
    state: MouseState,
}

impl RdevMouse {
    fn new(events: Receiver<RawMouseEvent>, origin: (i32, i32)) -> Self {
        Self {
            events,
            origin,
            state: MouseState::default(),
        }
    }
}

impl MouseDevice for RdevMouse {
    fn capture(&mut self, sink: &mut dyn MouseListener) {
        for raw in self.events.try_iter() {
            self.state.clear_relative();
            match raw {
                RawMouseEvent::Move { x, y } => {
                    let x = (x.round() as i32).saturating_sub(self.origin.0);
                    let y = (y.round() as i32).saturating_sub(self.origin.1);
                    self.state.move_to(x, y);
                    sink.mouse_moved(&MouseEvent::new(self.state));
                }
                RawMouseEvent::Wheel { delta_y, .. } => {
                    let notches = i32::try_from(delta_y).unwrap_or(if delta_y < 0 { i32::MIN } else { i32::MAX });
                    let delta = notches.saturating_mul(WHEEL_DELTA);
                    if delta == 0 {
                        continue;
                    }
                    self.state.scroll(delta);
                    sink.mouse_moved(&MouseEvent::new(self.state));
                }
                RawMouseEvent::Down(button) => {
                    self.state.set_button(button, true);
                    sink.mouse_pressed(&MouseEvent::new(self.state), button);
                }
                RawMouseEvent::Up(button) => {
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
