//! The input manager: owns the device session and fans captured events out
//! to named listeners.

use crate::backend::{
    DeviceSession, InputBackend, KeyboardDevice, MouseDevice, ParamList, RenderSurface,
    WINDOW_PARAM,
};
use crate::config::InputConfig;
use crate::error::InputResult;
use crate::event::{KeyEvent, MouseButton, MouseEvent};
use crate::listener::{
    KeyListener, KeyListenerRegistry, MouseListener, MouseListenerRegistry,
};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Owns the connection to an input backend and dispatches its events.
///
/// Construct one per application and hand it to the update loop, which
/// calls [`InputManager::poll`] once per tick. Listeners are shared with the
/// manager as `Rc<RefCell<_>>` and stored weakly: the caller keeps them
/// alive and should unregister them before dropping them.
pub struct InputManager<B: InputBackend> {
    backend: B,
    config: InputConfig,
    session: Option<Box<dyn DeviceSession>>,
    keyboard: Option<Box<dyn KeyboardDevice>>,
    mouse: Option<Box<dyn MouseDevice>>,
    key_listeners: KeyListenerRegistry,
    mouse_listeners: MouseListenerRegistry,
}

impl<B: InputBackend> InputManager<B> {
    pub fn new(backend: B, config: InputConfig) -> Self {
        Self {
            backend,
            key_listeners: KeyListenerRegistry::new(config.propagation),
            mouse_listeners: MouseListenerRegistry::new(config.propagation),
            config,
            session: None,
            keyboard: None,
            mouse: None,
        }
    }

    pub fn with_defaults(backend: B) -> Self {
        Self::new(backend, InputConfig::default())
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// Open the device session for `surface`, acquiring the devices enabled
    /// in the configuration. Does nothing if a session already exists.
    pub fn initialize<S: RenderSurface + ?Sized>(&mut self, surface: &S) -> InputResult<()> {
        let (keyboard, mouse) = (self.config.keyboard, self.config.mouse);
        self.initialize_with(surface, keyboard, mouse)
    }

    /// Like [`initialize`](Self::initialize) with explicit device choices.
    pub fn initialize_with<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &S,
        keyboard: bool,
        mouse: bool,
    ) -> InputResult<()> {
        if self.session.is_some() {
            debug!("input session already open, ignoring initialize");
            return Ok(());
        }

        let handle = surface.window_handle();
        let mut params = ParamList::for_window(handle);
        for (key, value) in &self.config.params {
            if key == WINDOW_PARAM {
                warn!("ignoring configured WINDOW parameter, the surface handle is used");
                continue;
            }
            params.insert(key.as_str(), value.as_str());
        }

        let mut session = self.backend.open_session(&params)?;
        info!(backend = session.name(), window = handle.0, keyboard, mouse, "input session opened");

        let keyboard_device = if keyboard {
            match session.create_keyboard() {
                Ok(device) => Some(device),
                Err(e) => {
                    warn!(error = %e, "keyboard creation failed, closing session");
                    session.close();
                    return Err(e);
                }
            }
        } else {
            None
        };

        let mouse_device = if mouse {
            match session.create_mouse() {
                Ok(mut device) => {
                    // Positions are clipped to the extents, so they must be known before the first capture.
                    let metrics = surface.metrics();
                    device.set_window_extents(metrics.width, metrics.height);
                    Some(device)
                }
                Err(e) => {
                    warn!(error = %e, "mouse creation failed, closing session");
                    if let Some(device) = keyboard_device {
                        session.destroy_keyboard(device);
                    }
                    session.close();
                    return Err(e);
                }
            }
        } else {
            None
        };

        self.keyboard = keyboard_device;
        self.mouse = mouse_device;
        self.session = Some(session);
        Ok(())
    }

    /// Deliver everything the devices queued since the last poll.
    ///
    /// Listener callbacks run inline, mouse events before key events.
    pub fn poll(&mut self) {
        if let Some(mouse) = self.mouse.as_mut() {
            mouse.capture(&mut self.mouse_listeners);
        }
        if let Some(keyboard) = self.keyboard.as_mut() {
            keyboard.capture(&mut self.key_listeners);
        }
    }

    /// Register `listener` under `name`.
    ///
    /// Ignored when no keyboard is acquired or `name` is already taken.
    /// Returns whether the listener was stored. Only a weak handle is kept:
    /// dropping `listener` stops its callbacks, but the name stays taken
    /// until it is unregistered or the key listeners are cleared.
    pub fn register_key_listener<L: KeyListener + 'static>(
        &mut self,
        name: impl Into<String>,
        listener: &Rc<RefCell<L>>,
    ) -> bool {
        let name = name.into();
        if self.keyboard.is_none() {
            debug!(%name, "no keyboard acquired, ignoring key listener");
            return false;
        }
        let shared: Rc<RefCell<dyn KeyListener>> = listener.clone();
        let added = self.key_listeners.insert(name.clone(), Rc::downgrade(&shared));
        if added {
            debug!(%name, "key listener registered");
        }
        added
    }

    /// Register `listener` under `name`.
    ///
    /// Ignored when no mouse is acquired or `name` is already taken. As with
    /// key listeners, a dropped listener keeps its name until unregistered
    /// or cleared.
    pub fn register_mouse_listener<L: MouseListener + 'static>(
        &mut self,
        name: impl Into<String>,
        listener: &Rc<RefCell<L>>,
    ) -> bool {
        let name = name.into();
        if self.mouse.is_none() {
            debug!(%name, "no mouse acquired, ignoring mouse listener");
            return false;
        }
        let shared: Rc<RefCell<dyn MouseListener>> = listener.clone();
        let added = self.mouse_listeners.insert(name.clone(), Rc::downgrade(&shared));
        if added {
            debug!(%name, "mouse listener registered");
        }
        added
    }

    pub fn unregister_key_listener(&mut self, name: &str) -> bool {
        let removed = self.key_listeners.remove(name);
        if removed {
            debug!(%name, "key listener removed");
        }
        removed
    }

    /// Remove the first key registration (in name order) holding `listener`.
    pub fn unregister_key_listener_ref<L: ?Sized>(&mut self, listener: &Rc<RefCell<L>>) -> bool {
        self.key_listeners.remove_ref(listener)
    }

    pub fn unregister_mouse_listener(&mut self, name: &str) -> bool {
        let removed = self.mouse_listeners.remove(name);
        if removed {
            debug!(%name, "mouse listener removed");
        }
        removed
    }

    /// Remove the first mouse registration (in name order) holding `listener`.
    pub fn unregister_mouse_listener_ref<L: ?Sized>(&mut self, listener: &Rc<RefCell<L>>) -> bool {
        self.mouse_listeners.remove_ref(listener)
    }

    pub fn clear_all_listeners(&mut self) {
        self.key_listeners.clear();
        self.mouse_listeners.clear();
    }

    pub fn clear_key_listeners(&mut self) {
        self.key_listeners.clear();
    }

    pub fn clear_mouse_listeners(&mut self) {
        self.mouse_listeners.clear();
    }

    pub fn key_listener(&self, name: &str) -> Option<Rc<RefCell<dyn KeyListener>>> {
        self.key_listeners.get(name)
    }

    pub fn mouse_listener(&self, name: &str) -> Option<Rc<RefCell<dyn MouseListener>>> {
        self.mouse_listeners.get(name)
    }

    pub fn key_listener_count(&self) -> usize {
        self.key_listeners.len()
    }

    pub fn mouse_listener_count(&self) -> usize {
        self.mouse_listeners.len()
    }

    pub fn dispatch_key_pressed(&mut self, event: &KeyEvent) -> bool {
        self.key_listeners.key_pressed(event)
    }

    pub fn dispatch_key_released(&mut self, event: &KeyEvent) -> bool {
        self.key_listeners.key_released(event)
    }

    pub fn dispatch_mouse_moved(&mut self, event: &MouseEvent) -> bool {
        self.mouse_listeners.mouse_moved(event)
    }

    pub fn dispatch_mouse_pressed(&mut self, event: &MouseEvent, button: MouseButton) -> bool {
        self.mouse_listeners.mouse_pressed(event, button)
    }

    pub fn dispatch_mouse_released(&mut self, event: &MouseEvent, button: MouseButton) -> bool {
        self.mouse_listeners.mouse_released(event, button)
    }

    /// Update the mouse clipping area, e.g. after the window was resized.
    pub fn set_window_extents(&mut self, width: u32, height: u32) {
        if let Some(mouse) = self.mouse.as_mut() {
            mouse.set_window_extents(width, height);
        }
    }

    pub fn keyboard(&self) -> Option<&dyn KeyboardDevice> {
        self.keyboard.as_deref()
    }

    pub fn keyboard_mut(&mut self) -> Option<&mut (dyn KeyboardDevice + 'static)> {
        self.keyboard.as_deref_mut()
    }

    pub fn mouse(&self) -> Option<&dyn MouseDevice> {
        self.mouse.as_deref()
    }

    pub fn mouse_mut(&mut self) -> Option<&mut (dyn MouseDevice + 'static)> {
        self.mouse.as_deref_mut()
    }

    /// Release the mouse and keyboard, close the session and drop every
    /// listener registration. Later calls do nothing.
    pub fn shutdown(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        if let Some(mouse) = self.mouse.take() {
            session.destroy_mouse(mouse);
        }
        if let Some(keyboard) = self.keyboard.take() {
            session.destroy_keyboard(keyboard);
        }
        let backend = session.name().to_owned();
        session.close();

        self.clear_all_listeners();
        info!(%backend, "input session closed");
    }
}

impl<B: InputBackend> Drop for InputManager<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{LifecycleStep, MemoryBackend, MemoryFeed, WindowHandle, WindowMetrics};
    use crate::error::InputError;
    use crate::event::{DeviceKind, MouseState};
    use crate::listener::Propagation;

    struct Window;

    impl RenderSurface for Window {
        fn window_handle(&self) -> WindowHandle {
            WindowHandle(7)
        }

        fn metrics(&self) -> WindowMetrics {
            WindowMetrics { width: 800, height: 600, depth: 32, left: 0, top: 0 }
        }
    }

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every callback as `"<tag> <what>"` and answers `reply`.
    struct Recorder {
        tag: &'static str,
        log: Log,
        reply: bool,
    }

    impl Recorder {
        fn shared(tag: &'static str, log: &Log) -> Rc<RefCell<Self>> {
            Self::replying(tag, log, true)
        }

        fn replying(tag: &'static str, log: &Log, reply: bool) -> Rc<RefCell<Self>> {
            Rc::new(RefCell::new(Self { tag, log: log.clone(), reply }))
        }

        fn note(&self, what: String) -> bool {
            self.log.borrow_mut().push(format!("{} {}", self.tag, what));
            self.reply
        }
    }

    impl KeyListener for Recorder {
        fn key_pressed(&mut self, event: &KeyEvent) -> bool {
            self.note(format!("down {}", event.key))
        }

        fn key_released(&mut self, event: &KeyEvent) -> bool {
            self.note(format!("up {}", event.key))
        }
    }

    impl MouseListener for Recorder {
        fn mouse_moved(&mut self, event: &MouseEvent) -> bool {
            self.note(format!("move {},{}", event.state.x.abs, event.state.y.abs))
        }

        fn mouse_pressed(&mut self, _event: &MouseEvent, button: MouseButton) -> bool {
            self.note(format!("press {}", button.id()))
        }

        fn mouse_released(&mut self, _event: &MouseEvent, button: MouseButton) -> bool {
            self.note(format!("release {}", button.id()))
        }
    }

    fn manager(config: InputConfig) -> (InputManager<MemoryBackend>, MemoryFeed) {
        let feed = MemoryFeed::new();
        let mut manager = InputManager::new(MemoryBackend::new(feed.clone()), config);
        manager.initialize(&Window).unwrap();
        (manager, feed)
    }

    fn new_log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_initialize_opens_one_session() {
        let (mut manager, feed) = manager(InputConfig::default());
        assert!(manager.is_initialized());
        assert!(manager.keyboard().is_some());
        assert!(manager.mouse().is_some());

        manager.initialize(&Window).unwrap();
        assert_eq!(feed.sessions_opened(), 1);
        assert_eq!(manager.backend().feed().sessions_opened(), 1);
        assert_eq!(
            feed.lifecycle(),
            vec![
                LifecycleStep::SessionOpened,
                LifecycleStep::KeyboardCreated,
                LifecycleStep::MouseCreated,
            ]
        );
    }

    #[test]
    fn test_initialize_passes_window_and_extra_params() {
        let mut config = InputConfig::default();
        config.params.insert("x11_mouse_grab".into(), "false".into());
        config.params.insert("WINDOW".into(), "999".into());
        let (_manager, feed) = manager(config);

        let params = feed.last_params().unwrap();
        assert_eq!(params.window(), Some(WindowHandle(7)));
        assert_eq!(params.get("x11_mouse_grab"), Some("false"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_initialize_sets_mouse_extents() {
        let (manager, _feed) = manager(InputConfig::default());
        let state = manager.mouse().unwrap().state();
        assert_eq!((state.width, state.height), (800, 600));
    }

    #[test]
    fn test_initialize_respects_device_flags() {
        let feed = MemoryFeed::new();
        let mut manager = InputManager::with_defaults(MemoryBackend::new(feed.clone()));
        manager.initialize_with(&Window, true, false).unwrap();
        assert!(manager.keyboard().is_some());
        assert!(manager.mouse().is_none());

        let log = new_log();
        let listener = Recorder::shared("m", &log);
        assert!(!manager.register_mouse_listener("m", &listener));
        assert_eq!(manager.mouse_listener_count(), 0);
    }

    #[test]
    fn test_session_failure_is_returned() {
        let feed = MemoryFeed::new();
        feed.fail_session("no display");
        let mut manager = InputManager::with_defaults(MemoryBackend::new(feed.clone()));

        let err = manager.initialize(&Window).unwrap_err();
        assert!(matches!(err, InputError::SessionCreation(_)));
        assert!(!manager.is_initialized());
    }

    #[test]
    fn test_device_failure_rolls_back_session() {
        let feed = MemoryFeed::new();
        feed.fail_device(DeviceKind::Mouse, "unplugged");
        let mut manager = InputManager::with_defaults(MemoryBackend::new(feed.clone()));

        let err = manager.initialize(&Window).unwrap_err();
        assert!(matches!(err, InputError::DeviceCreation { kind: DeviceKind::Mouse, .. }));
        assert!(!manager.is_initialized());
        assert!(manager.keyboard().is_none());
        assert_eq!(
            feed.lifecycle(),
            vec![
                LifecycleStep::SessionOpened,
                LifecycleStep::KeyboardCreated,
                LifecycleStep::KeyboardDestroyed,
                LifecycleStep::SessionClosed,
            ]
        );

        // A later attempt starts from scratch.
        manager.initialize(&Window).unwrap();
        assert_eq!(feed.sessions_opened(), 2);
    }

    #[test]
    fn test_register_before_initialize_is_ignored() {
        let feed = MemoryFeed::new();
        let mut manager = InputManager::with_defaults(MemoryBackend::new(feed));
        let log = new_log();
        let listener = Recorder::shared("k", &log);

        assert!(!manager.register_key_listener("k", &listener));
        manager.initialize(&Window).unwrap();
        assert_eq!(manager.key_listener_count(), 0);
        assert!(manager.register_key_listener("k", &listener));
    }

    #[test]
    fn test_duplicate_key_name_keeps_first() {
        let (mut manager, _feed) = manager(InputConfig::default());
        let log = new_log();
        let first = Recorder::shared("first", &log);
        let second = Recorder::shared("second", &log);

        assert!(manager.register_key_listener("hud", &first));
        assert!(!manager.register_key_listener("hud", &second));

        let stored = manager.key_listener("hud").unwrap();
        assert_eq!(Rc::as_ptr(&stored) as *const (), Rc::as_ptr(&first) as *const ());
    }

    #[test]
    fn test_dropped_listener_blocks_name_until_unregistered() {
        let (mut manager, feed) = manager(InputConfig::default());
        let log = new_log();
        let old = Recorder::shared("old", &log);
        let new = Recorder::shared("new", &log);
        assert!(manager.register_key_listener("hud", &old));
        drop(old);

        assert!(!manager.register_key_listener("hud", &new));
        assert!(manager.unregister_key_listener("hud"));
        assert!(manager.register_key_listener("hud", &new));

        feed.key_pressed("q");
        manager.poll();
        assert_eq!(*log.borrow(), vec!["new down q"]);
    }

    #[test]
    fn test_huge_window_extents_do_not_panic() {
        let (mut manager, feed) = manager(InputConfig::default());
        manager.set_window_extents(u32::MAX, 600);

        feed.mouse_moved_to(5000, 700);
        manager.poll();
        let state = manager.mouse().unwrap().state();
        assert_eq!((state.x.abs, state.y.abs), (5000, 600));
    }

    #[test]
    fn test_poll_dispatches_queued_events() {
        let (mut manager, feed) = manager(InputConfig::default());
        let log = new_log();
        let listener = Recorder::shared("l", &log);
        manager.register_key_listener("l", &listener);
        manager.register_mouse_listener("l", &listener);

        feed.key_pressed("w");
        feed.mouse_moved_to(5, 6);
        feed.mouse_pressed(MouseButton::Right);
        feed.key_released("w");

        // Nothing is delivered until the next poll.
        assert!(log.borrow().is_empty());

        manager.poll();
        assert_eq!(
            *log.borrow(),
            vec!["l move 5,6", "l press 1", "l down w", "l up w"]
        );
        assert!(!manager.keyboard().unwrap().is_key_down("w"));
        assert!(manager.mouse().unwrap().state().button_down(MouseButton::Right));

        manager.poll();
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn test_key_dispatch_reaches_everyone_in_name_order() {
        let (mut manager, _feed) = manager(InputConfig::default());
        let log = new_log();
        let b = Recorder::replying("b", &log, false);
        let a = Recorder::replying("a", &log, false);
        let c = Recorder::replying("c", &log, true);
        manager.register_key_listener("b", &b);
        manager.register_key_listener("a", &a);
        manager.register_key_listener("c", &c);

        assert!(manager.dispatch_key_pressed(&KeyEvent::new("q")));
        assert_eq!(*log.borrow(), vec!["a down q", "b down q", "c down q"]);
    }

    #[test]
    fn test_stop_on_false_policy() {
        let config = InputConfig {
            propagation: Propagation::StopOnFalse,
            ..InputConfig::default()
        };
        let (mut manager, _feed) = manager(config);
        let log = new_log();
        let a = Recorder::replying("a", &log, false);
        let b = Recorder::shared("b", &log);
        manager.register_key_listener("a", &a);
        manager.register_key_listener("b", &b);

        assert!(manager.dispatch_key_released(&KeyEvent::new("q")));
        assert_eq!(*log.borrow(), vec!["a up q"]);
    }

    #[test]
    fn test_unregister_by_reference_removes_first_match_only() {
        let (mut manager, _feed) = manager(InputConfig::default());
        let log = new_log();
        let twice = Recorder::shared("t", &log);
        manager.register_key_listener("second", &twice);
        manager.register_key_listener("first", &twice);

        assert!(manager.unregister_key_listener_ref(&twice));
        assert_eq!(manager.key_listener_count(), 1);
        assert!(manager.key_listener("first").is_none());
        assert!(manager.key_listener("second").is_some());
    }

    #[test]
    fn test_unregister_missing_is_noop() {
        let (mut manager, _feed) = manager(InputConfig::default());
        let log = new_log();
        let listener = Recorder::shared("x", &log);
        assert!(!manager.unregister_key_listener("nobody"));
        assert!(!manager.unregister_mouse_listener("nobody"));
        assert!(!manager.unregister_mouse_listener_ref(&listener));
    }

    #[test]
    fn test_clear_all_listeners() {
        let (mut manager, _feed) = manager(InputConfig::default());
        let log = new_log();
        let listener = Recorder::shared("l", &log);
        manager.register_key_listener("l", &listener);
        manager.register_mouse_listener("l", &listener);

        manager.clear_all_listeners();
        let event = MouseEvent::new(MouseState::new(800, 600));
        assert!(manager.dispatch_mouse_moved(&event));
        assert!(manager.dispatch_mouse_pressed(&event, MouseButton::Left));
        assert!(manager.dispatch_key_pressed(&KeyEvent::new("a")));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_clear_single_category() {
        let (mut manager, _feed) = manager(InputConfig::default());
        let log = new_log();
        let listener = Recorder::shared("l", &log);
        manager.register_key_listener("l", &listener);
        manager.register_mouse_listener("l", &listener);

        manager.clear_key_listeners();
        assert_eq!(manager.key_listener_count(), 0);
        assert_eq!(manager.mouse_listener_count(), 1);

        manager.clear_mouse_listeners();
        assert_eq!(manager.mouse_listener_count(), 0);
    }

    #[test]
    fn test_mouse_listener_scenario() {
        let (mut manager, feed) = manager(InputConfig::default());
        let log = new_log();
        let a = Recorder::shared("A", &log);
        let b = Recorder::shared("B", &log);
        let impostor = Recorder::shared("A2", &log);

        assert!(manager.register_mouse_listener("A", &a));
        assert!(manager.register_mouse_listener("B", &b));
        assert!(!manager.register_mouse_listener("A", &impostor));

        feed.mouse_moved_to(10, 10);
        manager.poll();
        assert_eq!(*log.borrow(), vec!["A move 10,10", "B move 10,10"]);

        log.borrow_mut().clear();
        assert!(manager.unregister_mouse_listener("A"));
        feed.mouse_moved_to(20, 30);
        manager.poll();
        assert_eq!(*log.borrow(), vec!["B move 20,30"]);
    }

    #[test]
    fn test_set_window_extents_after_resize() {
        let (mut manager, feed) = manager(InputConfig::default());
        manager.set_window_extents(100, 50);

        feed.mouse_moved_to(400, 400);
        manager.poll();
        let state = manager.mouse().unwrap().state();
        assert_eq!((state.x.abs, state.y.abs), (100, 50));
    }

    #[test]
    fn test_shutdown_order_and_idempotence() {
        let (mut manager, feed) = manager(InputConfig::default());
        let log = new_log();
        let listener = Recorder::shared("l", &log);
        manager.register_key_listener("l", &listener);

        manager.shutdown();
        assert!(!manager.is_initialized());
        assert!(manager.keyboard().is_none());
        assert!(manager.mouse().is_none());
        assert_eq!(manager.key_listener_count(), 0);

        manager.shutdown();
        assert_eq!(
            feed.lifecycle(),
            vec![
                LifecycleStep::SessionOpened,
                LifecycleStep::KeyboardCreated,
                LifecycleStep::MouseCreated,
                LifecycleStep::MouseDestroyed,
                LifecycleStep::KeyboardDestroyed,
                LifecycleStep::SessionClosed,
            ]
        );
    }

    #[test]
    fn test_drop_closes_session() {
        let (manager, feed) = manager(InputConfig::default());
        drop(manager);
        assert_eq!(feed.lifecycle().last(), Some(&LifecycleStep::SessionClosed));
    }

    #[test]
    fn test_poll_skips_dropped_listener() {
        let (mut manager, feed) = manager(InputConfig::default());
        let log = new_log();
        let kept = Recorder::shared("kept", &log);
        let dropped = Recorder::shared("dropped", &log);
        manager.register_key_listener("kept", &kept);
        manager.register_key_listener("dropped", &dropped);
        drop(dropped);

        feed.key_pressed("e");
        manager.poll();
        assert_eq!(*log.borrow(), vec!["kept down e"]);
    }
}
