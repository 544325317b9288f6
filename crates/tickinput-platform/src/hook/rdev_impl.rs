//! rdev-based hook: converts OS events and routes them to the device queues.

use super::{RawEvent, RawKeyEvent, RawMouseEvent};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use rdev::{listen, Event, EventType};
use tickinput_core::MouseButton;
use tracing::{error, info, trace};

fn convert_button(button: rdev::Button) -> MouseButton {
    match button {
        rdev::Button::Left => MouseButton::Left,
        rdev::Button::Right => MouseButton::Right,
        rdev::Button::Middle => MouseButton::Middle,
        // rdev reports extra buttons with platform-specific codes.
        rdev::Button::Unknown(_) => MouseButton::Button3,
    }
}

/// Block in rdev's listener, forwarding events until `stop_rx` fires.
pub(super) fn run_hook(
    key_tx: Sender<RawKeyEvent>,
    mouse_tx: Sender<RawMouseEvent>,
    stop_rx: Receiver<()>,
) {
    info!("Input hook thread started (rdev)");
    let mut stopped = false;

    let callback = move |event: Event| {
        if stopped {
            return;
        }
        if stop_rx.try_recv().is_ok() {
            info!("Input hook received stop signal");
            stopped = true;
            return;
        }

        let Some(raw) = convert_event(event.event_type, event.name.as_deref()) else {
            return;
        };
        let result = match raw {
            RawEvent::Key(key) => key_tx.try_send(key).map_err(|e| describe(&e)),
            RawEvent::Mouse(mouse) => mouse_tx.try_send(mouse).map_err(|e| describe(&e)),
        };
        if let Err(reason) = result {
            trace!(reason, "dropping input event");
        }
    };

    if let Err(error) = listen(callback) {
        error!(?error, "Input hook error");
    }

    info!("Input hook thread exiting");
}

fn describe<T>(err: &TrySendError<T>) -> &'static str {
    match err {
        TrySendError::Full(_) => "queue full",
        TrySendError::Disconnected(_) => "device released",
    }
}

/// Convert one rdev event. `name` is the text rdev resolved for key presses.
pub(crate) fn convert_event(event_type: EventType, name: Option<&str>) -> Option<RawEvent> {
    let raw = match event_type {
        EventType::MouseMove { x, y } => RawEvent::Mouse(RawMouseEvent::Move { x, y }),
        EventType::ButtonPress(button) => RawEvent::Mouse(RawMouseEvent::Down(convert_button(button))),
        EventType::ButtonRelease(button) => RawEvent::Mouse(RawMouseEvent::Up(convert_button(button))),
        EventType::Wheel { delta_x, delta_y } => {
            if delta_x == 0 && delta_y == 0 {
                return None;
            }
            RawEvent::Mouse(RawMouseEvent::Wheel { delta_x, delta_y })
        }
        EventType::KeyPress(key) => RawEvent::Key(RawKeyEvent::Down {
            key: format_key(key),
            text: name.and_then(printable_char),
        }),
        EventType::KeyRelease(key) => RawEvent::Key(RawKeyEvent::Up {
            key: format_key(key),
        }),
    };
    Some(raw)
}

/// The single printable character of `name`, if that is what it holds.
fn printable_char(name: &str) -> Option<char> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Some(c),
        _ => None,
    }
}

/// Key name for an rdev key.
///
/// Letters and digit-row keys become the character they print, arrows drop
/// their suffix, and punctuation uses its US-layout symbol. Every other key
/// keeps its rdev variant name (`Escape`, `F5`, `KpReturn`, ...).
pub(crate) fn format_key(key: rdev::Key) -> String {
    use rdev::Key;

    let symbol = match key {
        Key::UpArrow => "Up",
        Key::DownArrow => "Down",
        Key::LeftArrow => "Left",
        Key::RightArrow => "Right",
        Key::BackQuote => "`",
        Key::Minus => "-",
        Key::Equal => "=",
        Key::LeftBracket => "[",
        Key::RightBracket => "]",
        Key::SemiColon => ";",
        Key::Quote => "'",
        Key::BackSlash | Key::IntlBackslash => "\\",
        Key::Comma => ",",
        Key::Dot => ".",
        Key::Slash => "/",
        Key::Unknown(code) => return format!("Unknown({code})"),
        _ => return variant_name(&format!("{key:?}")),
    };
    symbol.to_string()
}

/// `KeyQ` -> `q`, `Num7` -> `7`, anything else unchanged.
fn variant_name(debug: &str) -> String {
    let single = |rest: &str| {
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    };
    if let Some(c) = debug.strip_prefix("Key").and_then(single) {
        if c.is_ascii_uppercase() {
            return c.to_ascii_lowercase().to_string();
        }
    }
    if let Some(c) = debug.strip_prefix("Num").and_then(single) {
        if c.is_ascii_digit() {
            return c.to_string();
        }
    }
    debug.to_string()
}
