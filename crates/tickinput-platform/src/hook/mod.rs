//! Global input hook feeding per-device queues.
//!
//! The hook runs on its own thread and never calls listeners: it only turns
//! OS events into [`RawKeyEvent`] / [`RawMouseEvent`] values and pushes them
//! into bounded channels. Devices drain those channels when polled.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tickinput_core::MouseButton;
use tracing::info;

mod rdev_impl;

/// A keyboard event as captured by the hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawKeyEvent {
    Down { key: String, text: Option<char> },
    Up { key: String },
}

/// A mouse event as captured by the hook, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawMouseEvent {
    Move { x: f64, y: f64 },
    Down(MouseButton),
    Up(MouseButton),
    Wheel { delta_x: i64, delta_y: i64 },
}

/// Either kind of raw event.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    Key(RawKeyEvent),
    Mouse(RawMouseEvent),
}

/// Receiving ends of the hook's queues.
///
/// Clones share the same queues: an event is taken by whichever clone
/// receives it first.
#[derive(Clone)]
pub struct HookQueues {
    pub keys: Receiver<RawKeyEvent>,
    pub mouse: Receiver<RawMouseEvent>,
}

impl HookQueues {
    /// Drop every queued event. Returns how many were discarded.
    pub fn discard_pending(&self) -> usize {
        self.keys.try_iter().count() + self.mouse.try_iter().count()
    }
}

/// Handle to control the hook thread.
pub struct HookHandle {
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl HookHandle {
    /// Signal the hook to stop forwarding events.
    pub fn stop(&self) {
        let _ = self.stop_tx.try_send(());
    }

    /// Check if the hook thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().map_or(false, |t| !t.is_finished())
    }
}

impl Drop for HookHandle {
    fn drop(&mut self) {
        self.stop();
        // Not joined: rdev's listen never returns. The thread goes idle once stopped.
        let _ = self.thread.take();
    }
}

/// Start the global hook with queues of `capacity` events each.
pub fn start_hook(capacity: usize) -> (HookHandle, HookQueues) {
    let (key_tx, key_rx) = bounded(capacity);
    let (mouse_tx, mouse_rx) = bounded(capacity);
    let (stop_tx, stop_rx) = bounded(1);

    let thread = thread::spawn(move || {
        rdev_impl::run_hook(key_tx, mouse_tx, stop_rx);
    });
    info!(capacity, "input hook thread spawned");

    (
        HookHandle {
            stop_tx,
            thread: Some(thread),
        },
        HookQueues {
            keys: key_rx,
            mouse: mouse_rx,
        },
    )
}
