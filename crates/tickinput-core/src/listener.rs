//! Listener traits and the name-keyed registries that fan events out to them.

use crate::event::{KeyEvent, MouseButton, MouseEvent};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::btree_map::{BTreeMap, Entry};
use std::rc::{Rc, Weak};
use tracing::{trace, warn};

/// Receives keyboard events.
///
/// The return value asks whether the event should keep propagating to the
/// listeners after this one. It is only honoured under
/// [`Propagation::StopOnFalse`].
pub trait KeyListener {
    fn key_pressed(&mut self, event: &KeyEvent) -> bool;
    fn key_released(&mut self, event: &KeyEvent) -> bool;
}

/// Receives mouse events. See [`KeyListener`] for the return value.
pub trait MouseListener {
    fn mouse_moved(&mut self, event: &MouseEvent) -> bool;
    fn mouse_pressed(&mut self, event: &MouseEvent, button: MouseButton) -> bool;
    fn mouse_released(&mut self, event: &MouseEvent, button: MouseButton) -> bool;
}

/// How a dispatch reacts to a listener returning `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    /// Every registered listener sees every event; return values are ignored.
    #[default]
    Broadcast,
    /// A listener returning `false` ends the dispatch of that event.
    StopOnFalse,
}

/// Named, non-owning listener registrations for one event category.
///
/// Entries are kept in a `BTreeMap`, so dispatch visits listeners in
/// lexicographic name order. The registry only holds `Weak` handles: a
/// listener dropped by its owner without being unregistered is skipped.
pub struct ListenerRegistry<T: ?Sized> {
    entries: BTreeMap<String, Weak<RefCell<T>>>,
    propagation: Propagation,
}

pub type KeyListenerRegistry = ListenerRegistry<dyn KeyListener>;
pub type MouseListenerRegistry = ListenerRegistry<dyn MouseListener>;

impl<T: ?Sized> ListenerRegistry<T> {
    pub fn new(propagation: Propagation) -> Self {
        Self {
            entries: BTreeMap::new(),
            propagation,
        }
    }

    pub fn propagation(&self) -> Propagation {
        self.propagation
    }

    pub fn set_propagation(&mut self, propagation: Propagation) {
        self.propagation = propagation;
    }

    /// Store `listener` under `name` unless the name is taken.
    ///
    /// Returns whether the listener was stored; the first registrant wins.
    /// A listener dropped without being removed still occupies its name
    /// until [`remove`](Self::remove) or [`clear`](Self::clear) frees it.
    pub fn insert(&mut self, name: impl Into<String>, listener: Weak<RefCell<T>>) -> bool {
        match self.entries.entry(name.into()) {
            Entry::Vacant(slot) => {
                slot.insert(listener);
                true
            }
            Entry::Occupied(slot) => {
                trace!(name = %slot.key(), "listener name already registered, ignoring");
                false
            }
        }
    }

    /// Remove the registration under `name`.
    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Remove the first registration (in name order) pointing at `listener`.
    ///
    /// Only one entry is removed even if the same listener was stored under
    /// several names.
    pub fn remove_ref<L: ?Sized>(&mut self, listener: &Rc<RefCell<L>>) -> bool {
        let target = Rc::as_ptr(listener) as *const ();
        let found = self
            .entries
            .iter()
            .find(|(_, weak)| weak.as_ptr() as *const () == target)
            .map(|(name, _)| name.clone());

        match found {
            Some(name) => self.entries.remove(&name).is_some(),
            None => false,
        }
    }

    /// The live listener registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Rc<RefCell<T>>> {
        self.entries.get(name).and_then(Weak::upgrade)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in dispatch order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Call `handler` on every live listener in name order.
    ///
    /// Always returns `true`: the outcome reported to the device never
    /// depends on what the listeners answered.
    fn dispatch(&self, mut handler: impl FnMut(&mut T) -> bool) -> bool {
        for (name, weak) in &self.entries {
            let Some(shared) = weak.upgrade() else {
                trace!(%name, "listener dropped without unregistering, skipping");
                continue;
            };
            let Ok(mut listener) = shared.try_borrow_mut() else {
                warn!(%name, "listener already borrowed during dispatch, skipping");
                continue;
            };

            let keep_going = handler(&mut *listener);
            if !keep_going && self.propagation == Propagation::StopOnFalse {
                trace!(%name, "listener stopped propagation");
                break;
            }
        }
        true
    }
}

impl<T: ?Sized> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new(Propagation::default())
    }
}

impl KeyListener for KeyListenerRegistry {
    fn key_pressed(&mut self, event: &KeyEvent) -> bool {
        trace!(key = %event.key, listeners = self.len(), "dispatch key pressed");
        self.dispatch(|listener| listener.key_pressed(event))
    }

    fn key_released(&mut self, event: &KeyEvent) -> bool {
        trace!(key = %event.key, listeners = self.len(), "dispatch key released");
        self.dispatch(|listener| listener.key_released(event))
    }
}

impl MouseListener for MouseListenerRegistry {
    fn mouse_moved(&mut self, event: &MouseEvent) -> bool {
        trace!(x = event.state.x.abs, y = event.state.y.abs, "dispatch mouse moved");
        self.dispatch(|listener| listener.mouse_moved(event))
    }

    fn mouse_pressed(&mut self, event: &MouseEvent, button: MouseButton) -> bool {
        trace!(?button, "dispatch mouse pressed");
        self.dispatch(|listener| listener.mouse_pressed(event, button))
    }

    fn mouse_released(&mut self, event: &MouseEvent, button: MouseButton) -> bool {
        trace!(?button, "dispatch mouse released");
        self.dispatch(|listener| listener.mouse_released(event, button))
    }
}
