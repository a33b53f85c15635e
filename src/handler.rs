//! The per-event callback pipeline: decode, update state, dispatch, decide.
//!
//! This runs synchronously inside the OS input path. It never unwinds back
//! into the OS: any panic is caught and the event is forwarded, because a
//! stuck or crashed hook blocks keyboard input for the whole desktop.

use crate::decode;
use crate::event::{KeyDirection, KeyTransition, Propagation, RawKeyEvent};
use crate::listener::{self, DispatchOutcome, ListenerList};
use crate::state::PressedKeys;
use std::panic::{self, AssertUnwindSafe};

/// Receiver of raw events from a hook backend.
pub trait RawEventSink: Send + Sync {
    /// Handle one raw event and tell the backend whether to forward it.
    fn on_raw_event(&self, event: &RawKeyEvent) -> Propagation;
}

/// Pressed-key state plus the down/up listener lists.
#[derive(Default)]
pub struct KeyEventHandler {
    pressed: PressedKeys,
    down: ListenerList,
    up: ListenerList,
}

impl KeyEventHandler {
    /// Create a handler with no keys held and no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// The pressed-key set.
    pub fn pressed(&self) -> &PressedKeys {
        &self.pressed
    }

    /// The key-down listeners.
    pub fn down_listeners(&self) -> &ListenerList {
        &self.down
    }

    /// The key-up listeners.
    pub fn up_listeners(&self) -> &ListenerList {
        &self.up
    }

    /// Commit a transition to the pressed-key set and notify listeners.
    ///
    /// Returns `None` when the set did not change (a repeated down or an up
    /// for a key that was not held); no listener runs in that case.
    pub fn route(&self, transition: KeyTransition) -> Option<DispatchOutcome> {
        let KeyTransition { key, direction } = transition;
        let (changed, listeners) = match direction {
            KeyDirection::Down => (self.pressed.press(key), &self.down),
            KeyDirection::Up => (self.pressed.release(key), &self.up),
        };

        if !changed {
            return None;
        }

        Some(listeners.dispatch(key))
    }

    /// Run a decoded transition through state and dispatch.
    pub fn process_transition(&self, transition: KeyTransition) -> Propagation {
        let suppress = self
            .route(transition)
            .is_some_and(|outcome| outcome.suppress);
        Propagation::from_suppress(suppress)
    }

    /// Run a raw event through the whole pipeline.
    pub fn process_raw(&self, event: &RawKeyEvent) -> Propagation {
        if event.is_passthrough() {
            return Propagation::Forward;
        }

        match decode::decode(&event.payload) {
            Some(transition) => self.process_transition(transition),
            None => {
                log::debug!("ignoring non-key record {:?}", event.payload);
                Propagation::Forward
            }
        }
    }
}

impl RawEventSink for KeyEventHandler {
    fn on_raw_event(&self, event: &RawKeyEvent) -> Propagation {
        match panic::catch_unwind(AssertUnwindSafe(|| self.process_raw(event))) {
            Ok(propagation) => propagation,
            Err(payload) => {
                log::error!(
                    "keyboard callback panicked, forwarding event: {}",
                    listener::panic_message(payload.as_ref())
                );
                Propagation::Forward
            }
        }
    }
}
