//! Event types flowing through the hook pipeline.

use crate::keycode::Key;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Direction of a key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KeyDirection {
    /// The key went down.
    Down,
    /// The key came up.
    Up,
}

/// A decoded key transition: one per raw keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyTransition {
    /// The key that changed.
    pub key: Key,
    /// Whether it went down or up.
    pub direction: KeyDirection,
}

impl KeyTransition {
    /// Create a key-down transition.
    pub fn down(key: Key) -> Self {
        Self {
            key,
            direction: KeyDirection::Down,
        }
    }

    /// Create a key-up transition.
    pub fn up(key: Key) -> Self {
        Self {
            key,
            direction: KeyDirection::Up,
        }
    }

    /// Check if this is a key-down transition.
    pub fn is_down(&self) -> bool {
        self.direction == KeyDirection::Down
    }
}

/// Which OS delivery mechanism the hook is installed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeliveryMode {
    /// Thread-scoped hook on the calling thread. Only sees input while the
    /// host application has focus.
    #[default]
    Foreground,
    /// System-wide low-level hook. Sees input regardless of focus.
    Background,
}

impl DeliveryMode {
    /// Pick the mode from a "work in background" flag.
    pub fn from_background_flag(work_in_background: bool) -> Self {
        if work_in_background {
            DeliveryMode::Background
        } else {
            DeliveryMode::Foreground
        }
    }

    /// Check if this is the background (low-level) mode.
    pub fn is_background(&self) -> bool {
        *self == DeliveryMode::Background
    }
}

impl From<bool> for DeliveryMode {
    fn from(work_in_background: bool) -> Self {
        Self::from_background_flag(work_in_background)
    }
}

/// Raw event data as delivered by the OS, before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawPayload {
    /// Foreground hook record: the virtual key and the keystroke flags word
    /// (repeat count, scan code, transition state in bit 31).
    Foreground { virtual_key: u32, flags: u32 },
    /// Low-level hook record: the window message (`WM_KEYDOWN` and friends)
    /// plus the virtual key and `LLKHF_*` flags from the event structure.
    Background {
        message: u32,
        virtual_key: u32,
        flags: u32,
    },
}

/// One raw invocation of the OS callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    /// The hook processing code. Negative values must be passed along
    /// without being acted on.
    pub code: i32,
    /// The event record.
    pub payload: RawPayload,
}

impl RawKeyEvent {
    /// Create a raw event with the "action" processing code.
    pub fn new(payload: RawPayload) -> Self {
        Self { code: 0, payload }
    }

    /// Create a raw event with an explicit processing code.
    pub fn with_code(code: i32, payload: RawPayload) -> Self {
        Self { code, payload }
    }

    /// Check if the OS asked for this event to be passed along untouched.
    pub fn is_passthrough(&self) -> bool {
        self.code < 0
    }
}

/// What the backend should do with the raw event after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Propagation {
    /// Hand the event to the next hook in the chain.
    Forward,
    /// Swallow the event so no other application sees it.
    Suppress,
}

impl Propagation {
    /// Map a "suppress" vote to a propagation decision.
    pub fn from_suppress(suppress: bool) -> Self {
        if suppress {
            Propagation::Suppress
        } else {
            Propagation::Forward
        }
    }

    /// Check if the event is swallowed.
    pub fn is_suppressed(&self) -> bool {
        *self == Propagation::Suppress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(DeliveryMode::from(true), DeliveryMode::Background);
        assert_eq!(DeliveryMode::from(false), DeliveryMode::Foreground);
        assert!(DeliveryMode::Background.is_background());
        assert_eq!(DeliveryMode::default(), DeliveryMode::Foreground);
    }

    #[test]
    fn test_passthrough_code() {
        let payload = RawPayload::Foreground {
            virtual_key: 0x41,
            flags: 0,
        };
        assert!(!RawKeyEvent::new(payload).is_passthrough());
        assert!(RawKeyEvent::with_code(-1, payload).is_passthrough());
        assert!(!RawKeyEvent::with_code(3, payload).is_passthrough());
    }

    #[test]
    fn test_propagation_from_vote() {
        assert!(Propagation::from_suppress(true).is_suppressed());
        assert_eq!(Propagation::from_suppress(false), Propagation::Forward);
    }
}
