//! # keyhook
//!
//! Global keyboard state tracking: intercept every keyboard event the OS
//! delivers, keep the set of currently-held keys, and notify key-down and
//! key-up listeners, which may vote to keep the event from reaching other
//! applications.
//!
//! ## Features
//!
//! - Two delivery modes: a thread-scoped foreground hook and a system-wide
//!   background (low-level) hook, both feeding one state model
//! - Edge-only notification: auto-repeat downs and stray ups never reach
//!   listeners
//! - Suppression voting: an event is swallowed if any listener asks for it,
//!   and every listener still sees it
//! - Panicking listeners are isolated; the hook fails open
//! - Channel helpers for processing transitions off the input path
//!
//! ## Quick Start
//!
//! ```no_run
//! use keyhook::{DeliveryMode, Key, KeyboardHook, listener};
//!
//! let hook = KeyboardHook::global();
//!
//! // Swallow F13, let everything else through
//! hook.add_key_down_listener(listener(|key| key == Key::F13));
//! hook.start(DeliveryMode::Background).expect("Failed to start hook");
//!
//! if hook.is_key_down(Key::ShiftLeft) {
//!     println!("shift is held");
//! }
//! ```
//!
//! ## Architecture
//!
//! A platform [`HookBackend`] installs the OS interception point and hands
//! every raw record to the [`KeyEventHandler`]. The handler decodes it
//! ([`decode`]), commits the transition to the [`PressedKeys`] set, and, only
//! if the set actually changed, dispatches to the listeners of that
//! direction. The aggregated vote goes back to the backend as a
//! [`Propagation`].
//!
//! Only Windows has a native backend. Elsewhere [`KeyboardHook::start`]
//! reports [`Error::NotSupported`], while synthetic events can still be
//! injected with [`KeyboardHook::process_raw`].

pub mod channel;
pub mod decode;
pub mod error;
pub mod event;
pub mod handler;
pub mod hook;
pub mod keycode;
pub mod listener;
pub mod state;

mod platform;

// Re-exports
pub use error::{Error, Result};
pub use event::{DeliveryMode, KeyDirection, KeyTransition, Propagation, RawKeyEvent, RawPayload};
pub use handler::{KeyEventHandler, RawEventSink};
pub use hook::{HookBackend, HookHandle, KeyboardHook, is_key_down, start, stop};
pub use keycode::Key;
pub use listener::{
    DispatchOutcome, KeyListener, ListenerFailure, ListenerList, SharedListener, listener,
};
pub use platform::PlatformBackend;
pub use state::PressedKeys;
