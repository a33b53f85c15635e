//! Channel-based transition receiving.
//!
//! Listeners run on the OS input path and must return immediately. These
//! helpers register observe-only listeners that push each transition into a
//! channel so the application can process them on its own thread.
//!
//! # Example
//!
//! ```no_run
//! use keyhook::channel::subscribe;
//! use keyhook::{DeliveryMode, KeyboardHook};
//! use std::time::Duration;
//!
//! let hook = KeyboardHook::global();
//! let (_subscription, rx) = subscribe(hook, 256);
//! hook.start(DeliveryMode::Background).expect("Failed to start hook");
//!
//! while let Ok(transition) = rx.recv_timeout(Duration::from_secs(10)) {
//!     println!("{:?}", transition);
//! }
//! ```
//!
//! # Example (Async with Tokio)
//!
//! ```ignore
//! use keyhook::channel::subscribe_async;
//! use keyhook::KeyboardHook;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (_subscription, mut rx) = subscribe_async(KeyboardHook::global(), 256);
//!
//!     while let Some(transition) = rx.recv().await {
//!         println!("{:?}", transition);
//!     }
//! }
//! ```

use crate::event::{KeyDirection, KeyTransition};
use crate::hook::KeyboardHook;
use crate::keycode::Key;
use crate::listener::{KeyListener, SharedListener};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};

/// Something a transition can be pushed into without blocking.
trait TransitionSender: Clone + Send + Sync + 'static {
    fn offer(&self, transition: KeyTransition);
}

impl TransitionSender for SyncSender<KeyTransition> {
    fn offer(&self, transition: KeyTransition) {
        // Never block the hook: drop when the consumer is behind
        if let Err(TrySendError::Full(dropped)) = self.try_send(transition) {
            log::debug!("transition channel full, dropping {:?}", dropped);
        }
    }
}

impl TransitionSender for Sender<KeyTransition> {
    fn offer(&self, transition: KeyTransition) {
        let _ = self.send(transition);
    }
}

/// Listener that forwards transitions of one direction into a channel.
struct ChannelListener<S: TransitionSender> {
    sender: S,
    direction: KeyDirection,
}

impl<S: TransitionSender> KeyListener for ChannelListener<S> {
    fn on_key(&self, key: Key) -> bool {
        self.sender.offer(KeyTransition {
            key,
            direction: self.direction,
        });
        false
    }
}

/// Registration of a channel's listeners on a hook.
///
/// The listeners are removed when this is dropped.
pub struct Subscription<'a> {
    hook: &'a KeyboardHook,
    down: SharedListener,
    up: SharedListener,
}

impl<'a> Subscription<'a> {
    fn register<S: TransitionSender>(hook: &'a KeyboardHook, sender: S) -> Self {
        let down: SharedListener = Arc::new(ChannelListener {
            sender: sender.clone(),
            direction: KeyDirection::Down,
        });
        let up: SharedListener = Arc::new(ChannelListener {
            sender,
            direction: KeyDirection::Up,
        });

        hook.add_key_down_listener(down.clone());
        hook.add_key_up_listener(up.clone());

        Self { hook, down, up }
    }

    /// Remove the listeners now.
    pub fn cancel(self) {}
}

impl Drop for Subscription<'_> {
    fn drop(&mut self) {
        self.hook.remove_key_down_listener(&self.down);
        self.hook.remove_key_up_listener(&self.up);
    }
}

/// Receive transitions through a bounded channel.
///
/// # Arguments
///
/// * `capacity` - Maximum number of transitions to buffer. When the buffer
///   is full, new transitions are dropped rather than stalling input.
pub fn subscribe(
    hook: &KeyboardHook,
    capacity: usize,
) -> (Subscription<'_>, Receiver<KeyTransition>) {
    let (sender, receiver) = mpsc::sync_channel(capacity);
    (Subscription::register(hook, sender), receiver)
}

/// Receive transitions through an unbounded channel.
///
/// No transition is dropped, but a stalled consumer grows the queue without
/// limit.
pub fn subscribe_unbounded(hook: &KeyboardHook) -> (Subscription<'_>, Receiver<KeyTransition>) {
    let (sender, receiver) = mpsc::channel();
    (Subscription::register(hook, sender), receiver)
}

// ============================================================================
// Tokio async support (behind feature flag)
// ============================================================================

#[cfg(feature = "tokio")]
pub use tokio_channel::*;

#[cfg(feature = "tokio")]
mod tokio_channel {
    use super::*;
    use tokio::sync::mpsc as tokio_mpsc;

    impl TransitionSender for tokio_mpsc::Sender<KeyTransition> {
        fn offer(&self, transition: KeyTransition) {
            if let Err(tokio_mpsc::error::TrySendError::Full(dropped)) =
                self.try_send(transition)
            {
                log::debug!("transition channel full, dropping {:?}", dropped);
            }
        }
    }

    /// Receive transitions through a bounded tokio channel.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of transitions to buffer
    pub fn subscribe_async(
        hook: &KeyboardHook,
        capacity: usize,
    ) -> (Subscription<'_>, tokio_mpsc::Receiver<KeyTransition>) {
        let (sender, receiver) = tokio_mpsc::channel(capacity);
        (Subscription::register(hook, sender), receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformBackend;

    fn detached_hook() -> KeyboardHook {
        KeyboardHook::with_backend(PlatformBackend::default())
    }

    #[test]
    fn test_transitions_arrive_in_order() {
        let hook = detached_hook();
        let (_subscription, rx) = subscribe(&hook, 16);

        hook.process_transition(KeyTransition::down(Key::KeyA));
        hook.process_transition(KeyTransition::down(Key::KeyA));
        hook.process_transition(KeyTransition::up(Key::KeyA));

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![KeyTransition::down(Key::KeyA), KeyTransition::up(Key::KeyA)]
        );
    }

    #[test]
    fn test_full_channel_drops_without_suppressing() {
        let hook = detached_hook();
        let (_subscription, rx) = subscribe(&hook, 1);

        assert!(
            !hook
                .process_transition(KeyTransition::down(Key::KeyA))
                .is_suppressed()
        );
        assert!(
            !hook
                .process_transition(KeyTransition::down(Key::KeyB))
                .is_suppressed()
        );

        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(hook.pressed_keys_count(), 2);
    }

    #[test]
    fn test_drop_removes_listeners() {
        let hook = detached_hook();
        let (subscription, rx) = subscribe_unbounded(&hook);
        subscription.cancel();

        hook.process_transition(KeyTransition::down(Key::KeyA));
        assert!(rx.try_recv().is_err());
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn test_async_channel() {
        let hook = detached_hook();
        let (_subscription, mut rx) = subscribe_async(&hook, 8);

        hook.process_transition(KeyTransition::down(Key::Space));
        assert_eq!(rx.recv().await, Some(KeyTransition::down(Key::Space)));
    }
}
