//! Listener registry and dispatch.

use crate::error::Error;
use crate::keycode::Key;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

/// Trait for observing key transitions.
///
/// Return `true` to request that the event be suppressed (kept from reaching
/// other applications). Listeners run synchronously on the OS input path and
/// must return quickly.
pub trait KeyListener: Send + Sync {
    /// Called for every genuine transition of a key.
    fn on_key(&self, key: Key) -> bool;
}

/// Implement KeyListener for closures.
impl<F> KeyListener for F
where
    F: Fn(Key) -> bool + Send + Sync,
{
    fn on_key(&self, key: Key) -> bool {
        self(key)
    }
}

/// A shared listener reference, as stored by the registry.
pub type SharedListener = Arc<dyn KeyListener>;

/// Wrap a closure into a [`SharedListener`].
///
/// Keep the returned value to remove the listener later.
pub fn listener<F>(f: F) -> SharedListener
where
    F: Fn(Key) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A listener that panicked during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    /// Position of the listener in the snapshot that was dispatched.
    pub index: usize,
    /// The panic payload, if it was a string.
    pub message: String,
}

impl From<ListenerFailure> for Error {
    fn from(failure: ListenerFailure) -> Self {
        Error::ListenerPanicked(format!("#{}: {}", failure.index, failure.message))
    }
}

/// Aggregated result of notifying every listener of one transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// At least one listener asked for suppression.
    pub suppress: bool,
    /// Number of listeners invoked.
    pub invoked: usize,
    /// Listeners that panicked. They count as "no suppression".
    pub failures: Vec<ListenerFailure>,
}

impl DispatchOutcome {
    /// Check if every listener returned normally.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered list of listeners for one direction.
///
/// Duplicates are allowed: a listener added twice runs twice.
#[derive(Default)]
pub struct ListenerList {
    listeners: RwLock<Vec<SharedListener>>,
}

impl ListenerList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener.
    pub fn add(&self, listener: SharedListener) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Remove the first occurrence of `listener` (by pointer identity).
    ///
    /// Returns `true` if one was removed.
    pub fn remove(&self, listener: &SharedListener) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match listeners.iter().position(|l| Arc::ptr_eq(l, listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current list. Dispatch iterates this so listeners can
    /// add or remove listeners without deadlocking or disturbing the pass.
    fn snapshot(&self) -> Vec<SharedListener> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Invoke every listener in registration order.
    ///
    /// There is no short-circuit: every listener sees the key even after an
    /// earlier one voted to suppress.
    pub fn dispatch(&self, key: Key) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        for (index, listener) in self.snapshot().iter().enumerate() {
            outcome.invoked += 1;
            match panic::catch_unwind(AssertUnwindSafe(|| listener.on_key(key))) {
                Ok(suppress) => outcome.suppress |= suppress,
                Err(payload) => {
                    let failure = ListenerFailure {
                        index,
                        message: panic_message(payload.as_ref()),
                    };
                    log::error!("{} while handling {:?}", Error::from(failure.clone()), key);
                    outcome.failures.push(failure);
                }
            }
        }

        outcome
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dispatch_runs_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let list = ListenerList::new();

        for id in 0..3 {
            let order = order.clone();
            list.add(listener(move |_| {
                order.lock().unwrap().push(id);
                false
            }));
        }

        let outcome = list.dispatch(Key::KeyA);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(outcome.invoked, 3);
        assert!(!outcome.suppress);
    }

    #[test]
    fn test_any_vote_suppresses_without_short_circuit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let list = ListenerList::new();

        let c = calls.clone();
        list.add(listener(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            true
        }));
        let c = calls.clone();
        list.add(listener(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            false
        }));

        let outcome = list.dispatch(Key::KeyA);
        assert!(outcome.suppress);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_duplicate_add_and_single_remove() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let l = listener(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            false
        });

        let list = ListenerList::new();
        list.add(l.clone());
        list.add(l.clone());
        assert_eq!(list.len(), 2);

        list.dispatch(Key::KeyZ);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(list.remove(&l));
        assert_eq!(list.len(), 1);
        list.dispatch(Key::KeyZ);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        assert!(list.remove(&l));
        assert!(!list.remove(&l));
        assert!(list.is_empty());
    }

    #[test]
    fn test_remove_unknown_listener() {
        let list = ListenerList::new();
        list.add(listener(|_| false));
        assert!(!list.remove(&listener(|_| false)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let after = Arc::new(AtomicUsize::new(0));
        let list = ListenerList::new();

        list.add(listener(|_| panic!("listener bug")));
        let a = after.clone();
        list.add(listener(move |_| {
            a.fetch_add(1, Ordering::SeqCst);
            false
        }));

        let outcome = list.dispatch(Key::KeyA);
        assert_eq!(after.load(Ordering::SeqCst), 1);
        assert!(!outcome.suppress);
        assert!(!outcome.is_clean());
        assert_eq!(outcome.failures[0].index, 0);
        assert_eq!(outcome.failures[0].message, "listener bug");
    }

    #[test]
    fn test_removal_during_dispatch_applies_next_pass() {
        let list = Arc::new(ListenerList::new());
        let second_calls = Arc::new(AtomicUsize::new(0));

        let c = second_calls.clone();
        let second = listener(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            false
        });

        let list_ref = Arc::downgrade(&list);
        let second_ref = second.clone();
        list.add(listener(move |_| {
            if let Some(list) = list_ref.upgrade() {
                list.remove(&second_ref);
            }
            false
        }));
        list.add(second);

        // Snapshot taken before the first listener removed the second
        list.dispatch(Key::KeyA);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);

        list.dispatch(Key::KeyA);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(list.len(), 1);
    }
}
