//! Pressed-key state tracking.
//!
//! [`PressedKeys`] is the authoritative set of keys currently held down. Only
//! the hook callback path writes to it; any thread may read it. Writes report
//! whether they were a real edge so that auto-repeat downs and spurious ups
//! never reach listeners.

use crate::keycode::Key;
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Set of keys currently held down.
#[derive(Debug, Default)]
pub struct PressedKeys {
    keys: RwLock<HashSet<Key>>,
}

impl PressedKeys {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashSet<Key>> {
        self.keys.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<Key>> {
        self.keys.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a key going down. Returns `true` if it was not already held.
    #[inline]
    pub fn press(&self, key: Key) -> bool {
        self.write().insert(key)
    }

    /// Record a key coming up. Returns `true` if it was held.
    #[inline]
    pub fn release(&self, key: Key) -> bool {
        self.write().remove(&key)
    }

    /// Forget every held key.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Check if a specific key is held.
    #[inline]
    pub fn contains(&self, key: Key) -> bool {
        self.read().contains(&key)
    }

    /// Check if any key is held.
    #[inline]
    pub fn any(&self) -> bool {
        !self.read().is_empty()
    }

    /// Number of keys held.
    #[inline]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if no key is held.
    pub fn is_empty(&self) -> bool {
        !self.any()
    }

    /// Snapshot of the held keys, sorted.
    pub fn snapshot(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.read().iter().copied().collect();
        keys.sort();
        keys
    }

    fn any_of(&self, candidates: &[Key]) -> bool {
        let keys = self.read();
        candidates.iter().any(|key| keys.contains(key))
    }

    /// Check if either Shift is held.
    pub fn is_shift_held(&self) -> bool {
        self.any_of(&[Key::ShiftLeft, Key::ShiftRight])
    }

    /// Check if either Control is held.
    pub fn is_ctrl_held(&self) -> bool {
        self.any_of(&[Key::ControlLeft, Key::ControlRight])
    }

    /// Check if either Alt is held.
    pub fn is_alt_held(&self) -> bool {
        self.any_of(&[Key::AltLeft, Key::AltRight])
    }

    /// Check if either Meta (Windows) key is held.
    pub fn is_meta_held(&self) -> bool {
        self.any_of(&[Key::MetaLeft, Key::MetaRight])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release_edges() {
        let keys = PressedKeys::new();
        assert!(!keys.any());

        assert!(keys.press(Key::KeyA));
        assert!(!keys.press(Key::KeyA));
        assert_eq!(keys.len(), 1);
        assert!(keys.contains(Key::KeyA));

        assert!(keys.release(Key::KeyA));
        assert!(!keys.release(Key::KeyA));
        assert!(keys.is_empty());
    }

    #[test]
    fn test_release_without_press() {
        let keys = PressedKeys::new();
        assert!(!keys.release(Key::KeyB));
        assert_eq!(keys.len(), 0);
    }

    #[test]
    fn test_modifier_queries() {
        let keys = PressedKeys::new();

        keys.press(Key::ShiftRight);
        assert!(keys.is_shift_held());
        assert!(!keys.is_ctrl_held());

        keys.press(Key::ControlLeft);
        keys.press(Key::MetaLeft);
        assert!(keys.is_ctrl_held());
        assert!(keys.is_meta_held());
        assert!(!keys.is_alt_held());

        keys.clear();
        assert!(!keys.is_shift_held());
        assert!(!keys.is_ctrl_held());
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let keys = PressedKeys::new();
        keys.press(Key::KeyC);
        keys.press(Key::KeyA);
        keys.press(Key::KeyB);
        assert_eq!(keys.snapshot(), vec![Key::KeyA, Key::KeyB, Key::KeyC]);
    }
}
