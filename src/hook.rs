//! Hook lifecycle and the public keyboard-state service.

use crate::error::{Error, Result};
use crate::event::{DeliveryMode, KeyTransition, Propagation, RawKeyEvent};
use crate::handler::{KeyEventHandler, RawEventSink};
use crate::keycode::Key;
use crate::listener::SharedListener;
use crate::platform;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// Opaque token for a live OS hook registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(usize);

impl HookHandle {
    /// Wrap a raw platform handle value.
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// The raw platform handle value.
    pub fn as_raw(&self) -> usize {
        self.0
    }
}

/// The OS side of the hook: installing and removing the interception point.
///
/// An installed backend must feed every raw keyboard event to `sink` and
/// honour the returned [`Propagation`]: pass the event to the next hook in the
/// chain on [`Propagation::Forward`], swallow it on [`Propagation::Suppress`].
pub trait HookBackend: Send + Sync {
    /// Install the interception point for `mode`.
    fn install(&self, mode: DeliveryMode, sink: Arc<dyn RawEventSink>) -> Result<HookHandle>;

    /// Remove a previously installed interception point.
    fn uninstall(&self, handle: HookHandle) -> Result<()>;
}

/// Global keyboard state tracker.
///
/// Tracks which keys are held and notifies key-down/key-up listeners, which
/// may vote to suppress the event. Use [`KeyboardHook::global`] for the
/// process-wide instance on the native backend.
///
/// # Example
///
/// ```no_run
/// use keyhook::{DeliveryMode, Key, KeyboardHook, listener};
///
/// let hook = KeyboardHook::global();
/// hook.add_key_down_listener(listener(|key| key == Key::F13));
/// hook.start(DeliveryMode::Background).expect("Failed to start hook");
///
/// // ... pump the thread's message loop ...
///
/// hook.stop();
/// ```
pub struct KeyboardHook {
    handler: Arc<KeyEventHandler>,
    backend: Box<dyn HookBackend>,
    handle: Mutex<Option<HookHandle>>,
    work_in_background: AtomicBool,
}

static GLOBAL: OnceLock<KeyboardHook> = OnceLock::new();

impl Default for KeyboardHook {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardHook {
    /// Create a hook on the native platform backend.
    pub fn new() -> Self {
        Self::with_backend(platform::PlatformBackend::default())
    }

    /// Create a hook on a custom backend.
    pub fn with_backend<B: HookBackend + 'static>(backend: B) -> Self {
        Self {
            handler: Arc::new(KeyEventHandler::new()),
            backend: Box::new(backend),
            handle: Mutex::new(None),
            work_in_background: AtomicBool::new(false),
        }
    }

    /// The process-wide instance.
    pub fn global() -> &'static KeyboardHook {
        GLOBAL.get_or_init(KeyboardHook::new)
    }

    fn handle(&self) -> MutexGuard<'_, Option<HookHandle>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install the hook.
    ///
    /// Fails with [`Error::AlreadyRunning`] if a hook is live, or with the
    /// backend's error if the OS refuses the registration. On failure the
    /// hook stays stopped.
    ///
    /// The foreground mode binds to the calling thread; the background mode
    /// is system-wide but, on Windows, is serviced through the calling
    /// thread's message loop. Either way that thread must keep pumping
    /// messages while the hook runs.
    pub fn start(&self, mode: DeliveryMode) -> Result<()> {
        let mut handle = self.handle();
        if handle.is_some() {
            return Err(Error::AlreadyRunning);
        }

        // Nothing was observed while stopped
        self.handler.pressed().clear();

        let sink: Arc<dyn RawEventSink> = self.handler.clone();
        let installed = self.backend.install(mode, sink)?;

        *handle = Some(installed);
        self.work_in_background
            .store(mode.is_background(), Ordering::SeqCst);
        log::debug!("keyboard hook started in {:?} mode", mode);
        Ok(())
    }

    /// Remove the hook and forget every held key. Does nothing if stopped.
    ///
    /// Calling this from inside a listener is allowed but the outcome for the
    /// event being dispatched is unspecified; avoid it.
    pub fn stop(&self) {
        let Some(installed) = self.handle().take() else {
            return;
        };

        if let Err(e) = self.backend.uninstall(installed) {
            log::warn!("{}", e);
        }

        self.handler.pressed().clear();
        log::debug!("keyboard hook stopped");
    }

    /// Check if the hook is installed.
    pub fn is_running(&self) -> bool {
        self.handle().is_some()
    }

    /// Whether the most recent successful start used the background mode.
    pub fn work_in_background(&self) -> bool {
        self.work_in_background.load(Ordering::SeqCst)
    }

    /// Mode of the most recent successful start.
    pub fn mode(&self) -> DeliveryMode {
        DeliveryMode::from_background_flag(self.work_in_background())
    }

    /// Check if a key is currently held.
    pub fn is_key_down(&self, key: Key) -> bool {
        self.handler.pressed().contains(key)
    }

    /// Check if any key is currently held.
    pub fn any_key_down(&self) -> bool {
        self.handler.pressed().any()
    }

    /// Number of keys currently held.
    pub fn pressed_keys_count(&self) -> usize {
        self.handler.pressed().len()
    }

    /// Snapshot of the keys currently held, sorted.
    pub fn pressed_keys(&self) -> Vec<Key> {
        self.handler.pressed().snapshot()
    }

    /// Check if either Shift is held.
    pub fn is_shift_held(&self) -> bool {
        self.handler.pressed().is_shift_held()
    }

    /// Check if either Control is held.
    pub fn is_ctrl_held(&self) -> bool {
        self.handler.pressed().is_ctrl_held()
    }

    /// Check if either Alt is held.
    pub fn is_alt_held(&self) -> bool {
        self.handler.pressed().is_alt_held()
    }

    /// Check if either Meta (Windows) key is held.
    pub fn is_meta_held(&self) -> bool {
        self.handler.pressed().is_meta_held()
    }

    /// Register a listener for key-down transitions.
    pub fn add_key_down_listener(&self, listener: SharedListener) {
        self.handler.down_listeners().add(listener);
    }

    /// Remove one registration of a key-down listener.
    pub fn remove_key_down_listener(&self, listener: &SharedListener) -> bool {
        self.handler.down_listeners().remove(listener)
    }

    /// Register a listener for key-up transitions.
    pub fn add_key_up_listener(&self, listener: SharedListener) {
        self.handler.up_listeners().add(listener);
    }

    /// Remove one registration of a key-up listener.
    pub fn remove_key_up_listener(&self, listener: &SharedListener) -> bool {
        self.handler.up_listeners().remove(listener)
    }

    /// Feed a raw event through the pipeline as if the OS had delivered it.
    pub fn process_raw(&self, event: &RawKeyEvent) -> Propagation {
        self.handler.on_raw_event(event)
    }

    /// Feed a decoded transition through state and dispatch.
    pub fn process_transition(&self, transition: KeyTransition) -> Propagation {
        self.handler.process_transition(transition)
    }
}

impl Drop for KeyboardHook {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start the process-wide hook.
///
/// Shorthand for `KeyboardHook::global().start(mode)`.
pub fn start(mode: DeliveryMode) -> Result<()> {
    KeyboardHook::global().start(mode)
}

/// Stop the process-wide hook.
pub fn stop() {
    KeyboardHook::global().stop();
}

/// Check if a key is held according to the process-wide hook.
pub fn is_key_down(key: Key) -> bool {
    KeyboardHook::global().is_key_down(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{WM_KEYDOWN, WM_KEYUP};
    use crate::event::RawPayload;
    use crate::listener::listener;
    use std::sync::atomic::AtomicUsize;

    /// Records lifecycle calls and keeps the sink so tests can play the OS.
    #[derive(Default)]
    struct RecordingBackend {
        state: Arc<BackendState>,
    }

    #[derive(Default)]
    struct BackendState {
        refuse: AtomicBool,
        installs: AtomicUsize,
        uninstalls: AtomicUsize,
        last_mode: Mutex<Option<DeliveryMode>>,
        sink: Mutex<Option<Arc<dyn RawEventSink>>>,
    }

    impl BackendState {
        /// Deliver a raw event like the OS would. `None` means swallowed,
        /// `Some(())` means forwarded to the next hook.
        fn deliver(&self, event: RawKeyEvent) -> Option<()> {
            let sink = self.sink.lock().unwrap().clone()?;
            match sink.on_raw_event(&event) {
                Propagation::Forward => Some(()),
                Propagation::Suppress => None,
            }
        }
    }

    impl HookBackend for RecordingBackend {
        fn install(&self, mode: DeliveryMode, sink: Arc<dyn RawEventSink>) -> Result<HookHandle> {
            if self.state.refuse.load(Ordering::SeqCst) {
                return Err(Error::HookStartFailed("refused".into()));
            }
            let n = self.state.installs.fetch_add(1, Ordering::SeqCst) + 1;
            *self.state.last_mode.lock().unwrap() = Some(mode);
            *self.state.sink.lock().unwrap() = Some(sink);
            Ok(HookHandle::from_raw(n))
        }

        fn uninstall(&self, _handle: HookHandle) -> Result<()> {
            self.state.uninstalls.fetch_add(1, Ordering::SeqCst);
            *self.state.sink.lock().unwrap() = None;
            Ok(())
        }
    }

    fn recording_hook() -> (KeyboardHook, Arc<BackendState>) {
        let backend = RecordingBackend::default();
        let state = backend.state.clone();
        (KeyboardHook::with_backend(backend), state)
    }

    fn key_down(vk: u32) -> RawKeyEvent {
        RawKeyEvent::new(RawPayload::Background {
            message: WM_KEYDOWN,
            virtual_key: vk,
            flags: 0,
        })
    }

    fn key_up(vk: u32) -> RawKeyEvent {
        RawKeyEvent::new(RawPayload::Background {
            message: WM_KEYUP,
            virtual_key: vk,
            flags: 0,
        })
    }

    #[test]
    fn test_start_stop_lifecycle() {
        let (hook, backend) = recording_hook();
        assert!(!hook.is_running());

        hook.start(DeliveryMode::Background).unwrap();
        assert!(hook.is_running());
        assert!(hook.work_in_background());
        assert_eq!(
            *backend.last_mode.lock().unwrap(),
            Some(DeliveryMode::Background)
        );

        hook.stop();
        assert!(!hook.is_running());
        assert_eq!(backend.uninstalls.load(Ordering::SeqCst), 1);
        // Mode survives the stop
        assert!(hook.work_in_background());
    }

    #[test]
    fn test_double_start_fails() {
        let (hook, backend) = recording_hook();
        hook.start(DeliveryMode::Foreground).unwrap();

        let err = hook.start(DeliveryMode::Background).unwrap_err();
        assert!(matches!(err, Error::AlreadyRunning));
        assert_eq!(backend.installs.load(Ordering::SeqCst), 1);
        assert!(!hook.work_in_background());
        assert_eq!(hook.mode(), DeliveryMode::Foreground);
    }

    #[test]
    fn test_refused_registration_stays_stopped() {
        let (hook, backend) = recording_hook();
        backend.refuse.store(true, Ordering::SeqCst);

        assert!(matches!(
            hook.start(DeliveryMode::Background),
            Err(Error::HookStartFailed(_))
        ));
        assert!(!hook.is_running());

        backend.refuse.store(false, Ordering::SeqCst);
        hook.start(DeliveryMode::Background).unwrap();
        assert!(hook.is_running());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (hook, backend) = recording_hook();
        hook.stop();
        hook.start(DeliveryMode::Background).unwrap();
        hook.stop();
        hook.stop();
        assert_eq!(backend.uninstalls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_clears_held_keys() {
        let (hook, backend) = recording_hook();
        hook.start(DeliveryMode::Background).unwrap();

        backend.deliver(key_down(0x41));
        backend.deliver(key_down(0x42));
        assert_eq!(hook.pressed_keys_count(), 2);

        hook.stop();
        assert!(!hook.any_key_down());

        hook.start(DeliveryMode::Background).unwrap();
        assert_eq!(hook.pressed_keys_count(), 0);
        assert!(!hook.is_key_down(Key::KeyA));
    }

    #[test]
    fn test_example_scenario() {
        let (hook, backend) = recording_hook();
        hook.add_key_down_listener(listener(|key| key == Key::KeyA));
        hook.start(DeliveryMode::Background).unwrap();

        // Down(A): suppressed
        assert_eq!(backend.deliver(key_down(0x41)), None);
        assert_eq!(hook.pressed_keys(), vec![Key::KeyA]);

        // Down(B): forwarded
        assert_eq!(backend.deliver(key_down(0x42)), Some(()));
        assert_eq!(hook.pressed_keys(), vec![Key::KeyA, Key::KeyB]);

        // Up(A): no up-listeners, forwarded
        assert_eq!(backend.deliver(key_up(0x41)), Some(()));
        assert_eq!(hook.pressed_keys(), vec![Key::KeyB]);
    }

    #[test]
    fn test_listener_registration_through_service() {
        let (hook, _backend) = recording_hook();
        let ups = Arc::new(AtomicUsize::new(0));
        let u = ups.clone();
        let up = listener(move |_| {
            u.fetch_add(1, Ordering::SeqCst);
            false
        });
        let down = listener(|_| true);

        hook.add_key_down_listener(down.clone());
        hook.add_key_up_listener(up.clone());

        assert!(hook.process_transition(KeyTransition::down(Key::KeyX)).is_suppressed());
        hook.process_transition(KeyTransition::up(Key::KeyX));
        assert_eq!(ups.load(Ordering::SeqCst), 1);

        assert!(hook.remove_key_down_listener(&down));
        assert!(hook.remove_key_up_listener(&up));
        assert!(!hook.remove_key_up_listener(&up));

        assert_eq!(
            hook.process_transition(KeyTransition::down(Key::KeyX)),
            Propagation::Forward
        );
        hook.process_transition(KeyTransition::up(Key::KeyX));
        assert_eq!(ups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_modifier_queries() {
        let (hook, _backend) = recording_hook();
        hook.process_raw(&key_down(0xA1));
        hook.process_raw(&key_down(0xA4));
        assert!(hook.is_shift_held());
        assert!(hook.is_alt_held());
        assert!(!hook.is_ctrl_held());
        assert!(!hook.is_meta_held());
    }

    #[test]
    fn test_stop_from_inside_listener() {
        let hook = Arc::new(recording_hook().0);
        let weak = Arc::downgrade(&hook);
        hook.add_key_down_listener(listener(move |key| {
            if key == Key::Escape {
                if let Some(hook) = weak.upgrade() {
                    hook.stop();
                }
            }
            false
        }));

        hook.start(DeliveryMode::Background).unwrap();
        hook.process_raw(&key_down(0x41));
        hook.process_raw(&key_down(0x1B));

        assert!(!hook.is_running());
        assert!(!hook.any_key_down());
    }
}
