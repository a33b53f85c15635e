//! Windows keyboard hooks using SetWindowsHookEx.
//!
//! The background mode installs `WH_KEYBOARD_LL`, which sees every keystroke
//! on the desktop. The foreground mode installs `WH_KEYBOARD` on the calling
//! thread, which only sees keystrokes while that thread's windows have focus.
//! Both callbacks run on the installing thread while it pumps messages.

use crate::error::{Error, Result};
use crate::event::{DeliveryMode, Propagation, RawKeyEvent, RawPayload};
use crate::handler::RawEventSink;
use crate::hook::{HookBackend, HookHandle};
use std::sync::{Arc, Mutex, PoisonError};

// Wrapper for HHOOK to make it Send + Sync
#[derive(Clone, Copy)]
struct SendableHHOOK(HHOOK);

// SAFETY: HHOOK is an opaque handle owned by the OS; it carries no
// thread affinity for the calls made with it here.
unsafe impl Send for SendableHHOOK {}
unsafe impl Sync for SendableHHOOK {}
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, HHOOK, KBDLLHOOKSTRUCT, SetWindowsHookExW, UnhookWindowsHookEx, WH_KEYBOARD,
    WH_KEYBOARD_LL,
};

/// Returned to the OS to swallow an event.
const HANDLED: LRESULT = LRESULT(1);

/// Where the callbacks deliver raw events.
static SINK: Mutex<Option<Arc<dyn RawEventSink>>> = Mutex::new(None);

/// The one live hook in this process.
static ACTIVE_HOOK: Mutex<Option<SendableHHOOK>> = Mutex::new(None);

fn current_sink() -> Option<Arc<dyn RawEventSink>> {
    SINK.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn active_hook() -> Option<HHOOK> {
    ACTIVE_HOOK
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .map(|h| h.0)
}

/// Pass the event to the next hook in the chain.
unsafe fn forward(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe { CallNextHookEx(active_hook(), code, wparam, lparam) }
}

/// Hand the event to the sink and act on its decision.
///
/// The sink is cloned out of its lock first so a listener may stop the hook
/// from inside the callback.
unsafe fn respond(event: RawKeyEvent, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let propagation = current_sink()
        .map(|sink| sink.on_raw_event(&event))
        .unwrap_or(Propagation::Forward);

    match propagation {
        Propagation::Suppress => HANDLED,
        Propagation::Forward => unsafe { forward(event.code, wparam, lparam) },
    }
}

/// WH_KEYBOARD callback: wParam is the virtual key, lParam the keystroke flags.
unsafe extern "system" fn foreground_callback(
    code: i32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if code < 0 {
        return unsafe { forward(code, wparam, lparam) };
    }

    let event = RawKeyEvent::with_code(
        code,
        RawPayload::Foreground {
            virtual_key: wparam.0 as u32,
            flags: lparam.0 as u32,
        },
    );
    unsafe { respond(event, wparam, lparam) }
}

/// WH_KEYBOARD_LL callback: wParam is the message, lParam a KBDLLHOOKSTRUCT.
unsafe extern "system" fn background_callback(
    code: i32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if code < 0 || lparam.0 == 0 {
        return unsafe { forward(code, wparam, lparam) };
    }

    let kb = unsafe { *(lparam.0 as *const KBDLLHOOKSTRUCT) };
    let event = RawKeyEvent::with_code(
        code,
        RawPayload::Background {
            message: wparam.0 as u32,
            virtual_key: kb.vkCode,
            flags: kb.flags.0,
        },
    );
    unsafe { respond(event, wparam, lparam) }
}

/// Hook backend on the Win32 hook chain.
///
/// Only one hook can be live per process; a second install fails with
/// [`Error::AlreadyRunning`].
#[derive(Debug, Default)]
pub struct WindowsBackend;

impl HookBackend for WindowsBackend {
    fn install(&self, mode: DeliveryMode, sink: Arc<dyn RawEventSink>) -> Result<HookHandle> {
        let mut active = ACTIVE_HOOK.lock().unwrap_or_else(PoisonError::into_inner);
        if active.is_some() {
            return Err(Error::AlreadyRunning);
        }

        // Set before installing so the first event already has a target
        *SINK.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);

        let result = unsafe {
            match mode {
                DeliveryMode::Background => {
                    SetWindowsHookExW(WH_KEYBOARD_LL, Some(background_callback), None, 0)
                }
                DeliveryMode::Foreground => SetWindowsHookExW(
                    WH_KEYBOARD,
                    Some(foreground_callback),
                    None,
                    GetCurrentThreadId(),
                ),
            }
        };

        match result {
            Ok(hook) => {
                *active = Some(SendableHHOOK(hook));
                log::debug!("installed {:?} keyboard hook", mode);
                Ok(HookHandle::from_raw(hook.0 as usize))
            }
            Err(e) => {
                *SINK.lock().unwrap_or_else(PoisonError::into_inner) = None;
                Err(Error::HookStartFailed(format!(
                    "Failed to set {:?} keyboard hook: {}",
                    mode, e
                )))
            }
        }
    }

    fn uninstall(&self, handle: HookHandle) -> Result<()> {
        let hook = {
            let mut active = ACTIVE_HOOK.lock().unwrap_or_else(PoisonError::into_inner);
            let is_current = active.is_some_and(|hook| hook.0.0 as usize == handle.as_raw());
            if is_current {
                active.take()
            } else {
                None
            }
        };

        *SINK.lock().unwrap_or_else(PoisonError::into_inner) = None;

        let Some(hook) = hook else {
            return Err(Error::HookStopFailed(format!(
                "handle {:#x} is not the active hook",
                handle.as_raw()
            )));
        };

        unsafe { UnhookWindowsHookEx(hook.0) }
            .map_err(|e| Error::HookStopFailed(format!("Failed to remove keyboard hook: {}", e)))
    }
}
