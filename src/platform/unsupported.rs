//! Fallback backend for platforms without a keyboard hook implementation.
//!
//! Installing always fails, so `start` reports an error and the hook stays
//! stopped. Synthetic events can still be fed through
//! [`KeyboardHook::process_raw`](crate::KeyboardHook::process_raw).

use crate::error::{Error, Result};
use crate::event::DeliveryMode;
use crate::handler::RawEventSink;
use crate::hook::{HookBackend, HookHandle};
use std::sync::Arc;

/// Backend that refuses every installation.
#[derive(Debug, Default)]
pub struct UnsupportedBackend;

impl HookBackend for UnsupportedBackend {
    fn install(&self, mode: DeliveryMode, _sink: Arc<dyn RawEventSink>) -> Result<HookHandle> {
        Err(Error::NotSupported(format!(
            "no {:?} keyboard hook on this platform",
            mode
        )))
    }

    fn uninstall(&self, _handle: HookHandle) -> Result<()> {
        Ok(())
    }
}
