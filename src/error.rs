//! Error types for the keyboard hook.

use thiserror::Error;

/// Result type alias for keyhook operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while installing, removing or driving the hook.
#[derive(Debug, Error)]
pub enum Error {
    /// Hook is already running.
    #[error("hook is already running")]
    AlreadyRunning,

    /// The OS refused to install the interception point.
    #[error("failed to start hook: {0}")]
    HookStartFailed(String),

    /// The OS refused to remove the interception point.
    #[error("failed to stop hook: {0}")]
    HookStopFailed(String),

    /// A listener panicked while being notified.
    #[error("listener panicked: {0}")]
    ListenerPanicked(String),

    /// The requested feature is not supported on this platform.
    #[error("not supported: {0}")]
    NotSupported(String),
}
