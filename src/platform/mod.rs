//! Platform-specific hook backends.

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
pub use self::windows::WindowsBackend as PlatformBackend;

#[cfg(not(target_os = "windows"))]
mod unsupported;
#[cfg(not(target_os = "windows"))]
pub use self::unsupported::UnsupportedBackend as PlatformBackend;
