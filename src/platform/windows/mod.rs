//! Windows platform implementation.

mod listen;

pub use listen::WindowsBackend;
