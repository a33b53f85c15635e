//! Raw event decoding.
//!
//! Turns the records the OS hands to the hook callback into a
//! [`KeyTransition`]. Everything here is pure and total: an unmapped key code
//! becomes [`Key::Unknown`], and a record that is not a key transition at all
//! decodes to `None` so the caller can pass it along untouched.

use crate::event::{KeyDirection, KeyTransition, RawPayload};
use crate::keycode::Key;

// Window messages carried by low-level keyboard records
pub const WM_KEYDOWN: u32 = 0x0100;
pub const WM_KEYUP: u32 = 0x0101;
pub const WM_SYSKEYDOWN: u32 = 0x0104;
pub const WM_SYSKEYUP: u32 = 0x0105;

// Foreground keystroke flags (lParam of a WH_KEYBOARD callback)
const KF_EXTENDED_BIT: u32 = 1 << 24;
const KF_TRANSITION_BIT: u32 = 1 << 31;
const KF_SCAN_CODE_SHIFT: u32 = 16;

// Low-level record flags (KBDLLHOOKSTRUCT::flags)
const LLKHF_EXTENDED: u32 = 0x01;

// Generic virtual keys only reported by the foreground hook
const VK_SHIFT: u32 = 0x10;
const VK_CONTROL: u32 = 0x11;
const VK_MENU: u32 = 0x12;

// Scan code of the right shift key
const SCAN_RIGHT_SHIFT: u32 = 0x36;

/// Decode a raw event record into a key transition.
///
/// Returns `None` for low-level records whose message is not one of the
/// four keyboard messages.
pub fn decode(payload: &RawPayload) -> Option<KeyTransition> {
    match *payload {
        RawPayload::Foreground { virtual_key, flags } => Some(KeyTransition {
            key: foreground_key(virtual_key, flags),
            direction: foreground_direction(flags),
        }),
        RawPayload::Background {
            message,
            virtual_key,
            flags,
        } => {
            let direction = message_direction(message)?;
            let extended = flags & LLKHF_EXTENDED != 0;
            Some(KeyTransition {
                key: with_extended(virtual_key_to_key(virtual_key), extended),
                direction,
            })
        }
    }
}

/// Direction from the transition-state bit of the foreground flags word.
pub fn foreground_direction(flags: u32) -> KeyDirection {
    if flags & KF_TRANSITION_BIT != 0 {
        KeyDirection::Up
    } else {
        KeyDirection::Down
    }
}

/// Direction from a low-level keyboard message.
///
/// System variants (sent while Alt is held or for F10) count the same as the
/// normal ones.
pub fn message_direction(message: u32) -> Option<KeyDirection> {
    match message {
        WM_KEYDOWN | WM_SYSKEYDOWN => Some(KeyDirection::Down),
        WM_KEYUP | WM_SYSKEYUP => Some(KeyDirection::Up),
        _ => None,
    }
}

/// The foreground hook reports generic Shift/Control/Alt codes; use the scan
/// code and extended bit to recover which side was pressed.
fn foreground_key(virtual_key: u32, flags: u32) -> Key {
    let extended = flags & KF_EXTENDED_BIT != 0;
    match virtual_key {
        VK_SHIFT => {
            let scan_code = (flags >> KF_SCAN_CODE_SHIFT) & 0xFF;
            if scan_code == SCAN_RIGHT_SHIFT {
                Key::ShiftRight
            } else {
                Key::ShiftLeft
            }
        }
        VK_CONTROL if extended => Key::ControlRight,
        VK_MENU if extended => Key::AltRight,
        _ => with_extended(virtual_key_to_key(virtual_key), extended),
    }
}

fn with_extended(key: Key, extended: bool) -> Key {
    match key {
        Key::Enter if extended => Key::NumpadEnter,
        other => other,
    }
}

/// Convert a Windows virtual-key code to our Key enum.
pub fn virtual_key_to_key(code: u32) -> Key {
    match code {
        // Letters
        0x41 => Key::KeyA,
        0x42 => Key::KeyB,
        0x43 => Key::KeyC,
        0x44 => Key::KeyD,
        0x45 => Key::KeyE,
        0x46 => Key::KeyF,
        0x47 => Key::KeyG,
        0x48 => Key::KeyH,
        0x49 => Key::KeyI,
        0x4A => Key::KeyJ,
        0x4B => Key::KeyK,
        0x4C => Key::KeyL,
        0x4D => Key::KeyM,
        0x4E => Key::KeyN,
        0x4F => Key::KeyO,
        0x50 => Key::KeyP,
        0x51 => Key::KeyQ,
        0x52 => Key::KeyR,
        0x53 => Key::KeyS,
        0x54 => Key::KeyT,
        0x55 => Key::KeyU,
        0x56 => Key::KeyV,
        0x57 => Key::KeyW,
        0x58 => Key::KeyX,
        0x59 => Key::KeyY,
        0x5A => Key::KeyZ,

        // Numbers
        0x30 => Key::Num0,
        0x31 => Key::Num1,
        0x32 => Key::Num2,
        0x33 => Key::Num3,
        0x34 => Key::Num4,
        0x35 => Key::Num5,
        0x36 => Key::Num6,
        0x37 => Key::Num7,
        0x38 => Key::Num8,
        0x39 => Key::Num9,

        // Function keys
        0x70 => Key::F1,
        0x71 => Key::F2,
        0x72 => Key::F3,
        0x73 => Key::F4,
        0x74 => Key::F5,
        0x75 => Key::F6,
        0x76 => Key::F7,
        0x77 => Key::F8,
        0x78 => Key::F9,
        0x79 => Key::F10,
        0x7A => Key::F11,
        0x7B => Key::F12,
        0x7C => Key::F13,
        0x7D => Key::F14,
        0x7E => Key::F15,
        0x7F => Key::F16,
        0x80 => Key::F17,
        0x81 => Key::F18,
        0x82 => Key::F19,
        0x83 => Key::F20,
        0x84 => Key::F21,
        0x85 => Key::F22,
        0x86 => Key::F23,
        0x87 => Key::F24,

        // Modifiers
        0x10 | 0xA0 => Key::ShiftLeft,
        0xA1 => Key::ShiftRight,
        0x11 | 0xA2 => Key::ControlLeft,
        0xA3 => Key::ControlRight,
        0x12 | 0xA4 => Key::AltLeft,
        0xA5 => Key::AltRight,
        0x5B => Key::MetaLeft,
        0x5C => Key::MetaRight,

        // Navigation
        0x1B => Key::Escape,
        0x09 => Key::Tab,
        0x14 => Key::CapsLock,
        0x20 => Key::Space,
        0x0D => Key::Enter,
        0x08 => Key::Backspace,
        0x2D => Key::Insert,
        0x2E => Key::Delete,
        0x24 => Key::Home,
        0x23 => Key::End,
        0x21 => Key::PageUp,
        0x22 => Key::PageDown,
        0x26 => Key::ArrowUp,
        0x28 => Key::ArrowDown,
        0x25 => Key::ArrowLeft,
        0x27 => Key::ArrowRight,

        // Lock keys
        0x90 => Key::NumLock,
        0x91 => Key::ScrollLock,
        0x2C => Key::PrintScreen,
        0x13 => Key::Pause,

        // Punctuation (US layout OEM codes)
        0xC0 => Key::Grave,
        0xBD => Key::Minus,
        0xBB => Key::Equal,
        0xDB => Key::BracketLeft,
        0xDD => Key::BracketRight,
        0xDC => Key::Backslash,
        0xBA => Key::Semicolon,
        0xDE => Key::Quote,
        0xBC => Key::Comma,
        0xBE => Key::Period,
        0xBF => Key::Slash,

        // Numpad
        0x60 => Key::Numpad0,
        0x61 => Key::Numpad1,
        0x62 => Key::Numpad2,
        0x63 => Key::Numpad3,
        0x64 => Key::Numpad4,
        0x65 => Key::Numpad5,
        0x66 => Key::Numpad6,
        0x67 => Key::Numpad7,
        0x68 => Key::Numpad8,
        0x69 => Key::Numpad9,
        0x6B => Key::NumpadAdd,
        0x6D => Key::NumpadSubtract,
        0x6A => Key::NumpadMultiply,
        0x6F => Key::NumpadDivide,
        0x6E => Key::NumpadDecimal,
        0x92 => Key::NumpadEqual,

        // Media
        0xAF => Key::VolumeUp,
        0xAE => Key::VolumeDown,
        0xAD => Key::VolumeMute,
        0xB3 => Key::MediaPlayPause,
        0xB2 => Key::MediaStop,
        0xB0 => Key::MediaNext,
        0xB1 => Key::MediaPrevious,

        // Browser
        0xA6 => Key::BrowserBack,
        0xA7 => Key::BrowserForward,
        0xA8 => Key::BrowserRefresh,
        0xA9 => Key::BrowserStop,
        0xAA => Key::BrowserSearch,
        0xAB => Key::BrowserFavorites,
        0xAC => Key::BrowserHome,

        // Applications
        0xB4 => Key::LaunchMail,
        0xB6 => Key::LaunchApp1,
        0xB7 => Key::LaunchApp2,

        // International
        0xE2 => Key::IntlBackslash,

        0x5D => Key::ContextMenu,

        _ => Key::Unknown(code),
    }
}
