//! Normalized key identities.
//!
//! A [`Key`] names one physical key independently of the platform code it was
//! decoded from. Codes without a dedicated variant are kept as
//! [`Key::Unknown`] so decoding never fails.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Key {
    // Letters
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF,
    KeyG,
    KeyH,
    KeyI,
    KeyJ,
    KeyK,
    KeyL,
    KeyM,
    KeyN,
    KeyO,
    KeyP,
    KeyQ,
    KeyR,
    KeyS,
    KeyT,
    KeyU,
    KeyV,
    KeyW,
    KeyX,
    KeyY,
    KeyZ,

    // Numbers (top row)
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    F21,
    F22,
    F23,
    F24,

    // Modifiers
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    MetaLeft, // Windows key
    MetaRight,

    // Navigation
    Escape,
    Tab,
    CapsLock,
    Space,
    Enter,
    Backspace,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    // Lock keys
    NumLock,
    ScrollLock,
    PrintScreen,
    Pause,

    // Punctuation and symbols
    Grave,        // ` ~
    Minus,        // - _
    Equal,        // = +
    BracketLeft,  // [ {
    BracketRight, // ] }
    Backslash,    // \ |
    Semicolon,    // ; :
    Quote,        // ' "
    Comma,        // , <
    Period,       // . >
    Slash,        // / ?

    // Numpad
    Numpad0,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad4,
    Numpad5,
    Numpad6,
    Numpad7,
    Numpad8,
    Numpad9,
    NumpadAdd,
    NumpadSubtract,
    NumpadMultiply,
    NumpadDivide,
    NumpadDecimal,
    NumpadEnter,
    NumpadEqual,

    // Media keys
    VolumeUp,
    VolumeDown,
    VolumeMute,
    MediaPlayPause,
    MediaStop,
    MediaNext,
    MediaPrevious,

    // Browser keys
    BrowserBack,
    BrowserForward,
    BrowserRefresh,
    BrowserStop,
    BrowserSearch,
    BrowserFavorites,
    BrowserHome,

    // Application keys
    LaunchMail,
    LaunchApp1,
    LaunchApp2,

    // 102nd key on ISO keyboards
    IntlBackslash,

    ContextMenu,

    // Unmapped platform code
    Unknown(u32),
}

impl Key {
    /// Map a Windows virtual-key code to a [`Key`].
    ///
    /// Total: codes with no dedicated variant become [`Key::Unknown`].
    pub fn from_virtual_key(code: u32) -> Self {
        crate::decode::virtual_key_to_key(code)
    }

    /// Whether this key has a dedicated variant.
    pub fn is_known(&self) -> bool {
        !matches!(self, Key::Unknown(_))
    }

    // Variants are declared in groups, so the derived ordering gives ranges.
    fn in_group(&self, first: Key, last: Key) -> bool {
        (first..=last).contains(self)
    }

    /// Check if this is a modifier key (Shift, Control, Alt, Meta).
    pub fn is_modifier(&self) -> bool {
        self.in_group(Key::ShiftLeft, Key::MetaRight)
    }

    /// Check if this is a letter key.
    pub fn is_letter(&self) -> bool {
        self.in_group(Key::KeyA, Key::KeyZ)
    }

    /// Check if this is a number key (top row).
    pub fn is_number(&self) -> bool {
        self.in_group(Key::Num0, Key::Num9)
    }

    /// Check if this is a function key.
    pub fn is_function_key(&self) -> bool {
        self.in_group(Key::F1, Key::F24)
    }

    /// Check if this is a numpad key.
    pub fn is_numpad(&self) -> bool {
        self.in_group(Key::Numpad0, Key::NumpadEqual)
    }

    /// Check if this is an arrow or paging key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Key::ArrowUp
                | Key::ArrowDown
                | Key::ArrowLeft
                | Key::ArrowRight
                | Key::Home
                | Key::End
                | Key::PageUp
                | Key::PageDown
        )
    }
}

impl Default for Key {
    fn default() -> Self {
        Key::Unknown(0)
    }
}
