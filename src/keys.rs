// src/keys.rs

//! The input vocabulary `Window` speaks: key identities, modifier sets and pointer buttons.
//!
//! Nothing here knows about keysyms or protocol masks; `input.rs` maps those onto these types.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Modifier set carried by key and pointer events.
    ///
    /// Held modifiers are `SHIFT`..`SUPER`; `CAPS_LOCK` and `NUM_LOCK` are latched states.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2; // Mod1
        const SUPER = 1 << 3; // Mod4
        const CAPS_LOCK = 1 << 4;
        const NUM_LOCK = 1 << 5; // Mod2
    }
}

/// A key after shift-level resolution. Anything the translator can't name is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum KeySymbol {
    /// Latin-1 or Unicode character key, already shifted.
    Char(char),

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

    // Left and right variants collapse into one identity.
    Shift,
    Control,
    Alt,
    Super,
    CapsLock,
    NumLock,

    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Insert,
    Delete,

    Enter,
    Backspace,
    Tab,
    Escape,
    PrintScreen,
    ScrollLock,
    Pause,
    Menu,

    // Keypad digits and operators; keypad navigation aliases map to the plain keys above.
    Keypad0,
    Keypad1,
    Keypad2,
    Keypad3,
    Keypad4,
    Keypad5,
    Keypad6,
    Keypad7,
    Keypad8,
    Keypad9,
    KeypadEnter,
    KeypadPlus,
    KeypadMinus,
    KeypadMultiply,
    KeypadDivide,
    KeypadDecimal,
    KeypadEquals,

    #[default]
    Unknown,
}

impl KeySymbol {
    /// The held modifier this key drives, if any.
    ///
    /// Lock keys return `None`: their flag toggles on press, so it can't be derived from
    /// whether the key is down.
    pub fn held_modifier(&self) -> Option<Modifiers> {
        match self {
            KeySymbol::Shift => Some(Modifiers::SHIFT),
            KeySymbol::Control => Some(Modifiers::CONTROL),
            KeySymbol::Alt => Some(Modifiers::ALT),
            KeySymbol::Super => Some(Modifiers::SUPER),
            _ => None,
        }
    }
}

/// Pointer buttons. Wheel codes never land here; the window turns them into scroll events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    /// Back.
    XButton1,
    /// Forward.
    XButton2,
    #[default]
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_name_the_flag_of_each_held_modifier_key() {
        assert_eq!(KeySymbol::Shift.held_modifier(), Some(Modifiers::SHIFT));
        assert_eq!(KeySymbol::Control.held_modifier(), Some(Modifiers::CONTROL));
        assert_eq!(KeySymbol::Alt.held_modifier(), Some(Modifiers::ALT));
        assert_eq!(KeySymbol::Super.held_modifier(), Some(Modifiers::SUPER));
    }

    #[test]
    fn it_should_leave_lock_and_ordinary_keys_without_a_held_flag() {
        assert_eq!(KeySymbol::CapsLock.held_modifier(), None);
        assert_eq!(KeySymbol::NumLock.held_modifier(), None);
        assert_eq!(KeySymbol::Char('a').held_modifier(), None);
        assert_eq!(KeySymbol::Unknown.held_modifier(), None);
    }
}
