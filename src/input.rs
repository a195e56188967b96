// src/input.rs

//! Key and pointer translation from X11 codes to the normalized vocabulary.
//!
//! Every function here is total: an unrecognised code yields `KeySymbol::Unknown`,
//! `MouseButton::None` or `None` rather than an error, so the window's dispatch path
//! never has to special-case translation failures.

use crate::keys::{KeySymbol, Modifiers, MouseButton};
use log::trace;
use x11::{keysym, xlib};

/// The protocol's "no symbol" keysym.
pub const NO_SYMBOL: u64 = 0;

/// Offset of the direct Unicode keysym range (`0x01000000 + code point`).
const UNICODE_KEYSYM_BASE: u64 = 0x0100_0000;

/// Resolves a keycode at a shift level to a keysym. Implemented by protocol backends.
pub trait KeysymLookup {
    fn keycode_to_keysym(&self, keycode: u8, index: i32) -> u64;
}

/// Named (non-printable) keysyms. Keysyms sharing a symbol are left/right or keypad aliases.
static NAMED_KEYSYMS: &[(u32, KeySymbol)] = &[
    // Modifier keys
    (keysym::XK_Shift_L, KeySymbol::Shift),
    (keysym::XK_Shift_R, KeySymbol::Shift),
    (keysym::XK_Control_L, KeySymbol::Control),
    (keysym::XK_Control_R, KeySymbol::Control),
    (keysym::XK_Alt_L, KeySymbol::Alt),
    (keysym::XK_Alt_R, KeySymbol::Alt),
    (keysym::XK_Meta_L, KeySymbol::Alt),
    (keysym::XK_Meta_R, KeySymbol::Alt),
    (keysym::XK_Super_L, KeySymbol::Super),
    (keysym::XK_Super_R, KeySymbol::Super),
    (keysym::XK_Caps_Lock, KeySymbol::CapsLock),
    (keysym::XK_Num_Lock, KeySymbol::NumLock),
    // Editing and control
    (keysym::XK_Return, KeySymbol::Enter),
    (keysym::XK_BackSpace, KeySymbol::Backspace),
    (keysym::XK_Tab, KeySymbol::Tab),
    (keysym::XK_ISO_Left_Tab, KeySymbol::Tab),
    (keysym::XK_Escape, KeySymbol::Escape),
    (keysym::XK_Print, KeySymbol::PrintScreen),
    (keysym::XK_Scroll_Lock, KeySymbol::ScrollLock),
    (keysym::XK_Pause, KeySymbol::Pause),
    (keysym::XK_Menu, KeySymbol::Menu),
    // Navigation; keypad variants arrive when NumLock is off
    (keysym::XK_Home, KeySymbol::Home),
    (keysym::XK_KP_Home, KeySymbol::Home),
    (keysym::XK_Left, KeySymbol::Left),
    (keysym::XK_KP_Left, KeySymbol::Left),
    (keysym::XK_Up, KeySymbol::Up),
    (keysym::XK_KP_Up, KeySymbol::Up),
    (keysym::XK_Right, KeySymbol::Right),
    (keysym::XK_KP_Right, KeySymbol::Right),
    (keysym::XK_Down, KeySymbol::Down),
    (keysym::XK_KP_Down, KeySymbol::Down),
    (keysym::XK_Page_Up, KeySymbol::PageUp),
    (keysym::XK_KP_Page_Up, KeySymbol::PageUp),
    (keysym::XK_Page_Down, KeySymbol::PageDown),
    (keysym::XK_KP_Page_Down, KeySymbol::PageDown),
    (keysym::XK_End, KeySymbol::End),
    (keysym::XK_KP_End, KeySymbol::End),
    (keysym::XK_Insert, KeySymbol::Insert),
    (keysym::XK_KP_Insert, KeySymbol::Insert),
    (keysym::XK_Delete, KeySymbol::Delete),
    (keysym::XK_KP_Delete, KeySymbol::Delete),
    // Function keys
    (keysym::XK_F1, KeySymbol::F1),
    (keysym::XK_F2, KeySymbol::F2),
    (keysym::XK_F3, KeySymbol::F3),
    (keysym::XK_F4, KeySymbol::F4),
    (keysym::XK_F5, KeySymbol::F5),
    (keysym::XK_F6, KeySymbol::F6),
    (keysym::XK_F7, KeySymbol::F7),
    (keysym::XK_F8, KeySymbol::F8),
    (keysym::XK_F9, KeySymbol::F9),
    (keysym::XK_F10, KeySymbol::F10),
    (keysym::XK_F11, KeySymbol::F11),
    (keysym::XK_F12, KeySymbol::F12),
    (keysym::XK_F13, KeySymbol::F13),
    (keysym::XK_F14, KeySymbol::F14),
    (keysym::XK_F15, KeySymbol::F15),
    (keysym::XK_F16, KeySymbol::F16),
    (keysym::XK_F17, KeySymbol::F17),
    (keysym::XK_F18, KeySymbol::F18),
    (keysym::XK_F19, KeySymbol::F19),
    (keysym::XK_F20, KeySymbol::F20),
    (keysym::XK_F21, KeySymbol::F21),
    (keysym::XK_F22, KeySymbol::F22),
    (keysym::XK_F23, KeySymbol::F23),
    (keysym::XK_F24, KeySymbol::F24),
    // Keypad
    (keysym::XK_KP_0, KeySymbol::Keypad0),
    (keysym::XK_KP_1, KeySymbol::Keypad1),
    (keysym::XK_KP_2, KeySymbol::Keypad2),
    (keysym::XK_KP_3, KeySymbol::Keypad3),
    (keysym::XK_KP_4, KeySymbol::Keypad4),
    (keysym::XK_KP_5, KeySymbol::Keypad5),
    (keysym::XK_KP_Begin, KeySymbol::Keypad5),
    (keysym::XK_KP_6, KeySymbol::Keypad6),
    (keysym::XK_KP_7, KeySymbol::Keypad7),
    (keysym::XK_KP_8, KeySymbol::Keypad8),
    (keysym::XK_KP_9, KeySymbol::Keypad9),
    (keysym::XK_KP_Enter, KeySymbol::KeypadEnter),
    (keysym::XK_KP_Add, KeySymbol::KeypadPlus),
    (keysym::XK_KP_Subtract, KeySymbol::KeypadMinus),
    (keysym::XK_KP_Multiply, KeySymbol::KeypadMultiply),
    (keysym::XK_KP_Divide, KeySymbol::KeypadDivide),
    (keysym::XK_KP_Decimal, KeySymbol::KeypadDecimal),
    (keysym::XK_KP_Separator, KeySymbol::KeypadDecimal),
    (keysym::XK_KP_Equal, KeySymbol::KeypadEquals),
];

/// Resolves `keycode` to a keysym, picking the shifted level when shift is held.
///
/// Falls back to the unshifted level when the key has no shifted symbol.
pub fn keysym_for<L: KeysymLookup + ?Sized>(lookup: &L, keycode: u32, shift_active: bool) -> u64 {
    let Ok(code) = u8::try_from(keycode) else {
        trace!("Keycode {} out of protocol range; no keysym", keycode);
        return NO_SYMBOL;
    };
    let sym = lookup.keycode_to_keysym(code, i32::from(shift_active));
    if sym == NO_SYMBOL && shift_active {
        lookup.keycode_to_keysym(code, 0)
    } else {
        sym
    }
}

/// Maps a keysym to the normalized key identity.
pub fn key_for_keysym(keysym: u64) -> KeySymbol {
    if let Ok(sym) = u32::try_from(keysym) {
        if let Some((_, key)) = NAMED_KEYSYMS.iter().find(|(named, _)| *named == sym) {
            return *key;
        }
    }
    match keysym {
        // Latin-1 keysyms equal their code points.
        0x20..=0x7e | 0xa0..=0xff => KeySymbol::Char(char::from(keysym as u8)),
        k if k > UNICODE_KEYSYM_BASE => u32::try_from(k - UNICODE_KEYSYM_BASE)
            .ok()
            .and_then(char::from_u32)
            .map_or(KeySymbol::Unknown, KeySymbol::Char),
        _ => {
            trace!("Unmapped keysym 0x{:X}; normalizing to Unknown", keysym);
            KeySymbol::Unknown
        }
    }
}

/// Printable ASCII keysyms produce a single text character. Composition is left to an
/// input method layered above the window.
pub fn text_for_keysym(keysym: u64) -> Option<char> {
    match keysym {
        0x20..=0x7e => Some(char::from(keysym as u8)),
        _ => None,
    }
}

/// Decodes the core protocol state bitmask.
pub fn modifiers_for(state: u32) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    if state & xlib::ShiftMask != 0 {
        modifiers.insert(Modifiers::SHIFT);
    }
    if state & xlib::ControlMask != 0 {
        modifiers.insert(Modifiers::CONTROL);
    }
    if state & xlib::Mod1Mask != 0 {
        modifiers.insert(Modifiers::ALT);
    }
    if state & xlib::Mod4Mask != 0 {
        modifiers.insert(Modifiers::SUPER);
    }
    if state & xlib::LockMask != 0 {
        modifiers.insert(Modifiers::CAPS_LOCK);
    }
    if state & xlib::Mod2Mask != 0 {
        modifiers.insert(Modifiers::NUM_LOCK);
    }
    modifiers
}

/// Maps a protocol button code. Wheel codes 4 and 5 are handled by [`scroll_delta_for`]
/// and come back as `None` here, like any other unknown code.
pub fn button_for(code: u32) -> MouseButton {
    match code {
        1 => MouseButton::Left,
        2 => MouseButton::Middle,
        3 => MouseButton::Right,
        8 => MouseButton::XButton1,
        9 => MouseButton::XButton2,
        _ => MouseButton::None,
    }
}

/// Wheel "buttons": 4 scrolls up (negative), 5 scrolls down (positive).
pub fn scroll_delta_for(code: u32) -> Option<i32> {
    match code {
        4 => Some(-1),
        5 => Some(1),
        _ => None,
    }
}
