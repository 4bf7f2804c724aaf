//! HID usage to Linux keycode tables
//!
//! Both tables are fixed for the life of the process. Scancodes are USB HID
//! usage IDs from the Keyboard/Keypad page (0x07); keycodes are the kernel's
//! `KEY_*` numbers as exposed by [`evdev::Key`].

use evdev::Key;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

/// A Linux input keycode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<u16> for KeyCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<Key> for KeyCode {
    fn from(key: Key) -> Self {
        Self(key.code())
    }
}

/// Modifier bit positions in report byte 0, in emission order
pub static MODIFIER_MAP: [(u8, Key); 8] = [
    (0, Key::KEY_LEFTCTRL),
    (1, Key::KEY_LEFTSHIFT),
    (2, Key::KEY_LEFTALT),
    (3, Key::KEY_LEFTMETA),
    (4, Key::KEY_RIGHTCTRL),
    (5, Key::KEY_RIGHTSHIFT),
    (6, Key::KEY_RIGHTALT),
    (7, Key::KEY_RIGHTMETA),
];

const SCANCODE_TABLE: &[(u8, Key)] = &[
    // Letters
    (0x04, Key::KEY_A),
    (0x05, Key::KEY_B),
    (0x06, Key::KEY_C),
    (0x07, Key::KEY_D),
    (0x08, Key::KEY_E),
    (0x09, Key::KEY_F),
    (0x0a, Key::KEY_G),
    (0x0b, Key::KEY_H),
    (0x0c, Key::KEY_I),
    (0x0d, Key::KEY_J),
    (0x0e, Key::KEY_K),
    (0x0f, Key::KEY_L),
    (0x10, Key::KEY_M),
    (0x11, Key::KEY_N),
    (0x12, Key::KEY_O),
    (0x13, Key::KEY_P),
    (0x14, Key::KEY_Q),
    (0x15, Key::KEY_R),
    (0x16, Key::KEY_S),
    (0x17, Key::KEY_T),
    (0x18, Key::KEY_U),
    (0x19, Key::KEY_V),
    (0x1a, Key::KEY_W),
    (0x1b, Key::KEY_X),
    (0x1c, Key::KEY_Y),
    (0x1d, Key::KEY_Z),
    // Number row
    (0x1e, Key::KEY_1),
    (0x1f, Key::KEY_2),
    (0x20, Key::KEY_3),
    (0x21, Key::KEY_4),
    (0x22, Key::KEY_5),
    (0x23, Key::KEY_6),
    (0x24, Key::KEY_7),
    (0x25, Key::KEY_8),
    (0x26, Key::KEY_9),
    (0x27, Key::KEY_0),
    (0x28, Key::KEY_ENTER),
    (0x29, Key::KEY_ESC),
    (0x2a, Key::KEY_BACKSPACE),
    (0x2b, Key::KEY_TAB),
    (0x2c, Key::KEY_SPACE),
    (0x2d, Key::KEY_MINUS),
    (0x2e, Key::KEY_EQUAL),
    (0x2f, Key::KEY_LEFTBRACE),
    (0x30, Key::KEY_RIGHTBRACE),
    (0x31, Key::KEY_BACKSLASH),
    // Non-US '#' shares the backslash keycode
    (0x32, Key::KEY_BACKSLASH),
    (0x33, Key::KEY_SEMICOLON),
    (0x34, Key::KEY_APOSTROPHE),
    (0x35, Key::KEY_GRAVE),
    (0x36, Key::KEY_COMMA),
    (0x37, Key::KEY_DOT),
    (0x38, Key::KEY_SLASH),
    (0x39, Key::KEY_CAPSLOCK),
    // Function row
    (0x3a, Key::KEY_F1),
    (0x3b, Key::KEY_F2),
    (0x3c, Key::KEY_F3),
    (0x3d, Key::KEY_F4),
    (0x3e, Key::KEY_F5),
    (0x3f, Key::KEY_F6),
    (0x40, Key::KEY_F7),
    (0x41, Key::KEY_F8),
    (0x42, Key::KEY_F9),
    (0x43, Key::KEY_F10),
    (0x44, Key::KEY_F11),
    (0x45, Key::KEY_F12),
    (0x46, Key::KEY_SYSRQ),
    (0x47, Key::KEY_SCROLLLOCK),
    (0x48, Key::KEY_PAUSE),
    // Navigation cluster
    (0x49, Key::KEY_INSERT),
    (0x4a, Key::KEY_HOME),
    (0x4b, Key::KEY_PAGEUP),
    (0x4c, Key::KEY_DELETE),
    (0x4d, Key::KEY_END),
    (0x4e, Key::KEY_PAGEDOWN),
    (0x4f, Key::KEY_RIGHT),
    (0x50, Key::KEY_LEFT),
    (0x51, Key::KEY_DOWN),
    (0x52, Key::KEY_UP),
    // Keypad
    (0x53, Key::KEY_NUMLOCK),
    (0x54, Key::KEY_KPSLASH),
    (0x55, Key::KEY_KPASTERISK),
    (0x56, Key::KEY_KPMINUS),
    (0x57, Key::KEY_KPPLUS),
    (0x58, Key::KEY_KPENTER),
    (0x59, Key::KEY_KP1),
    (0x5a, Key::KEY_KP2),
    (0x5b, Key::KEY_KP3),
    (0x5c, Key::KEY_KP4),
    (0x5d, Key::KEY_KP5),
    (0x5e, Key::KEY_KP6),
    (0x5f, Key::KEY_KP7),
    (0x60, Key::KEY_KP8),
    (0x61, Key::KEY_KP9),
    (0x62, Key::KEY_KP0),
    (0x63, Key::KEY_KPDOT),
    (0x64, Key::KEY_102ND),
    (0x65, Key::KEY_COMPOSE),
    (0x66, Key::KEY_POWER),
    (0x67, Key::KEY_KPEQUAL),
];

/// Static HID scancode to keycode map
pub static SCANCODE_MAP: LazyLock<HashMap<u8, KeyCode>> = LazyLock::new(|| {
    SCANCODE_TABLE
        .iter()
        .map(|&(scancode, key)| (scancode, KeyCode::from(key)))
        .collect()
});

/// Look up the keycode for a HID scancode.
///
/// Returns `None` for scancodes the table does not cover; such keys are still
/// tracked as held but never reach the virtual device.
pub fn scancode_to_keycode(scancode: u8) -> Option<KeyCode> {
    SCANCODE_MAP.get(&scancode).copied()
}

/// Every keycode the bridge can ever emit: all modifiers plus the image of
/// the scancode map. The virtual device must advertise exactly this set.
pub fn advertised_keycodes() -> BTreeSet<KeyCode> {
    MODIFIER_MAP
        .iter()
        .map(|&(_, key)| KeyCode::from(key))
        .chain(SCANCODE_MAP.values().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_to_linux_keycodes() {
        assert_eq!(scancode_to_keycode(0x04), Some(KeyCode(30)));
        assert_eq!(scancode_to_keycode(0x1a), Some(KeyCode(17)));
        assert_eq!(scancode_to_keycode(0x1d), Some(KeyCode(44)));
    }

    #[test]
    fn non_us_hash_shares_backslash() {
        assert_eq!(scancode_to_keycode(0x31), scancode_to_keycode(0x32));
        assert_eq!(scancode_to_keycode(0x32), Some(KeyCode(43)));
    }

    #[test]
    fn unmapped_scancodes_return_none() {
        assert_eq!(scancode_to_keycode(0x00), None);
        assert_eq!(scancode_to_keycode(0x68), None);
        assert_eq!(scancode_to_keycode(0xe0), None);
        assert_eq!(scancode_to_keycode(0xff), None);
    }

    #[test]
    fn modifier_map_is_ordered_by_bit() {
        let bits: Vec<u8> = MODIFIER_MAP.iter().map(|(bit, _)| *bit).collect();
        assert_eq!(bits, (0..8).collect::<Vec<u8>>());
    }

    #[test]
    fn modifier_keycodes() {
        let codes: Vec<u16> = MODIFIER_MAP.iter().map(|(_, key)| key.code()).collect();
        assert_eq!(codes, vec![29, 42, 56, 125, 97, 54, 100, 126]);
    }

    #[test]
    fn scancode_map_covers_table() {
        // 0x04..=0x67 inclusive
        assert_eq!(SCANCODE_MAP.len(), 0x67 - 0x04 + 1);
    }

    #[test]
    fn advertised_keycodes_include_modifiers_and_map_image() {
        let codes = advertised_keycodes();
        for (_, key) in MODIFIER_MAP.iter() {
            assert!(codes.contains(&KeyCode::from(*key)));
        }
        for code in SCANCODE_MAP.values() {
            assert!(codes.contains(code));
        }
        // 0x31 and 0x32 collapse onto one keycode
        assert_eq!(codes.len(), SCANCODE_MAP.len() - 1 + MODIFIER_MAP.len());
    }
}
