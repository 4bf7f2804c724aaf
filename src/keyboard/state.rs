//! Held-key state tracked between reports

use super::report::RawReport;
use std::collections::BTreeSet;

/// Modifier bitmask and scancodes held as of the last processed report.
///
/// Scancodes are kept even when they have no keycode mapping so that the
/// next report diffs correctly. At most six are ever held, since a report
/// carries six slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyState {
    modifiers: u8,
    pressed: BTreeSet<u8>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The state described by a report
    pub fn from_report(report: &RawReport) -> Self {
        Self {
            modifiers: report.modifiers(),
            pressed: report.scancodes(),
        }
    }

    /// Modifier bitmask
    pub fn modifiers(&self) -> u8 {
        self.modifiers
    }

    /// Whether a modifier bit (0..=7) is held
    pub fn modifier_held(&self, bit: u8) -> bool {
        bit < 8 && (self.modifiers >> bit) & 1 == 1
    }

    /// Held scancodes in ascending order
    pub fn pressed(&self) -> &BTreeSet<u8> {
        &self.pressed
    }

    pub fn is_pressed(&self, scancode: u8) -> bool {
        self.pressed.contains(&scancode)
    }

    /// Nothing held at all
    pub fn is_empty(&self) -> bool {
        self.modifiers == 0 && self.pressed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let state = KeyState::new();
        assert!(state.is_empty());
        assert_eq!(state.modifiers(), 0);
        assert!(state.pressed().is_empty());
    }

    #[test]
    fn from_report_copies_fields() {
        let report = RawReport::parse(&[0b0000_0011, 0, 0x04, 0, 0, 0, 0, 0]).unwrap();
        let state = KeyState::from_report(&report);
        assert!(state.modifier_held(0));
        assert!(state.modifier_held(1));
        assert!(!state.modifier_held(2));
        assert!(state.is_pressed(0x04));
        assert!(!state.is_empty());
    }

    #[test]
    fn modifier_bit_out_of_range() {
        let report = RawReport::parse(&[0xff, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let state = KeyState::from_report(&report);
        assert!(state.modifier_held(7));
        assert!(!state.modifier_held(8));
    }
}
