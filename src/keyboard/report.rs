//! Boot-protocol keyboard input reports

use std::collections::BTreeSet;

/// Minimum length of a well-formed report
pub const REPORT_LEN: usize = 8;

/// Number of scancode slots in a report (6-key rollover)
pub const SCANCODE_SLOTS: usize = 6;

/// A parsed 8-byte keyboard report.
///
/// Layout: byte 0 modifier bitmask, byte 1 reserved, bytes 2..8 scancode
/// slots where 0 marks an empty slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReport {
    modifiers: u8,
    slots: [u8; SCANCODE_SLOTS],
}

impl RawReport {
    /// A report with nothing held
    pub const EMPTY: RawReport = RawReport {
        modifiers: 0,
        slots: [0; SCANCODE_SLOTS],
    };

    /// Parse a report, returning `None` when fewer than 8 bytes are given.
    /// Bytes past the eighth are ignored.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < REPORT_LEN {
            return None;
        }
        let mut slots = [0u8; SCANCODE_SLOTS];
        slots.copy_from_slice(&data[2..REPORT_LEN]);
        Some(Self {
            modifiers: data[0],
            slots,
        })
    }

    /// Modifier bitmask
    pub fn modifiers(&self) -> u8 {
        self.modifiers
    }

    /// Distinct nonzero scancodes present in the slots
    pub fn scancodes(&self) -> BTreeSet<u8> {
        self.slots.iter().copied().filter(|&code| code != 0).collect()
    }
}
