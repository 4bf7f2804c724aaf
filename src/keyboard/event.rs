//! Key events and their kernel `input_event` wire form

use super::KeyCode;
use nix::libc;
use std::mem;

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const SYN_REPORT: u16 = 0x00;

/// Size of the `timeval` header at the start of every `input_event`
const TIMEVAL_SIZE: usize = mem::size_of::<libc::timeval>();

/// Size of one kernel `struct input_event`
pub const INPUT_EVENT_SIZE: usize = mem::size_of::<libc::input_event>();

/// A single key transition destined for the virtual keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Target keycode
    pub keycode: KeyCode,
    /// `true` for press, `false` for release
    pub pressed: bool,
}

impl KeyEvent {
    pub fn new(keycode: KeyCode, pressed: bool) -> Self {
        Self { keycode, pressed }
    }

    pub fn press(keycode: KeyCode) -> Self {
        Self::new(keycode, true)
    }

    pub fn release(keycode: KeyCode) -> Self {
        Self::new(keycode, false)
    }

    /// The raw `EV_KEY` record for this event
    pub fn to_wire(&self) -> WireEvent {
        WireEvent {
            event_type: EV_KEY,
            code: self.keycode.as_u16(),
            value: i32::from(self.pressed),
        }
    }
}

/// The type/code/value triple of a kernel input event.
///
/// Timestamps are always written as zero; the kernel stamps events on
/// injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireEvent {
    pub event_type: u16,
    pub code: u16,
    pub value: i32,
}

impl WireEvent {
    /// The `SYN_REPORT` marker that commits a batch
    pub const SYN: WireEvent = WireEvent {
        event_type: EV_SYN,
        code: SYN_REPORT,
        value: 0,
    };

    /// Append this event in native `struct input_event` layout
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.resize(buf.len() + TIMEVAL_SIZE, 0);
        buf.extend_from_slice(&self.event_type.to_ne_bytes());
        buf.extend_from_slice(&self.code.to_ne_bytes());
        buf.extend_from_slice(&self.value.to_ne_bytes());
    }

    /// Parse a buffer of whole `input_event` records. Trailing partial
    /// records are ignored.
    pub fn decode_all(bytes: &[u8]) -> Vec<WireEvent> {
        bytes
            .chunks_exact(INPUT_EVENT_SIZE)
            .map(|record| {
                let body = &record[TIMEVAL_SIZE..];
                WireEvent {
                    event_type: u16::from_ne_bytes([body[0], body[1]]),
                    code: u16::from_ne_bytes([body[2], body[3]]),
                    value: i32::from_ne_bytes([body[4], body[5], body[6], body[7]]),
                }
            })
            .collect()
    }
}
