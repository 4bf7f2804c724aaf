//! Shared test utilities
//!
//! In-memory stand-ins for the hidraw node, the device locator and the uinput
//! writer, plus builders for raw reports.

use crate::config::PollingConfig;
use crate::hidraw::{DeviceLocator, RawHidDevice};
use crate::keyboard::{KeyCode, KeyEvent, WireEvent, EV_KEY, EV_SYN, REPORT_LEN};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Path handed out by [`ScriptedLocator`]
pub const TEST_DEVICE_PATH: &str = "/dev/hidraw-test";

/// Builds an 8-byte report. At most six scancodes are used.
pub fn key_report(modifiers: u8, scancodes: &[u8]) -> [u8; REPORT_LEN] {
    let mut data = [0u8; REPORT_LEN];
    data[0] = modifiers;
    for (slot, code) in data[2..].iter_mut().zip(scancodes) {
        *slot = *code;
    }
    data
}

/// Polling settings with no sleeping
pub fn polling_for_tests() -> PollingConfig {
    PollingConfig {
        read_timeout_ms: 0,
        retry_interval_ms: 0,
        read_buffer_size: 64,
    }
}

/// A `Write` sink that records every `write` call separately
#[derive(Debug, Default)]
pub struct RecordingWriter {
    writes: Vec<Vec<u8>>,
    fail: Option<io::ErrorKind>,
    limit: Option<usize>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail
    pub fn fail_with(&mut self, kind: io::ErrorKind) {
        self.fail = Some(kind);
    }

    /// Accept at most `limit` bytes per write
    pub fn limit_write(&mut self, limit: usize) {
        self.limit = Some(limit);
    }

    /// Number of primitive writes performed
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// Decoded `EV_KEY` events of one write
    pub fn key_events_in_write(&self, index: usize) -> Vec<KeyEvent> {
        self.writes
            .get(index)
            .map(|bytes| to_key_events(&WireEvent::decode_all(bytes)))
            .unwrap_or_default()
    }

    /// Decoded `EV_KEY` events across all writes, in order
    pub fn key_events(&self) -> Vec<KeyEvent> {
        (0..self.writes.len())
            .flat_map(|i| self.key_events_in_write(i))
            .collect()
    }

    /// Number of `SYN_REPORT` markers written
    pub fn sync_count(&self) -> usize {
        self.writes
            .iter()
            .flat_map(|bytes| WireEvent::decode_all(bytes))
            .filter(|event| event.event_type == EV_SYN)
            .count()
    }
}

fn to_key_events(wire: &[WireEvent]) -> Vec<KeyEvent> {
    wire.iter()
        .filter(|event| event.event_type == EV_KEY)
        .map(|event| KeyEvent::new(KeyCode(event.code), event.value != 0))
        .collect()
}

impl Write for RecordingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(kind) = self.fail {
            return Err(io::Error::new(kind, "recording writer failure"));
        }
        let len = self.limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        self.writes.push(buf[..len].to_vec());
        Ok(len)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A raw HID device that replays a script of reads.
///
/// Once the script runs out every read returns `WouldBlock`.
#[derive(Debug)]
pub struct ScriptedDevice {
    reads: VecDeque<io::Result<Vec<u8>>>,
    readable: bool,
    wait_error: Option<io::Error>,
}

impl Default for ScriptedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDevice {
    pub fn new() -> Self {
        Self {
            reads: VecDeque::new(),
            readable: true,
            wait_error: None,
        }
    }

    pub fn push_report(&mut self, data: &[u8]) {
        self.reads.push_back(Ok(data.to_vec()));
    }

    pub fn push_error(&mut self, err: io::Error) {
        self.reads.push_back(Err(err));
    }

    /// What `wait_readable` reports
    pub fn set_readable(&mut self, readable: bool) {
        self.readable = readable;
    }

    /// Fail the next `wait_readable` call
    pub fn fail_wait(&mut self, err: io::Error) {
        self.wait_error = Some(err);
    }
}

impl RawHidDevice for ScriptedDevice {
    fn wait_readable(&mut self, _timeout: Duration) -> io::Result<bool> {
        match self.wait_error.take() {
            Some(err) => Err(err),
            None => Ok(self.readable),
        }
    }

    fn read_report(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            Some(Ok(data)) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            Some(Err(err)) => Err(err),
            None => Err(io::Error::from(io::ErrorKind::WouldBlock)),
        }
    }
}

/// A locator that hands out queued [`ScriptedDevice`]s one connection at a
/// time
#[derive(Debug, Default)]
pub struct ScriptedLocator {
    devices: VecDeque<ScriptedDevice>,
    open_error: Option<io::ErrorKind>,
    locate_calls: usize,
}

impl ScriptedLocator {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_device(device: ScriptedDevice) -> Self {
        let mut locator = Self::default();
        locator.queue_device(device);
        locator
    }

    pub fn queue_device(&mut self, device: ScriptedDevice) {
        self.devices.push_back(device);
    }

    /// Make every open attempt fail
    pub fn fail_open(&mut self, kind: io::ErrorKind) {
        self.open_error = Some(kind);
    }

    /// Let open attempts succeed again
    pub fn allow_open(&mut self) {
        self.open_error = None;
    }

    pub fn locate_calls(&self) -> usize {
        self.locate_calls
    }
}

impl DeviceLocator for ScriptedLocator {
    type Device = ScriptedDevice;

    fn locate(&mut self) -> Option<PathBuf> {
        self.locate_calls += 1;
        if self.devices.is_empty() {
            None
        } else {
            Some(PathBuf::from(TEST_DEVICE_PATH))
        }
    }

    fn open(&mut self, _path: &Path) -> io::Result<ScriptedDevice> {
        if let Some(kind) = self.open_error {
            return Err(io::Error::new(kind, "scripted open failure"));
        }
        self.devices
            .pop_front()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
}
