//! Connection lifecycle
//!
//! [`Bridge`] owns the raw device handle and the held-key state and runs the
//! locate / wait / read / translate / emit loop. The connection is an explicit
//! two-state machine:
//!
//! ```text
//!   Disconnected --locate+open--> Connected
//!   Connected --report--> Connected
//!   Connected --removal--> (full release) --> Disconnected
//! ```
//!
//! The only way out of `Connected` is [`Bridge::disconnect`], which always
//! releases every held key first.

use crate::config::PollingConfig;
use crate::error::BridgeError;
use crate::hidraw::{DeviceLocator, RawHidDevice};
use crate::keyboard::{release_all, translate, KeyEvent, KeyState, RawReport};
use crate::sink::EventSink;
use log::{debug, info, warn};
use std::io::Write;
use std::mem;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Connection to the single physical keyboard
#[derive(Debug)]
pub enum ConnectionState<D> {
    Disconnected,
    Connected {
        device: D,
        path: PathBuf,
        keys: KeyState,
    },
}

impl<D> ConnectionState<D> {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }

    /// Held keys, or `None` while disconnected
    pub fn keys(&self) -> Option<&KeyState> {
        match self {
            ConnectionState::Connected { keys, .. } => Some(keys),
            ConnectionState::Disconnected => None,
        }
    }
}

/// What one pass of the loop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Still disconnected after a locate attempt
    Idle,
    /// Device found and opened
    Connected,
    /// Connected; this many well-formed reports were processed
    Reports(usize),
    /// Device went away and held keys were released
    Disconnected,
}

pub struct Bridge<L: DeviceLocator, W: Write> {
    locator: L,
    sink: EventSink<W>,
    state: ConnectionState<L::Device>,
    polling: PollingConfig,
    read_buffer: Vec<u8>,
    /// Last path that failed to open, so repeats are not logged as warnings
    open_failure: Option<PathBuf>,
}

impl<L: DeviceLocator, W: Write> Bridge<L, W> {
    pub fn new(locator: L, sink: EventSink<W>, polling: PollingConfig) -> Self {
        let read_buffer = vec![0u8; polling.read_buffer_size.max(crate::keyboard::REPORT_LEN)];
        Self {
            locator,
            sink,
            state: ConnectionState::Disconnected,
            polling,
            read_buffer,
            open_failure: None,
        }
    }

    pub fn state(&self) -> &ConnectionState<L::Device> {
        &self.state
    }

    pub fn sink(&self) -> &EventSink<W> {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut EventSink<W> {
        &mut self.sink
    }

    pub fn locator_mut(&mut self) -> &mut L {
        &mut self.locator
    }

    /// Release held keys, drop the device handle and hand back the sink
    pub fn into_sink(mut self) -> EventSink<W> {
        self.shutdown();
        let Bridge { sink, .. } = self;
        sink
    }

    /// Run until `running` is cleared or a fatal error occurs.
    ///
    /// Held keys are released and the device handle dropped on every exit
    /// path, including the fatal one.
    pub fn run(&mut self, running: &AtomicBool) -> Result<(), BridgeError> {
        let result = self.run_loop(running);
        match &result {
            Ok(()) => info!("Shutting down..."),
            Err(e) => warn!("Stopping on fatal error: {}", e),
        }
        self.shutdown();
        result
    }

    fn run_loop(&mut self, running: &AtomicBool) -> Result<(), BridgeError> {
        while running.load(Ordering::SeqCst) {
            if let StepOutcome::Idle = self.step()? {
                thread::sleep(self.polling.retry_interval());
            }
        }
        Ok(())
    }

    /// One pass: a locate attempt while disconnected, otherwise one bounded
    /// wait followed by a drain of every available report.
    pub fn step(&mut self) -> Result<StepOutcome, BridgeError> {
        if !self.state.is_connected() {
            return Ok(if self.try_connect() {
                StepOutcome::Connected
            } else {
                StepOutcome::Idle
            });
        }

        let readable = match &mut self.state {
            ConnectionState::Connected { device, .. } => {
                device.wait_readable(self.polling.read_timeout())
            }
            ConnectionState::Disconnected => return Ok(StepOutcome::Idle),
        };

        match readable {
            Ok(true) => self.drain(),
            Ok(false) => Ok(StepOutcome::Reports(0)),
            Err(e) => self.handle_read_error(BridgeError::from_read_error(e), 0),
        }
    }

    /// `Disconnected -> Connected` when the locator finds and opens a device
    fn try_connect(&mut self) -> bool {
        let Some(path) = self.locator.locate() else {
            self.open_failure = None;
            return false;
        };
        match self.locator.open(&path) {
            Ok(device) => {
                info!("Connected to {}", path.display());
                self.open_failure = None;
                self.state = ConnectionState::Connected {
                    device,
                    path,
                    keys: KeyState::new(),
                };
                true
            }
            Err(e) => {
                if self.open_failure.as_ref() == Some(&path) {
                    debug!("Can't open {}: {}", path.display(), e);
                } else {
                    warn!("Can't open {}: {}", path.display(), e);
                    self.open_failure = Some(path);
                }
                false
            }
        }
    }

    /// Read until the device has nothing more to give
    fn drain(&mut self) -> Result<StepOutcome, BridgeError> {
        let mut processed = 0;
        loop {
            let read = match &mut self.state {
                ConnectionState::Connected { device, .. } => {
                    device.read_report(&mut self.read_buffer)
                }
                ConnectionState::Disconnected => return Ok(StepOutcome::Reports(processed)),
            };

            match read {
                Ok(0) => return Ok(StepOutcome::Reports(processed)),
                Ok(len) => match RawReport::parse(&self.read_buffer[..len]) {
                    Some(report) => {
                        self.process_report(&report);
                        processed += 1;
                    }
                    None => debug!("{}", BridgeError::MalformedReport(len)),
                },
                Err(e) => {
                    return self.handle_read_error(BridgeError::from_read_error(e), processed)
                }
            }
        }
    }

    fn handle_read_error(
        &mut self,
        err: BridgeError,
        processed: usize,
    ) -> Result<StepOutcome, BridgeError> {
        match err {
            BridgeError::TransientIo | BridgeError::MalformedReport(_) => {
                Ok(StepOutcome::Reports(processed))
            }
            BridgeError::DeviceRemoved(_) => {
                warn!("Device disconnected, waiting for reconnect...");
                self.disconnect();
                Ok(StepOutcome::Disconnected)
            }
            fatal => Err(fatal),
        }
    }

    /// `Connected -> Connected`: diff, emit, store
    fn process_report(&mut self, report: &RawReport) {
        if let ConnectionState::Connected { keys, .. } = &mut self.state {
            let (events, next) = translate(keys, report);
            *keys = next;
            Self::deliver(&mut self.sink, &events);
        }
    }

    /// `Connected -> Disconnected`, releasing every held key on the way.
    /// Does nothing while already disconnected.
    pub fn disconnect(&mut self) {
        let previous = mem::replace(&mut self.state, ConnectionState::Disconnected);
        if let ConnectionState::Connected { device, path, keys } = previous {
            let (events, _) = release_all(&keys);
            if !events.is_empty() {
                info!("Releasing {} held key(s)", events.len());
            }
            Self::deliver(&mut self.sink, &events);
            drop(device);
            debug!("Closed {}", path.display());
        }
    }

    /// Release held keys and drop the device handle. Idempotent.
    pub fn shutdown(&mut self) {
        self.disconnect();
    }

    fn deliver(sink: &mut EventSink<W>, events: &[KeyEvent]) {
        if let Err(e) = sink.emit(events) {
            warn!("Failed to write {} event(s) to virtual keyboard: {}", events.len(), e);
        }
    }
}
