//! Error taxonomy for the bridge
//!
//! Every I/O failure on the raw device is classified into exactly one kind so
//! a transient condition can never be handled like a fatal one.

use nix::libc;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Read would block (or was interrupted); try again later
    #[error("no report available")]
    TransientIo,
    /// The raw device went away
    #[error("device removed: {0}")]
    DeviceRemoved(#[source] io::Error),
    /// Report shorter than 8 bytes
    #[error("malformed report ({0} bytes)")]
    MalformedReport(usize),
    /// Virtual keyboard could not be registered
    #[error("virtual keyboard setup failed: {context}")]
    SetupFailure {
        context: String,
        #[source]
        source: io::Error,
    },
    /// Any other OS error
    #[error("unhandled I/O error: {0}")]
    UnhandledIo(#[source] io::Error),
}

impl BridgeError {
    /// Classify an error returned while waiting on or reading the raw device
    pub fn from_read_error(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => BridgeError::TransientIo,
            _ => match err.raw_os_error() {
                // hidraw reports EIO on reads after the device is unplugged
                Some(libc::ENODEV) | Some(libc::EIO) => BridgeError::DeviceRemoved(err),
                _ => BridgeError::UnhandledIo(err),
            },
        }
    }

    pub fn setup(context: impl Into<String>, source: io::Error) -> Self {
        BridgeError::SetupFailure {
            context: context.into(),
            source,
        }
    }

    /// Whether this error must terminate the process
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BridgeError::SetupFailure { .. } | BridgeError::UnhandledIo(_)
        )
    }
}
