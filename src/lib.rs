//! MonsGeek HID - userspace keyboard driver
//!
//! Reads boot-protocol keyboard reports from the keyboard's hidraw interface
//! and replays them through a uinput virtual keyboard, so the keyboard works
//! in wired mode without a kernel driver binding to it.

pub mod bridge;
pub mod config;
pub mod error;
pub mod hidraw;
pub mod keyboard;
pub mod sink;
pub mod test_helpers;
pub mod uinput;

pub use bridge::{Bridge, ConnectionState, StepOutcome};
pub use config::Config;
pub use error::BridgeError;
pub use sink::EventSink;
