//! Locating and reading the keyboard's hidraw interface
//!
//! The keyboard exposes several HID interfaces; only one carries the boot
//! keyboard reports. It is picked by scanning each `hidraw*` node's sysfs
//! `uevent` for the vendor/product markers while rejecting the wireless-mode
//! markers.

use log::debug;
use nix::libc;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A raw HID report source
pub trait RawHidDevice {
    /// Wait up to `timeout` for the device to become readable.
    ///
    /// Returns `Ok(true)` when a read should be attempted. Hang-ups count as
    /// readable so that the following read reports the failure.
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Non-blocking read of one report into `buf`
    fn read_report(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Finds and opens the keyboard interface
pub trait DeviceLocator {
    type Device: RawHidDevice;

    /// Path of the matching interface, if one is present right now
    fn locate(&mut self) -> Option<PathBuf>;

    /// Open a located interface for non-blocking reads
    fn open(&mut self, path: &Path) -> io::Result<Self::Device>;
}

/// Directory holding the `hidraw*` nodes
pub const HIDRAW_DIR: &str = "/dev";
/// Sysfs class directory for hidraw
pub const SYSFS_HIDRAW_DIR: &str = "/sys/class/hidraw";

/// Vendor and product IDs of the keyboard; every one must appear in the uevent
pub const MATCH_MARKERS: [&str; 2] = ["3151", "4015"];
/// Wireless receiver markers; none may appear in the uevent
pub const EXCLUDE_MARKERS: [&str; 2] = ["2.4G", "4011"];

/// Whether a uevent blob carries every vendor/product marker and no
/// wireless-mode marker
pub fn uevent_matches(uevent: &str) -> bool {
    MATCH_MARKERS.iter().all(|m| uevent.contains(m))
        && !EXCLUDE_MARKERS.iter().any(|m| uevent.contains(m))
}

/// Scans `/dev/hidraw*` against sysfs metadata
#[derive(Debug, Clone)]
pub struct SysfsLocator {
    hidraw_dir: PathBuf,
    sysfs_dir: PathBuf,
}

impl Default for SysfsLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsLocator {
    pub fn new() -> Self {
        Self::with_roots(HIDRAW_DIR, SYSFS_HIDRAW_DIR)
    }

    /// Scan `hidraw_dir` for nodes and read their metadata under `sysfs_dir`
    pub fn with_roots(hidraw_dir: impl Into<PathBuf>, sysfs_dir: impl Into<PathBuf>) -> Self {
        Self {
            hidraw_dir: hidraw_dir.into(),
            sysfs_dir: sysfs_dir.into(),
        }
    }

    /// `hidraw*` node names, sorted so the scan order is stable
    fn candidates(&self) -> Vec<String> {
        let mut names: Vec<String> = match fs::read_dir(&self.hidraw_dir) {
            Ok(entries) => entries
                .flatten()
                .filter_map(|entry| entry.file_name().into_string().ok())
                .filter(|name| name.starts_with("hidraw"))
                .collect(),
            Err(e) => {
                debug!("cannot list {}: {}", self.hidraw_dir.display(), e);
                Vec::new()
            }
        };
        names.sort();
        names
    }

    fn node_matches(&self, name: &str) -> bool {
        let uevent_path = self.sysfs_dir.join(name).join("device").join("uevent");
        match fs::read_to_string(&uevent_path) {
            Ok(uevent) => uevent_matches(&uevent),
            Err(_) => false,
        }
    }
}

impl DeviceLocator for SysfsLocator {
    type Device = HidrawDevice;

    fn locate(&mut self) -> Option<PathBuf> {
        self.candidates()
            .into_iter()
            .find(|name| self.node_matches(name))
            .map(|name| self.hidraw_dir.join(name))
    }

    fn open(&mut self, path: &Path) -> io::Result<HidrawDevice> {
        HidrawDevice::open(path)
    }
}

/// An open hidraw node. Closed on drop.
#[derive(Debug)]
pub struct HidrawDevice {
    file: File,
}

impl HidrawDevice {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)?;
        Ok(Self { file })
    }
}

impl RawHidDevice for HidrawDevice {
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
        // SAFETY: pfd is a valid pollfd for the duration of the call and nfds is 1
        let ready = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
        if ready < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ready > 0 && pfd.revents != 0)
    }

    fn read_report(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}
