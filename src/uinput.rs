//! uinput virtual keyboard
//!
//! Registered once at startup advertising every keycode the translator can
//! produce, destroyed exactly once on the way out.

use crate::config::VirtualDeviceConfig;
use crate::error::BridgeError;
use crate::keyboard::{KeyCode, EV_KEY, EV_SYN};
use log::{debug, warn};
use nix::libc;
use nix::sys::ioctl::ioctl_param_type;
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::thread;

pub const UINPUT_PATH: &str = "/dev/uinput";

const BUS_USB: u16 = 0x03;
const UINPUT_MAX_NAME_SIZE: usize = 80;

/// `struct input_id`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct InputId {
    bustype: u16,
    vendor: u16,
    product: u16,
    version: u16,
}

/// `struct uinput_setup`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct UinputSetup {
    id: InputId,
    name: [u8; UINPUT_MAX_NAME_SIZE],
    ff_effects_max: u32,
}

impl UinputSetup {
    fn new(config: &VirtualDeviceConfig) -> Self {
        let mut name = [0u8; UINPUT_MAX_NAME_SIZE];
        // Keep the trailing NUL
        let len = config.name.len().min(UINPUT_MAX_NAME_SIZE - 1);
        name[..len].copy_from_slice(&config.name.as_bytes()[..len]);
        Self {
            id: InputId {
                bustype: BUS_USB,
                vendor: config.vendor_id,
                product: config.product_id,
                version: config.version,
            },
            name,
            ff_effects_max: 0,
        }
    }
}

mod ioctl {
    use super::UinputSetup;

    const UINPUT_IOCTL_BASE: u8 = b'U';

    nix::ioctl_none!(ui_dev_create, UINPUT_IOCTL_BASE, 1);
    nix::ioctl_none!(ui_dev_destroy, UINPUT_IOCTL_BASE, 2);
    nix::ioctl_write_ptr!(ui_dev_setup, UINPUT_IOCTL_BASE, 3, UinputSetup);
    nix::ioctl_write_int!(ui_set_evbit, UINPUT_IOCTL_BASE, 100);
    nix::ioctl_write_int!(ui_set_keybit, UINPUT_IOCTL_BASE, 101);
}

/// A created uinput keyboard. Writes go straight to the uinput fd.
#[derive(Debug)]
pub struct VirtualKeyboard {
    file: File,
    created: bool,
}

impl VirtualKeyboard {
    /// Register a keyboard on `/dev/uinput` advertising `keycodes`
    pub fn create(
        config: &VirtualDeviceConfig,
        keycodes: &BTreeSet<KeyCode>,
    ) -> Result<Self, BridgeError> {
        Self::create_at(Path::new(UINPUT_PATH), config, keycodes)
    }

    pub fn create_at(
        path: &Path,
        config: &VirtualDeviceConfig,
        keycodes: &BTreeSet<KeyCode>,
    ) -> Result<Self, BridgeError> {
        let file = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(|e| BridgeError::setup(format!("open {}", path.display()), e))?;
        let fd = file.as_raw_fd();
        let setup = UinputSetup::new(config);

        // SAFETY: fd is an open uinput descriptor owned by `file`, and `setup`
        // is a repr(C) uinput_setup that outlives the call.
        unsafe {
            ioctl::ui_set_evbit(fd, ioctl_param_type::from(EV_SYN))
                .map_err(|e| BridgeError::setup("UI_SET_EVBIT EV_SYN", e.into()))?;
            ioctl::ui_set_evbit(fd, ioctl_param_type::from(EV_KEY))
                .map_err(|e| BridgeError::setup("UI_SET_EVBIT EV_KEY", e.into()))?;
            for code in keycodes {
                ioctl::ui_set_keybit(fd, ioctl_param_type::from(code.as_u16())).map_err(|e| {
                    BridgeError::setup(format!("UI_SET_KEYBIT {}", code.as_u16()), e.into())
                })?;
            }
            ioctl::ui_dev_setup(fd, &setup)
                .map_err(|e| BridgeError::setup("UI_DEV_SETUP", e.into()))?;
            ioctl::ui_dev_create(fd)
                .map_err(|e| BridgeError::setup("UI_DEV_CREATE", e.into()))?;
        }
        debug!("uinput device created with {} keycodes", keycodes.len());

        // Give udev and the compositor time to pick the device up
        thread::sleep(config.settle_delay());

        Ok(Self {
            file,
            created: true,
        })
    }

    /// Remove the device from the system. Safe to call more than once.
    pub fn destroy(&mut self) -> io::Result<()> {
        if !self.created {
            return Ok(());
        }
        self.created = false;
        // SAFETY: fd is the uinput descriptor on which UI_DEV_CREATE succeeded
        unsafe { ioctl::ui_dev_destroy(self.file.as_raw_fd()) }?;
        Ok(())
    }
}

impl Write for VirtualKeyboard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for VirtualKeyboard {
    fn drop(&mut self) {
        if let Err(e) = self.destroy() {
            warn!("Failed to destroy virtual keyboard: {}", e);
        }
    }
}
