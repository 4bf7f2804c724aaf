//! MonsGeek HID - userspace wired-mode keyboard driver
//!
//! Usage: `monsgeek-hid [CONFIG_PATH]`

use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use monsgeek_hid::{
    config::{Config, ConfigError},
    hidraw::SysfsLocator,
    keyboard::advertised_keycodes,
    uinput::VirtualKeyboard,
    Bridge, EventSink,
};

fn load_config() -> Result<Config> {
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        return Config::load_from(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }
    match Config::load() {
        Ok(config) => Ok(config),
        Err(ConfigError::NoConfigDir) => Ok(Config::default()),
        Err(e) => Err(e).context("Failed to load config"),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;

    info!("MonsGeek Userspace HID Driver");
    info!("Switch the keyboard to WIRED mode (Fn+U); press Ctrl+C to exit");

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("Failed to install signal handler")?;
    }

    let keyboard = VirtualKeyboard::create(&config.virtual_device, &advertised_keycodes())
        .context("Failed to create virtual keyboard")?;
    info!("Virtual keyboard created");

    let mut bridge = Bridge::new(
        SysfsLocator::new(),
        EventSink::new(keyboard),
        config.polling.clone(),
    );

    let result = bridge.run(&running);

    let mut keyboard = bridge.into_sink().into_inner();
    if let Err(e) = keyboard.destroy() {
        warn!("Failed to destroy virtual keyboard: {}", e);
    }
    info!("Cleanup complete");

    result.context("Bridge stopped on a fatal error")
}
