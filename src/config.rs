//! Configuration for the bridge
//!
//! Every setting has a default matching a MonsGeek M5W in wired mode, so the
//! config file is optional. Only loop timing and the identity of the virtual
//! keyboard can be changed; the device signature and the scancode tables are
//! fixed.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/monsgeek-hid/config.toml` |
//!
//! ## Example
//!
//! ```no_run
//! use monsgeek_hid::Config;
//!
//! let config = Config::load().unwrap_or_default();
//! println!("retrying every {:?}", config.polling.retry_interval());
//! ```

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// IO error reading or writing config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Returns the path to the config file.
///
/// Does not create anything; a missing file simply means defaults.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir.join("monsgeek-hid").join("config.toml"))
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Loop timing
    #[serde(default)]
    pub polling: PollingConfig,
    /// Identity of the uinput keyboard
    #[serde(default)]
    pub virtual_device: VirtualDeviceConfig,
}

/// Poll/reconnect timing
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    /// Readability wait while connected, in milliseconds
    pub read_timeout_ms: u64,
    /// Delay between locate attempts while disconnected, in milliseconds
    pub retry_interval_ms: u64,
    /// Bytes requested per read
    pub read_buffer_size: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 1,
            retry_interval_ms: 100,
            read_buffer_size: 64,
        }
    }
}

impl PollingConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

/// uinput device identity
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct VirtualDeviceConfig {
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub version: u16,
    /// Pause after creation so consumers can attach, in milliseconds
    pub settle_delay_ms: u64,
}

impl Default for VirtualDeviceConfig {
    fn default() -> Self {
        Self {
            name: "MonsGeek Virtual Keyboard".to_string(),
            vendor_id: 0x3151,
            product_id: 0x4015,
            version: 1,
            settle_delay_ms: 300,
        }
    }
}

impl VirtualDeviceConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_config_path() -> PathBuf {
        env::temp_dir().join(format!("monsgeek-hid-test-{}.toml", std::process::id()))
    }

    #[test]
    fn config_default_values() {
        let config = Config::default();
        assert_eq!(config.polling.read_timeout_ms, 1);
        assert_eq!(config.polling.retry_interval_ms, 100);
        assert_eq!(config.polling.read_buffer_size, 64);
        assert_eq!(config.virtual_device.vendor_id, 0x3151);
        assert_eq!(config.virtual_device.product_id, 0x4015);
        assert_eq!(config.virtual_device.settle_delay_ms, 300);
    }

    #[test]
    fn polling_durations() {
        let polling = PollingConfig::default();
        assert_eq!(polling.read_timeout(), Duration::from_millis(1));
        assert_eq!(polling.retry_interval(), Duration::from_millis(100));
    }

    #[test]
    fn config_load_from_file() {
        let path = temp_config_path();
        fs::write(
            &path,
            "[polling]\nretry_interval_ms = 250\n\n[virtual_device]\nname = \"Bench Keyboard\"\n",
        )
        .unwrap();

        let loaded = Config::load_from(&path).expect("Failed to load config");
        assert_eq!(loaded.polling.retry_interval_ms, 250);
        assert_eq!(loaded.polling.read_timeout_ms, 1);
        assert_eq!(loaded.virtual_device.name, "Bench Keyboard");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn config_load_missing_file_fails() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        let result = Config::load_from(&path);
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[polling]
read_timeout_ms = 4
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");
        assert_eq!(config.polling.read_timeout_ms, 4);
        assert_eq!(config.polling.retry_interval_ms, 100);
        assert_eq!(config.virtual_device, VirtualDeviceConfig::default());
    }

    #[test]
    fn empty_file_is_default() {
        let config: Config = toml::from_str("").expect("Failed to deserialize");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn bad_toml_is_parse_error() {
        let path = temp_config_path().with_extension("bad.toml");
        fs::write(&path, "[polling\nread_timeout_ms = ").unwrap();
        let result = Config::load_from(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn device_section_is_ignored() {
        let toml_str = r#"
[device]
match_markers = []
exclude_markers = []
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn config_path_ends_with_app_file() {
        if let Ok(path) = config_path() {
            assert!(path.to_string_lossy().contains("monsgeek-hid"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::NoConfigDir;
        assert_eq!(err.to_string(), "Could not determine config directory");

        let io_err = ConfigError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(io_err.to_string().contains("IO error"));
    }
}
