//! Configuration schema definitions.
//!
//! All sections use `#[serde(default)]`, so a config file only needs the keys
//! it wants to change.

use super::error::{ConfigError, ConfigResult};
use crate::port::{PortConfiguration, DEFAULT_BAUD_RATE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Placeholder replaced by the probe serial number in `path_template`.
pub const SERIAL_PLACEHOLDER: &str = "{serial}";

/// Device node udev creates for the UART interface of a DAPLink probe.
pub const DAPLINK_PATH_TEMPLATE: &str =
    "/dev/serial/by-id/usb-ARM_DAPLink_CMSIS-DAP_{serial}-if01";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which device to talk to
    pub device: DeviceConfig,
    /// Transport parameters
    pub serial: SerialConfig,
    /// Named delays
    pub timing: TimingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Suite selection
    pub suite: SuiteConfig,
}

impl Config {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.baud == 0 {
            return Err(ConfigError::validation("serial.baud", "must be non-zero"));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "serial.read_timeout_ms",
                "must be non-zero",
            ));
        }
        if self.serial.poll_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "serial.poll_timeout_ms",
                "must be non-zero",
            ));
        }
        if self.device.path.is_none()
            && !self.device.path_template.contains(SERIAL_PLACEHOLDER)
        {
            return Err(ConfigError::validation(
                "device.path_template",
                format!("must contain {}", SERIAL_PLACEHOLDER),
            ));
        }
        Ok(())
    }
}

/// Device addressing section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Probe serial number, substituted into `path_template`
    pub serial_id: Option<String>,
    /// Explicit device path; takes precedence over `serial_id`
    pub path: Option<String>,
    /// Path pattern containing `{serial}`
    pub path_template: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            serial_id: None,
            path: None,
            path_template: DAPLINK_PATH_TEMPLATE.to_string(),
        }
    }
}

impl DeviceConfig {
    /// Resolve the device path the runner should open.
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingRequired` when neither a path nor a serial id is
    /// configured, `ConfigError::ValidationError` for a malformed serial id.
    pub fn resolve_path(&self) -> ConfigResult<String> {
        if let Some(ref path) = self.path {
            return Ok(path.clone());
        }

        let serial = self.serial_id.as_deref().ok_or_else(|| {
            ConfigError::MissingRequired(
                "probe serial id (set SERIAL, --serial or device.serial_id)".to_string(),
            )
        })?;

        if serial.is_empty() {
            return Err(ConfigError::validation("device.serial_id", "is empty"));
        }
        if serial.contains('/') || serial.chars().any(char::is_whitespace) {
            return Err(ConfigError::validation(
                "device.serial_id",
                format!("'{}' is not a valid probe serial", serial),
            ));
        }

        Ok(self.path_template.replace(SERIAL_PLACEHOLDER, serial))
    }
}

/// Serial transport section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Baud rate
    pub baud: u32,
    /// Overall deadline for one read-and-compare step
    pub read_timeout_ms: u64,
    /// Timeout of each underlying read call
    pub poll_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud: DEFAULT_BAUD_RATE,
            read_timeout_ms: 5000,
            poll_timeout_ms: 100,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Port parameters for opening the device (8N1, no flow control).
    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration {
            timeout: Duration::from_millis(self.poll_timeout_ms),
            ..PortConfiguration::with_baud(self.baud)
        }
    }
}

/// Delays the harness relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wait after opening the device before any traffic
    pub settle_ms: u64,
    /// Delay before each unit of a paced write
    pub pace_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_ms: 250,
            pace_ms: 100,
        }
    }
}

impl TimingConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset: "trace", "debug", "info", ...
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

/// Which cases to run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// TOML script replacing the built-in suite
    pub script: Option<PathBuf>,
}
