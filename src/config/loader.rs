//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "UART_CONFORMANCE";

/// Config file name
const CONFIG_FILE_NAME: &str = "uart-conformance.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "UART_CONFORMANCE_CONFIG";

/// Variable the board CI has always used for the probe serial number.
const LEGACY_SERIAL_ENV: &str = "SERIAL";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `UART_CONFORMANCE_CONFIG` environment variable (explicit path)
    /// 2. `./uart-conformance.toml` (current directory)
    /// 3. `<user config dir>/uart-conformance/uart-conformance.toml`
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override file values afterwards.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|p| p.exists())
}

/// Get the platform-specific config directory for this tool.
pub fn get_default_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "uart-conformance")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Apply process environment overrides to the configuration.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary variable lookup.
///
/// Variables follow `UART_CONFORMANCE_<SECTION>_<KEY>`, e.g.
/// `UART_CONFORMANCE_TIMING_PACE_MS=50`. The legacy `SERIAL` variable sets
/// the probe serial id when the prefixed form is absent.
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |suffix: &str| format!("{}_{}", ENV_PREFIX, suffix);

    // Device
    if let Some(val) = lookup(&var("DEVICE_SERIAL_ID")).or_else(|| lookup(LEGACY_SERIAL_ENV)) {
        config.device.serial_id = Some(val);
    }
    if let Some(val) = lookup(&var("DEVICE_PATH")) {
        config.device.path = Some(val);
    }

    // Serial
    if let Some(val) = lookup(&var("SERIAL_BAUD")) {
        config.serial.baud = parse_var(&var("SERIAL_BAUD"), &val, "Invalid baud rate")?;
    }
    if let Some(val) = lookup(&var("SERIAL_READ_TIMEOUT_MS")) {
        config.serial.read_timeout_ms =
            parse_var(&var("SERIAL_READ_TIMEOUT_MS"), &val, "Invalid timeout")?;
    }

    // Timing
    if let Some(val) = lookup(&var("TIMING_SETTLE_MS")) {
        config.timing.settle_ms = parse_var(&var("TIMING_SETTLE_MS"), &val, "Invalid delay")?;
    }
    if let Some(val) = lookup(&var("TIMING_PACE_MS")) {
        config.timing.pace_ms = parse_var(&var("TIMING_PACE_MS"), &val, "Invalid delay")?;
    }

    // Logging
    if let Some(val) = lookup(&var("LOGGING_LEVEL")) {
        config.logging.level = val;
    }

    Ok(())
}

fn parse_var<T: FromStr>(name: &str, value: &str, message: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse(name, format!("{}: '{}'", message, value)))
}
