//! Configuration module for the conformance harness.
//!
//! TOML-based configuration with environment variable overrides. The runner
//! never reads the environment itself; it receives the resolved [`Config`].
//!
//! # Configuration Resolution
//!
//! 1. `UART_CONFORMANCE_CONFIG` environment variable (explicit path)
//! 2. `./uart-conformance.toml` (current directory)
//! 3. `<user config dir>/uart-conformance/uart-conformance.toml`
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Pattern: `UART_CONFORMANCE_<SECTION>_<KEY>`, for example
//! `UART_CONFORMANCE_TIMING_PACE_MS=50`. The legacy `SERIAL` variable sets the
//! probe serial number.
//!
//! # Example
//!
//! ```rust,ignore
//! use uart_conformance::config::ConfigLoader;
//!
//! let config = ConfigLoader::load()?.into_config();
//! println!("Device: {}", config.device.resolve_path()?);
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    apply_overrides_from, get_default_config_dir, get_default_config_path, resolve_config_path,
    ConfigLoader,
};
pub use schema::{
    Config, DeviceConfig, LogFormat, LoggingConfig, SerialConfig, SuiteConfig, TimingConfig,
    DAPLINK_PATH_TEMPLATE, SERIAL_PLACEHOLDER,
};
