//! Tracing subscriber setup.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{AppError, AppResult};
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` when set, otherwise `config.level`.
pub fn env_filter(config: &LoggingConfig) -> AppResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| AppError::Logging(format!("invalid level '{}': {}", config.level, e))),
    }
}

/// Install the global subscriber. Logs go to stderr so the report on stdout
/// stays machine-readable.
pub fn init(config: &LoggingConfig) -> AppResult<()> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };

    result.map_err(|e| AppError::Logging(e.to_string()))
}
