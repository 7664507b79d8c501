use crate::config::ConfigError;
use crate::suite::ScriptError;
use std::fmt;
use std::process::ExitCode;

/// Exit status when every selected case passed.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit status when at least one case failed.
pub const EXIT_CASE_FAILED: u8 = 1;
/// Exit status for configuration problems detected before any case ran.
pub const EXIT_CONFIG_ERROR: u8 = 2;

/// A specialized `Result` type for the command-line front end.
pub type AppResult<T> = Result<T, AppError>;

/// Unified application error type.
///
/// Case failures are not errors at this level: they are recorded in the
/// suite report. `AppError` covers everything that prevents a run from
/// starting or its results from being written.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Script(ScriptError),
    Io(std::io::Error),
    Serde(serde_json::Error),
    Logging(String),
}

impl AppError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) | Self::Script(_) => ExitCode::from(EXIT_CONFIG_ERROR),
            _ => ExitCode::from(EXIT_CASE_FAILED),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Script(e) => write!(f, "Suite script error: {e}"),
            Self::Io(e) => write!(f, "An I/O error occurred: {e}"),
            Self::Serde(e) => write!(f, "Failed to serialize the report: {e}"),
            Self::Logging(e) => write!(f, "Failed to initialize logging: {e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Script(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Serde(e) => Some(e),
            Self::Logging(_) => None,
        }
    }
}

// Implement `From` conversions to allow the `?` operator to work seamlessly.
impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<ScriptError> for AppError {
    fn from(err: ScriptError) -> Self {
        AppError::Script(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serde(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_exit_with_two() {
        let err = AppError::from(ConfigError::MissingRequired("probe serial id".into()));
        assert_eq!(err.exit_code(), ExitCode::from(2));
        assert!(err.to_string().contains("probe serial id"));
    }

    #[test]
    fn test_io_errors_exit_with_one() {
        let err = AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(err.exit_code(), ExitCode::from(1));
    }
}
