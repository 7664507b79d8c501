//! Port-specific error types.
//!
//! Transport failures are kept apart from conformance failures: a
//! `PortError` says the UART misbehaved at the I/O level, not that the board
//! sent the wrong bytes.

use thiserror::Error;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The device node does not exist.
    #[error("Serial device not found: {0}")]
    NotFound(String),

    /// The device exists but another process holds it, or access was denied.
    #[error("Serial device busy or inaccessible: {0}")]
    Busy(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Port configuration failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The transport accepted zero bytes of a non-empty write.
    #[error("Transport stopped accepting data after {written} of {total} bytes")]
    WriteStalled { written: usize, total: usize },

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Busy error from a port name.
    pub fn busy(port_name: impl Into<String>) -> Self {
        Self::Busy(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout(duration)
    }

    /// Whether this error means "no data arrived before the per-call timeout".
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }

    /// Whether this error happened while acquiring the device.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Busy(_))
    }
}
