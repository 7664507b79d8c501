//! Core traits for serial port abstraction.
//!
//! Defines the `SerialPortAdapter` trait so the conformance runner can drive
//! either a real probe-attached UART or an in-memory mock.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Baud rate used by the board firmware under test.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Configuration parameters for a serial port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Number of data bits (5, 6, 7, or 8).
    pub data_bits: DataBits,

    /// Flow control mode.
    pub flow_control: FlowControl,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Timeout applied to each individual read or write call.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: Duration::from_millis(100),
        }
    }
}

impl PortConfiguration {
    /// 8N1 framing at the given baud rate.
    pub fn with_baud(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::default()
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Trait for serial port I/O operations.
///
/// Implementations behave like a blocking UART: `write_bytes` may accept
/// only part of the buffer, and `read_bytes` returns whatever arrived within
/// the per-call timeout.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually accepted, which may be less than
    /// `data.len()`.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read. A per-call timeout with no
    /// data surfaces as `PortError::Timeout` or an I/O `TimedOut` error.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Block until all buffered output has been handed to the wire.
    fn flush(&mut self) -> Result<(), PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Discard any bytes already received but not yet read.
    fn clear_input(&mut self) -> Result<(), PortError>;

    /// Get the current bytes available to read (if supported).
    fn bytes_to_read(&self) -> Option<usize> {
        None
    }
}

impl<P: SerialPortAdapter + ?Sized> SerialPortAdapter for Box<P> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        (**self).write_bytes(data)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        (**self).read_bytes(buffer)
    }

    fn flush(&mut self) -> Result<(), PortError> {
        (**self).flush()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn clear_input(&mut self) -> Result<(), PortError> {
        (**self).clear_input()
    }

    fn bytes_to_read(&self) -> Option<usize> {
        (**self).bytes_to_read()
    }
}

/// Opens transports for the runner, one per test case.
pub trait PortOpener {
    /// Open `path` with the given configuration.
    fn open(
        &self,
        path: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}

impl<F> PortOpener for F
where
    F: Fn(&str, &PortConfiguration) -> Result<Box<dyn SerialPortAdapter>, PortError>,
{
    fn open(
        &self,
        path: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        self(path, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration_is_8n1_at_board_rate() {
        let config = PortConfiguration::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.flow_control, FlowControl::None);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
    }

    #[test]
    fn test_with_baud_keeps_framing() {
        let config = PortConfiguration::with_baud(9600);
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.stop_bits, StopBits::One);
    }

    #[test]
    fn test_data_bits_conversion() {
        let serialport_bits: serialport::DataBits = DataBits::Eight.into();
        assert_eq!(serialport_bits, serialport::DataBits::Eight);
    }

    #[test]
    fn test_parity_conversion() {
        let serialport_parity: serialport::Parity = Parity::Even.into();
        assert_eq!(serialport_parity, serialport::Parity::Even);
    }

    #[test]
    fn test_stop_bits_conversion() {
        let serialport_stop_bits: serialport::StopBits = StopBits::Two.into();
        assert_eq!(serialport_stop_bits, serialport::StopBits::Two);
    }
}
