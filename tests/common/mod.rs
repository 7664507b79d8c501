//! Shared test utilities for the conformance harness tests.
//!
//! - Mock boards with pre-programmed transmissions
//! - Openers that hand the runner a clone of a mock
//! - Runner settings without settle or pacing delays

#![allow(dead_code)]

use std::time::Duration;
use uart_conformance::config::TimingConfig;
use uart_conformance::port::{MockSerialPort, PortConfiguration, PortError, SerialPortAdapter};
use uart_conformance::{Runner, RunnerSettings};

pub const MOCK_PATH: &str = "/dev/serial/by-id/usb-ARM_DAPLink_CMSIS-DAP_MOCK-if01";

/// Create a mock board that will transmit `chunks` in order.
pub fn mock_board(chunks: &[&[u8]]) -> MockSerialPort {
    let mut mock = MockSerialPort::new(MOCK_PATH);
    for chunk in chunks {
        mock.enqueue_read(chunk);
    }
    mock
}

/// Opener that ignores the path and returns a clone of `mock`.
pub fn opener_for(
    mock: &MockSerialPort,
) -> impl Fn(&str, &PortConfiguration) -> Result<Box<dyn SerialPortAdapter>, PortError> {
    let mock = mock.clone();
    move |_, _| Ok(Box::new(mock.clone()) as Box<dyn SerialPortAdapter>)
}

/// Settings with no settle delay and a short read deadline.
pub fn fast_settings() -> RunnerSettings {
    RunnerSettings {
        device_path: MOCK_PATH.to_string(),
        port: PortConfiguration::default(),
        settle: Duration::ZERO,
        read_timeout: Duration::from_millis(50),
    }
}

/// Timing with no pacing delay, for suites built in tests.
pub fn no_delays() -> TimingConfig {
    TimingConfig {
        settle_ms: 0,
        pace_ms: 0,
    }
}

pub fn mock_runner(
    mock: &MockSerialPort,
) -> Runner<impl Fn(&str, &PortConfiguration) -> Result<Box<dyn SerialPortAdapter>, PortError>> {
    Runner::new(opener_for(mock), fast_settings())
}
