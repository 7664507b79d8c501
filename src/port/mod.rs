//! Port abstraction layer for serial communication.
//!
//! Provides the `SerialPortAdapter` trait, the `serialport`-backed
//! implementation used against real boards, and a mock for tests.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::MockSerialPort;
pub use sync_port::*;
pub use traits::*;
