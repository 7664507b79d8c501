//! UART Conformance Harness Library
//!
//! Host-side half of a UART conformance suite. Each case opens the board's
//! serial device through its debug probe, exchanges fixed byte sequences with
//! the firmware, and checks what comes back byte for byte.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support and env overrides
//! - `error`: Application-level error aggregation and exit codes
//! - `harness`: Connections, steps, the case runner and the suite report
//! - `logging`: `tracing` subscriber setup
//! - `port`: Port abstraction layer for serial communication
//! - `suite`: The built-in case list, its corpora and TOML-scripted suites

pub mod config;
pub mod error;
pub mod harness;
pub mod logging;
pub mod port;
pub mod suite;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult};
pub use harness::{
    CaseOutcome, Connection, FailureKind, Mismatch, Payload, Runner, RunnerSettings, Step,
    StepFailure, SuiteReport, TestCase,
};
pub use port::{
    DataBits, FlowControl, MockSerialPort, Parity, PortConfiguration, PortError, PortOpener,
    SerialPortAdapter, StopBits, SyncSerialPort, SystemPortOpener,
};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
