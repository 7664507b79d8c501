//! Serial conformance runner.
//!
//! ```text
//! TestCase ──> Runner ──open──> Connection ──> SerialPortAdapter
//!                 │                 write / write_paced / read_exact
//!                 └──> SuiteReport  (CaseOutcome per case)
//! ```

pub mod connection;
pub mod failure;
pub mod report;
pub mod runner;
pub mod step;

pub use connection::Connection;
pub use failure::{FailureKind, Mismatch, StepFailure};
pub use report::{CaseOutcome, FailureRecord, SuiteReport};
pub use runner::{execute_step, unconfigured, Runner, RunnerSettings};
pub use step::{Payload, Step, TestCase};
