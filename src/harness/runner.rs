//! Runs test cases against a device, one fresh connection per case.

use super::connection::Connection;
use super::failure::{Mismatch, StepFailure};
use super::report::{CaseOutcome, FailureRecord, SuiteReport};
use super::step::{Step, TestCase};
use crate::config::{Config, ConfigResult};
use crate::port::{PortConfiguration, PortOpener};
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};

/// Everything the runner needs to know about the device, resolved up front.
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub device_path: String,
    pub port: PortConfiguration,
    /// Wait after open before the first step
    pub settle: Duration,
    /// Deadline for each read-and-compare step
    pub read_timeout: Duration,
}

impl RunnerSettings {
    /// Resolve settings from configuration.
    ///
    /// Fails when no device can be addressed.
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            device_path: config.device.resolve_path()?,
            port: config.serial.port_configuration(),
            settle: config.timing.settle(),
            read_timeout: config.serial.read_timeout(),
        })
    }
}

/// Serial conformance runner.
///
/// Cases run strictly in order. Each case opens its own connection, runs its
/// steps until the first failure, and closes the connection again, so a
/// failing case never leaks state into the next one.
pub struct Runner<O> {
    opener: O,
    settings: RunnerSettings,
}

impl<O: PortOpener> Runner<O> {
    pub fn new(opener: O, settings: RunnerSettings) -> Self {
        Self { opener, settings }
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Run every case and collect the outcomes.
    pub fn run(&self, cases: &[TestCase]) -> SuiteReport {
        let mut report = SuiteReport::new(&self.settings.device_path);
        info!(
            device = %self.settings.device_path,
            cases = cases.len(),
            "starting conformance run"
        );

        for case in cases {
            report.push(self.run_case(case));
        }

        info!(
            passed = report.passed(),
            failed = report.failed(),
            "conformance run finished"
        );
        report
    }

    /// Run one case with its own setup and teardown.
    pub fn run_case(&self, case: &TestCase) -> CaseOutcome {
        let span = info_span!("case", name = %case.name);
        let _enter = span.enter();
        let start = Instant::now();

        let mut conn = match Connection::open(
            &self.opener,
            &self.settings.device_path,
            &self.settings.port,
            self.settings.settle,
            self.settings.read_timeout,
        ) {
            Ok(conn) => conn,
            Err(source) => {
                let failure = StepFailure::DeviceUnavailable {
                    path: self.settings.device_path.clone(),
                    source,
                };
                warn!(error = %failure, "setup failed");
                return CaseOutcome::failed(
                    &case.name,
                    0,
                    start.elapsed(),
                    FailureRecord::from_failure(&failure, None),
                );
            }
        };

        for (index, step) in case.steps.iter().enumerate() {
            debug!(step = index, action = step.action(), bytes = step.len(), "running step");
            if let Err(failure) = execute_step(&mut conn, step) {
                warn!(step = index, kind = %failure.kind(), "step failed");
                return CaseOutcome::failed(
                    &case.name,
                    index + 1,
                    start.elapsed(),
                    FailureRecord::from_failure(&failure, Some(index)),
                );
            }
        }

        conn.close();
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "passed");
        CaseOutcome::passed(&case.name, case.steps.len(), start.elapsed())
    }
}

/// Report for a run that could not address any device: every case fails
/// with `ConfigurationMissing` without touching a port.
pub fn unconfigured(cases: &[TestCase], reason: &str) -> SuiteReport {
    let mut report = SuiteReport::new("<unconfigured>");
    let failure = StepFailure::ConfigurationMissing(reason.to_string());
    warn!(error = %failure, cases = cases.len(), "no device to run against");

    for case in cases {
        report.push(CaseOutcome::failed(
            &case.name,
            0,
            Duration::ZERO,
            FailureRecord::from_failure(&failure, None),
        ));
    }
    report
}

/// Execute a single step on an open connection.
pub fn execute_step(conn: &mut Connection, step: &Step) -> Result<(), StepFailure> {
    match step {
        Step::Write(payload) => {
            conn.write(payload)?;
        }
        Step::WritePaced {
            payload,
            unit,
            delay,
        } => {
            conn.write_paced(payload, *unit, *delay)?;
        }
        Step::ReadExpect(expected) => {
            let actual = conn.read_exact(expected.len())?;
            if actual.len() < expected.len() {
                return Err(StepFailure::Timeout {
                    timeout: conn.read_timeout(),
                    mismatch: Mismatch::new(expected, &actual),
                });
            }
            if actual.as_slice() != expected.as_bytes() {
                return Err(StepFailure::Mismatch(Mismatch::new(expected, &actual)));
            }
        }
        Step::ResetInput => conn.reset_input_buffer()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::failure::FailureKind;
    use crate::port::{MockSerialPort, PortError, SerialPortAdapter};

    fn settings() -> RunnerSettings {
        RunnerSettings {
            device_path: "MOCK0".to_string(),
            port: PortConfiguration::default(),
            settle: Duration::ZERO,
            read_timeout: Duration::from_millis(30),
        }
    }

    fn opener_for(
        mock: &MockSerialPort,
    ) -> impl Fn(&str, &PortConfiguration) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let mock = mock.clone();
        move |_, _| Ok(Box::new(mock.clone()) as Box<dyn SerialPortAdapter>)
    }

    #[test]
    fn test_transmit_case_passes() {
        let mut mock = MockSerialPort::new("MOCK0");
        mock.enqueue_read(b"bleh bleh bleh");
        let runner = Runner::new(opener_for(&mock), settings());

        let outcome = runner.run_case(&TestCase::new("transmit").read_expect("bleh bleh bleh"));
        assert!(outcome.passed, "{:?}", outcome.failure);
        assert_eq!(outcome.steps_run, 1);
    }

    #[test]
    fn test_wrong_bytes_is_mismatch() {
        let mut mock = MockSerialPort::new("MOCK0");
        mock.enqueue_read(b"blah blah blah");
        let runner = Runner::new(opener_for(&mock), settings());

        let outcome = runner.run_case(&TestCase::new("transmit").read_expect("bleh bleh bleh"));
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Mismatch);
        assert_eq!(failure.first_difference, Some(2));
    }

    #[test]
    fn test_short_by_one_byte_is_timeout() {
        let mut mock = MockSerialPort::new("MOCK0");
        mock.enqueue_read(b"bleh bleh ble");
        let runner = Runner::new(opener_for(&mock), settings());

        let outcome = runner.run_case(&TestCase::new("transmit").read_expect("bleh bleh bleh"));
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert_eq!(failure.actual_len, Some(13));
    }

    #[test]
    fn test_failure_stops_remaining_steps() {
        let mock = MockSerialPort::new("MOCK0");
        let runner = Runner::new(opener_for(&mock), settings());

        let case = TestCase::new("stops")
            .read_expect("x")
            .write("never sent");
        let outcome = runner.run_case(&case);

        assert!(!outcome.passed);
        assert_eq!(outcome.failure.unwrap().step, Some(0));
        assert!(mock.transmitted().is_empty());
    }

    #[test]
    fn test_connection_released_after_failure() {
        let mock = MockSerialPort::new("MOCK0");
        let runner = Runner::new(opener_for(&mock), settings());

        runner.run_case(&TestCase::new("fails").read_expect("x"));
        // runner's opener holds one clone, the test holds the other
        assert_eq!(mock.live_handles(), 2);
    }

    #[test]
    fn test_open_failure_is_device_unavailable() {
        let opener = |path: &str, _: &PortConfiguration| -> Result<Box<dyn SerialPortAdapter>, PortError> {
            Err(PortError::not_found(path))
        };
        let runner = Runner::new(opener, settings());

        let report = runner.run(&[
            TestCase::new("a").write("x"),
            TestCase::new("b").write("y"),
        ]);

        assert_eq!(report.outcomes.len(), 2);
        for outcome in &report.outcomes {
            let failure = outcome.failure.as_ref().unwrap();
            assert_eq!(failure.kind, FailureKind::DeviceUnavailable);
            assert_eq!(failure.step, None);
        }
    }

    #[test]
    fn test_unconfigured_fails_every_case() {
        let cases = [TestCase::new("a").write("x"), TestCase::new("b").read_expect("y")];
        let report = unconfigured(&cases, "probe serial id");

        assert_eq!(report.failed(), 2);
        for outcome in &report.outcomes {
            let failure = outcome.failure.as_ref().unwrap();
            assert_eq!(failure.kind, FailureKind::ConfigurationMissing);
            assert!(failure.message.contains("probe serial id"));
        }
    }

    #[test]
    fn test_reset_input_realigns() {
        let mut mock = MockSerialPort::new("MOCK0");
        mock.enqueue_read(b"stray bytes");
        let runner = Runner::new(opener_for(&mock), settings());

        let outcome = runner.run_case(&TestCase::new("realign").reset_input());
        assert!(outcome.passed);
        assert_eq!(mock.input_clears(), 1);
        assert_eq!(mock.available_bytes(), 0);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.device.serial_id = Some("ABC123".to_string());
        let settings = RunnerSettings::from_config(&config).unwrap();

        assert_eq!(
            settings.device_path,
            "/dev/serial/by-id/usb-ARM_DAPLink_CMSIS-DAP_ABC123-if01"
        );
        assert_eq!(settings.port.baud_rate, 115_200);
        assert_eq!(settings.settle, Duration::from_millis(250));
    }

    #[test]
    fn test_settings_require_device() {
        assert!(RunnerSettings::from_config(&Config::default()).is_err());
    }
}
