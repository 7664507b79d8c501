//! Per-case outcomes and the suite report.

use super::failure::{FailureKind, StepFailure};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Failure details as they are recorded in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub kind: FailureKind,
    pub message: String,
    /// Index of the failing step; `None` when the case never got a connection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_difference: Option<usize>,
}

impl FailureRecord {
    pub fn from_failure(failure: &StepFailure, step: Option<usize>) -> Self {
        let mismatch = failure.mismatch();
        Self {
            kind: failure.kind(),
            message: failure.to_string(),
            step,
            expected_len: mismatch.map(|m| m.expected.len()),
            actual_len: mismatch.map(|m| m.actual.len()),
            first_difference: mismatch.and_then(|m| m.first_difference()),
        }
    }
}

/// Result of running one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureRecord>,
}

impl CaseOutcome {
    pub fn passed(name: impl Into<String>, steps_run: usize, elapsed: Duration) -> Self {
        Self {
            name: name.into(),
            passed: true,
            steps_run,
            elapsed_ms: elapsed.as_millis() as u64,
            failure: None,
        }
    }

    pub fn failed(
        name: impl Into<String>,
        steps_run: usize,
        elapsed: Duration,
        failure: FailureRecord,
    ) -> Self {
        Self {
            name: name.into(),
            passed: false,
            steps_run,
            elapsed_ms: elapsed.as_millis() as u64,
            failure: Some(failure),
        }
    }
}

/// Outcome of a whole suite run against one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub device: String,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<CaseOutcome>,
}

impl SuiteReport {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            started_at: Utc::now(),
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: CaseOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// One line per case plus a totals line, for terminal output.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            let status = if outcome.passed { "ok" } else { "FAILED" };
            out.push_str(&format!(
                "test {} ... {} ({} ms)\n",
                outcome.name, status, outcome.elapsed_ms
            ));
            if let Some(ref failure) = outcome.failure {
                for line in failure.message.lines() {
                    out.push_str(&format!("    {}\n", line));
                }
            }
        }
        out.push_str(&format!(
            "\n{} passed; {} failed; device {}\n",
            self.passed(),
            self.failed(),
            self.device
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::failure::Mismatch;

    #[test]
    fn test_totals() {
        let mut report = SuiteReport::new("MOCK0");
        report.push(CaseOutcome::passed("transmit", 1, Duration::from_millis(3)));
        let failure = StepFailure::Mismatch(Mismatch::new(b"abc", b"abd"));
        report.push(CaseOutcome::failed(
            "receive",
            1,
            Duration::from_millis(4),
            FailureRecord::from_failure(&failure, Some(0)),
        ));

        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_passed());
    }

    #[test]
    fn test_failure_record_carries_lengths() {
        let failure = StepFailure::Timeout {
            timeout: Duration::from_millis(5),
            mismatch: Mismatch::new(b"bleh bleh bleh", b"bleh"),
        };
        let record = FailureRecord::from_failure(&failure, Some(2));
        assert_eq!(record.kind, FailureKind::Timeout);
        assert_eq!(record.expected_len, Some(14));
        assert_eq!(record.actual_len, Some(4));
        assert_eq!(record.first_difference, Some(4));
    }

    #[test]
    fn test_json_uses_snake_case_kinds() {
        let mut report = SuiteReport::new("MOCK0");
        let failure = StepFailure::Mismatch(Mismatch::new(b"a", b"b"));
        report.push(CaseOutcome::failed(
            "x",
            1,
            Duration::ZERO,
            FailureRecord::from_failure(&failure, Some(0)),
        ));

        let json = report.to_json().unwrap();
        assert!(json.contains("\"kind\": \"mismatch\""));
        assert!(json.contains("\"device\": \"MOCK0\""));
    }

    #[test]
    fn test_summary_lists_failures() {
        let mut report = SuiteReport::new("MOCK0");
        report.push(CaseOutcome::passed("transmit", 1, Duration::ZERO));
        let text = report.summary();
        assert!(text.contains("test transmit ... ok"));
        assert!(text.contains("1 passed; 0 failed"));
    }
}
