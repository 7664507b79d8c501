//! Test cases and the steps they are made of.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

/// Immutable byte sequence carried by a step.
///
/// Cloning shares the bytes, so a multi-kilobyte corpus can appear in
/// several cases without copies.
#[derive(Clone, PartialEq, Eq)]
pub struct Payload(Arc<[u8]>);

impl Payload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for Payload {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self(Arc::from(bytes))
    }
}

impl<const N: usize> From<&[u8; N]> for Payload {
    fn from(bytes: &[u8; N]) -> Self {
        Self(Arc::from(&bytes[..]))
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::from(text.as_bytes())
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHOWN: usize = 32;
        let shown = &self.0[..self.0.len().min(SHOWN)];
        write!(f, "Payload({} bytes, \"{}\"", self.0.len(), shown.escape_ascii())?;
        if self.0.len() > SHOWN {
            f.write_str("...")?;
        }
        f.write_str(")")
    }
}

/// One instruction of a test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Write the whole payload, then flush.
    Write(Payload),
    /// Write `unit` bytes at a time, sleeping `delay` before each unit.
    WritePaced {
        payload: Payload,
        unit: usize,
        delay: Duration,
    },
    /// Read exactly `len(expected)` bytes and compare.
    ReadExpect(Payload),
    /// Discard bytes already waiting on the receive side.
    ResetInput,
}

impl Step {
    /// Short action name used in logs and reports.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Write(_) => "write",
            Self::WritePaced { .. } => "write_paced",
            Self::ReadExpect(_) => "read",
            Self::ResetInput => "reset_input",
        }
    }

    /// Bytes moved by this step, in either direction.
    pub fn len(&self) -> usize {
        match self {
            Self::Write(p) | Self::ReadExpect(p) | Self::WritePaced { payload: p, .. } => p.len(),
            Self::ResetInput => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named, ordered list of steps run against one fresh connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub steps: Vec<Step>,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn write(self, payload: impl Into<Payload>) -> Self {
        self.step(Step::Write(payload.into()))
    }

    /// Paced write, one byte per unit.
    pub fn write_paced(self, payload: impl Into<Payload>, delay: Duration) -> Self {
        self.write_paced_units(payload, 1, delay)
    }

    pub fn write_paced_units(self, payload: impl Into<Payload>, unit: usize, delay: Duration) -> Self {
        self.step(Step::WritePaced {
            payload: payload.into(),
            unit,
            delay,
        })
    }

    pub fn read_expect(self, expected: impl Into<Payload>) -> Self {
        self.step(Step::ReadExpect(expected.into()))
    }

    pub fn reset_input(self) -> Self {
        self.step(Step::ResetInput)
    }
}
