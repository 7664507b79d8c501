//! Step failures and mismatch reporting.

use crate::port::PortError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Bytes shown on each side of the first difference in a mismatch preview.
const PREVIEW_CONTEXT: usize = 24;

/// Classification of a failed case, as it appears in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The device could not be opened.
    DeviceUnavailable,
    /// No device could be addressed from the configuration.
    ConfigurationMissing,
    /// A read returned fewer bytes than expected before its deadline.
    Timeout,
    /// A read returned the expected length but different bytes.
    Mismatch,
    /// The transport failed mid-step.
    Transport,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DeviceUnavailable => "device unavailable",
            Self::ConfigurationMissing => "configuration missing",
            Self::Timeout => "timeout",
            Self::Mismatch => "mismatch",
            Self::Transport => "transport error",
        };
        f.write_str(s)
    }
}

/// Expected vs. actual bytes of a failed read-and-compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub expected: Vec<u8>,
    pub actual: Vec<u8>,
}

impl Mismatch {
    pub fn new(expected: &[u8], actual: &[u8]) -> Self {
        Self {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Offset of the first differing byte, or of the first missing byte for
    /// a short read. `None` when the buffers are equal.
    pub fn first_difference(&self) -> Option<usize> {
        let common = self.expected.len().min(self.actual.len());
        self.expected
            .iter()
            .zip(&self.actual)
            .position(|(e, a)| e != a)
            .or_else(|| (self.expected.len() != self.actual.len()).then_some(common))
    }

    pub fn is_short(&self) -> bool {
        self.actual.len() < self.expected.len()
    }
}

/// Escaped window of `bytes` around `offset`, with ellipses where truncated.
pub fn preview(bytes: &[u8], offset: usize) -> String {
    let start = offset.saturating_sub(PREVIEW_CONTEXT).min(bytes.len());
    let end = offset.saturating_add(PREVIEW_CONTEXT).min(bytes.len());

    let mut out = String::new();
    if start > 0 {
        out.push_str("...");
    }
    out.push('"');
    out.push_str(&bytes[start..end].escape_ascii().to_string());
    out.push('"');
    if end < bytes.len() {
        out.push_str("...");
    }
    out
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offset = self.first_difference().unwrap_or(0);
        write!(
            f,
            "expected {} bytes, got {}; first difference at offset {}\n  expected: {}\n  actual:   {}",
            self.expected.len(),
            self.actual.len(),
            offset,
            preview(&self.expected, offset),
            preview(&self.actual, offset),
        )
    }
}

/// Why a step (and therefore its case) failed.
#[derive(Debug, Error)]
pub enum StepFailure {
    #[error("cannot open {path}: {source}")]
    DeviceUnavailable {
        path: String,
        #[source]
        source: PortError,
    },

    #[error("no device configured: {0}")]
    ConfigurationMissing(String),

    #[error("short read after {timeout:?}: {mismatch}")]
    Timeout { timeout: Duration, mismatch: Mismatch },

    #[error("received bytes differ: {0}")]
    Mismatch(Mismatch),

    #[error("transport error: {0}")]
    Transport(#[from] PortError),
}

impl StepFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::DeviceUnavailable { .. } => FailureKind::DeviceUnavailable,
            Self::ConfigurationMissing(_) => FailureKind::ConfigurationMissing,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Mismatch(_) => FailureKind::Mismatch,
            Self::Transport(_) => FailureKind::Transport,
        }
    }

    /// The expected/actual pair, for failures that have one.
    pub fn mismatch(&self) -> Option<&Mismatch> {
        match self {
            Self::Timeout { mismatch, .. } | Self::Mismatch(mismatch) => Some(mismatch),
            _ => None,
        }
    }
}
