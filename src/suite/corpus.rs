//! Payload builders for the conformance corpora.

use crate::harness::Payload;

/// Every byte value once, 0x00 through 0xFF in order.
pub fn all_byte_values() -> Vec<u8> {
    (0..=u8::MAX).collect()
}

/// Text repeated N times, optionally followed by all 256 byte values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    text: Vec<u8>,
    repeat: usize,
    all_byte_values: bool,
}

impl Corpus {
    pub fn new(text: impl Into<Vec<u8>>) -> Self {
        Self {
            text: text.into(),
            repeat: 1,
            all_byte_values: false,
        }
    }

    pub fn repeat(mut self, times: usize) -> Self {
        self.repeat = times;
        self
    }

    pub fn with_all_byte_values(mut self) -> Self {
        self.all_byte_values = true;
        self
    }

    /// Total length, or `None` when it does not fit in `usize`.
    pub fn checked_len(&self) -> Option<usize> {
        let tail = if self.all_byte_values { 256 } else { 0 };
        self.text.len().checked_mul(self.repeat)?.checked_add(tail)
    }

    /// Total length, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.checked_len().unwrap_or(0));
        for _ in 0..self.repeat {
            out.extend_from_slice(&self.text);
        }
        if self.all_byte_values {
            out.extend(all_byte_values());
        }
        out
    }
}

impl From<Corpus> for Payload {
    fn from(corpus: Corpus) -> Self {
        Payload::new(corpus.build())
    }
}

/// Line terminator variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    Cr,
    CrLf,
}

impl LineEnding {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Lf => b"\n",
            Self::Cr => b"\r",
            Self::CrLf => b"\r\n",
        }
    }

    /// `line` followed by this terminator.
    pub fn terminate(self, line: &[u8]) -> Vec<u8> {
        let mut out = line.to_vec();
        out.extend_from_slice(self.as_bytes());
        out
    }
}

/// Concatenate terminated lines into one buffer, without normalization.
pub fn lines(parts: &[(&[u8], LineEnding)]) -> Vec<u8> {
    parts
        .iter()
        .flat_map(|(line, ending)| ending.terminate(line))
        .collect()
}
