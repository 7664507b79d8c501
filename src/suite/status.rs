//! Tag-delimited status strings of the form `%<level>: <message>%`.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static STATUS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%([a-z]+): ([^%]*)%").expect("status pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("status level '{0}' must be lowercase ASCII letters")]
    InvalidLevel(String),
    #[error("status message must not contain '%'")]
    InvalidMessage,
    #[error("'{0}' is not a %level: message% string")]
    Malformed(String),
}

/// One status string as the board firmware emits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    level: String,
    message: String,
}

impl StatusMessage {
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Result<Self, StatusError> {
        let level = level.into();
        let message = message.into();

        if level.is_empty() || !level.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(StatusError::InvalidLevel(level));
        }
        if message.contains('%') {
            return Err(StatusError::InvalidMessage);
        }

        Ok(Self { level, message })
    }

    /// Built-in messages whose literals are checked by the suite tests.
    pub(crate) fn from_static(level: &'static str, message: &'static str) -> Self {
        Self {
            level: level.to_string(),
            message: message.to_string(),
        }
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}: {}%", self.level, self.message)
    }
}

impl FromStr for StatusMessage {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = STATUS_RE
            .captures(s.as_bytes())
            .filter(|caps| caps.get(0).map(|m| m.len()) == Some(s.len()))
            .ok_or_else(|| StatusError::Malformed(s.to_string()))?;

        let level = String::from_utf8_lossy(&caps[1]).into_owned();
        let message = String::from_utf8_lossy(&caps[2]).into_owned();
        StatusMessage::new(level, message)
    }
}
