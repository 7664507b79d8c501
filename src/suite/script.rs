//! TOML-scripted suites.
//!
//! ```toml
//! [[case]]
//! name = "transmit"
//!
//! [[case.step]]
//! action = "read"
//! payload = { text = "bleh bleh bleh" }
//!
//! [[case]]
//! name = "recv_with_data_timeout"
//!
//! [[case.step]]
//! action = "write"
//! payload = { byte = 255 }
//!
//! [[case.step]]
//! action = "write_paced"
//! payload = { text = "womp womp womp" }
//! delay_ms = 100
//! ```
//!
//! Payload forms: `text`, `hex`, `byte`, `corpus = { text, repeat,
//! all_byte_values }` and `builtin` (`interjection`, `board_transmit`,
//! `line_endings`, `all_byte_values`). `write_paced` without `delay_ms` uses
//! `timing.pace_ms`.

use super::corpus::{all_byte_values, Corpus};
use super::{board_transmit_corpus, interjection_corpus, line_ending_payload};
use crate::config::TimingConfig;
use crate::harness::{Payload, Step, TestCase};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Largest payload a single scripted step may carry.
pub const MAX_PAYLOAD_BYTES: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read suite script '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse suite script: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Case '{case}': invalid hex payload: {source}")]
    Hex {
        case: String,
        #[source]
        source: hex::FromHexError,
    },

    #[error("Case '{case}': {message}")]
    Invalid { case: String, message: String },
}

impl ScriptError {
    fn invalid(case: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            case: case.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptFile {
    #[serde(rename = "case", default)]
    cases: Vec<CaseSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseSpec {
    name: String,
    #[serde(rename = "step", default)]
    steps: Vec<StepSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum StepSpec {
    Write {
        payload: PayloadSpec,
    },
    WritePaced {
        payload: PayloadSpec,
        #[serde(default = "one")]
        unit: usize,
        delay_ms: Option<u64>,
    },
    Read {
        payload: PayloadSpec,
    },
    ResetInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PayloadSpec {
    Text(String),
    Hex(String),
    Byte(u8),
    Corpus {
        text: String,
        #[serde(default = "one")]
        repeat: usize,
        #[serde(default)]
        all_byte_values: bool,
    },
    Builtin(String),
}

fn one() -> usize {
    1
}

/// Read and parse a suite script.
pub fn load_script(path: impl AsRef<Path>, timing: &TimingConfig) -> Result<Vec<TestCase>, ScriptError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&content, timing)
}

/// Parse a suite script held in memory.
pub fn parse_script(content: &str, timing: &TimingConfig) -> Result<Vec<TestCase>, ScriptError> {
    let file: ScriptFile = toml::from_str(content)?;
    let mut seen = HashSet::new();

    file.cases
        .into_iter()
        .map(|spec| {
            if spec.name.trim().is_empty() {
                return Err(ScriptError::invalid(&spec.name, "case name is empty"));
            }
            if !seen.insert(spec.name.clone()) {
                return Err(ScriptError::invalid(&spec.name, "duplicate case name"));
            }

            let steps = spec
                .steps
                .into_iter()
                .map(|step| build_step(&spec.name, step, timing))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(TestCase {
                name: spec.name,
                steps,
            })
        })
        .collect()
}

fn build_step(case: &str, spec: StepSpec, timing: &TimingConfig) -> Result<Step, ScriptError> {
    let step = match spec {
        StepSpec::Write { payload } => Step::Write(build_payload(case, payload)?),
        StepSpec::WritePaced {
            payload,
            unit,
            delay_ms,
        } => {
            if unit == 0 {
                return Err(ScriptError::invalid(case, "write_paced unit must be at least 1"));
            }
            Step::WritePaced {
                payload: build_payload(case, payload)?,
                unit,
                delay: delay_ms.map_or_else(|| timing.pace(), Duration::from_millis),
            }
        }
        StepSpec::Read { payload } => Step::ReadExpect(build_payload(case, payload)?),
        StepSpec::ResetInput => Step::ResetInput,
    };

    if !matches!(step, Step::ResetInput) && step.is_empty() {
        return Err(ScriptError::invalid(
            case,
            format!("{} step has an empty payload", step.action()),
        ));
    }
    Ok(step)
}

fn build_payload(case: &str, spec: PayloadSpec) -> Result<Payload, ScriptError> {
    let bytes = match spec {
        PayloadSpec::Text(text) => text.into_bytes(),
        PayloadSpec::Hex(digits) => {
            let compact: String = digits.split_whitespace().collect();
            hex::decode(compact).map_err(|source| ScriptError::Hex {
                case: case.to_string(),
                source,
            })?
        }
        PayloadSpec::Byte(byte) => vec![byte],
        PayloadSpec::Corpus {
            text,
            repeat,
            all_byte_values,
        } => {
            let mut corpus = Corpus::new(text).repeat(repeat);
            if all_byte_values {
                corpus = corpus.with_all_byte_values();
            }
            match corpus.checked_len() {
                Some(len) if len <= MAX_PAYLOAD_BYTES => corpus.build(),
                _ => {
                    return Err(ScriptError::invalid(
                        case,
                        format!("corpus payload exceeds {} bytes", MAX_PAYLOAD_BYTES),
                    ))
                }
            }
        }
        PayloadSpec::Builtin(name) => match name.as_str() {
            "interjection" => interjection_corpus().build(),
            "board_transmit" => board_transmit_corpus().build(),
            "line_endings" => line_ending_payload(),
            "all_byte_values" => all_byte_values(),
            other => {
                return Err(ScriptError::invalid(
                    case,
                    format!("unknown builtin payload '{}'", other),
                ))
            }
        },
    };
    Ok(Payload::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn timing() -> TimingConfig {
        TimingConfig {
            settle_ms: 0,
            pace_ms: 25,
        }
    }

    #[test]
    fn test_parse_full_script() {
        let script = r#"
            [[case]]
            name = "transmit"

            [[case.step]]
            action = "read"
            payload = { text = "bleh bleh bleh" }

            [[case]]
            name = "recv_with_data_timeout"

            [[case.step]]
            action = "write"
            payload = { byte = 255 }

            [[case.step]]
            action = "write_paced"
            payload = { text = "womp womp womp" }

            [[case.step]]
            action = "reset_input"
        "#;

        let cases = parse_script(script, &timing()).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].steps, vec![Step::ReadExpect("bleh bleh bleh".into())]);
        assert_eq!(cases[1].steps[0], Step::Write(vec![0xffu8].into()));
        assert_eq!(
            cases[1].steps[1],
            Step::WritePaced {
                payload: "womp womp womp".into(),
                unit: 1,
                delay: Duration::from_millis(25),
            }
        );
        assert_eq!(cases[1].steps[2], Step::ResetInput);
    }

    #[test]
    fn test_hex_and_corpus_payloads() {
        let script = r#"
            [[case]]
            name = "bytes"

            [[case.step]]
            action = "write"
            payload = { hex = "de ad be ef" }

            [[case.step]]
            action = "write_paced"
            payload = { corpus = { text = "ab", repeat = 2, all_byte_values = true } }
            unit = 64
            delay_ms = 5
        "#;

        let cases = parse_script(script, &timing()).unwrap();
        assert_eq!(cases[0].steps[0], Step::Write(vec![0xdeu8, 0xad, 0xbe, 0xef].into()));
        match &cases[0].steps[1] {
            Step::WritePaced { payload, unit, delay } => {
                assert_eq!(payload.len(), 4 + 256);
                assert_eq!(*unit, 64);
                assert_eq!(*delay, Duration::from_millis(5));
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_builtin_payloads() {
        let script = r#"
            [[case]]
            name = "long_transmit"

            [[case.step]]
            action = "read"
            payload = { builtin = "board_transmit" }
        "#;

        let cases = parse_script(script, &timing()).unwrap();
        assert_eq!(cases[0].steps[0].len(), 2294);
    }

    #[test]
    fn test_bad_hex_is_rejected() {
        let script = r#"
            [[case]]
            name = "bad"

            [[case.step]]
            action = "write"
            payload = { hex = "zz" }
        "#;
        assert!(matches!(
            parse_script(script, &timing()),
            Err(ScriptError::Hex { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let script = r#"
            [[case]]
            name = "same"
            [[case]]
            name = "same"
        "#;
        assert!(matches!(
            parse_script(script, &timing()),
            Err(ScriptError::Invalid { .. })
        ));
    }

    #[test]
    fn test_empty_read_rejected() {
        let script = r#"
            [[case]]
            name = "empty"

            [[case.step]]
            action = "read"
            payload = { text = "" }
        "#;
        assert!(parse_script(script, &timing()).is_err());
    }

    #[test]
    fn test_huge_corpus_repeat_rejected() {
        let script = r#"
            [[case]]
            name = "huge"

            [[case.step]]
            action = "write"
            payload = { corpus = { text = "abc", repeat = 9223372036854775807 } }
        "#;
        assert!(matches!(
            parse_script(script, &timing()),
            Err(ScriptError::Invalid { .. })
        ));
    }

    #[test]
    fn test_corpus_over_size_cap_rejected() {
        let script = r#"
            [[case]]
            name = "big"

            [[case.step]]
            action = "write"
            payload = { corpus = { text = "ab", repeat = 600000 } }
        "#;
        assert!(matches!(
            parse_script(script, &timing()),
            Err(ScriptError::Invalid { .. })
        ));
    }

    #[test]
    fn test_unknown_action_is_parse_error() {
        let script = r#"
            [[case]]
            name = "x"

            [[case.step]]
            action = "teleport"
        "#;
        assert!(matches!(
            parse_script(script, &timing()),
            Err(ScriptError::Parse(_))
        ));
    }
}
