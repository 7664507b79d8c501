//! The built-in UART conformance suite and its fixtures.
//!
//! Case order mirrors the order in which the board firmware runs its side of
//! each exchange; reordering breaks the conversation.

pub mod corpus;
pub mod script;
pub mod status;

pub use corpus::{all_byte_values, lines, Corpus, LineEnding};
pub use script::{load_script, parse_script, ScriptError};
pub use status::{StatusError, StatusMessage};

use crate::config::TimingConfig;
use crate::harness::TestCase;

/// Board → host greeting.
pub const TRANSMIT_GREETING: &[u8] = b"bleh bleh bleh";

/// Host → board greeting.
pub const RECEIVE_GREETING: &[u8] = b"meow meow meow";

/// Sent one byte at a time to exercise the board's receive timeouts.
pub const PACED_GREETING: &[u8] = b"womp womp womp";

/// Tells the board its receive FIFO has been drained and the next test starts.
pub const FLUSH_SENTINEL: u8 = 0xFF;

/// Text block of the host → board long corpus.
pub const INTERJECTION_TEXT: &[u8] = include_bytes!("../../fixtures/interjection.txt");

/// Text block of the board → host long corpus.
pub const BOARD_TRANSMIT_TEXT: &[u8] = include_bytes!("../../fixtures/board_transmit.txt");

/// Times each long-corpus text block is repeated.
pub const CORPUS_REPEAT: usize = 2;

/// Host → board long corpus: text twice, then every byte value.
pub fn interjection_corpus() -> Corpus {
    Corpus::new(INTERJECTION_TEXT)
        .repeat(CORPUS_REPEAT)
        .with_all_byte_values()
}

/// Board → host long corpus: text twice, then every byte value.
pub fn board_transmit_corpus() -> Corpus {
    Corpus::new(BOARD_TRANSMIT_TEXT)
        .repeat(CORPUS_REPEAT)
        .with_all_byte_values()
}

/// Lines with every terminator variant, including one longer than the
/// board's 30-byte line buffer.
pub fn line_ending_payload() -> Vec<u8> {
    lines(&[
        (&b"short line"[..], LineEnding::Lf),
        (&b"another short line"[..], LineEnding::Cr),
        (&b"CRLF line"[..], LineEnding::CrLf),
        (
            &b"a line that fills up the buffer before a newline"[..],
            LineEnding::Lf,
        ),
    ])
}

/// Status strings the board logs after the line tests.
pub fn status_messages() -> Vec<StatusMessage> {
    vec![
        StatusMessage::from_static("debug", "this is a debug message"),
        StatusMessage::from_static("info", "DATE>1/1/1970"),
    ]
}

/// The full suite, with paced writes using `timing.pace`.
pub fn builtin(timing: &TimingConfig) -> Vec<TestCase> {
    let pace = timing.pace();

    let mut status = TestCase::new("status_messages");
    for msg in status_messages() {
        status = status.read_expect(msg.to_bytes());
    }

    vec![
        TestCase::new("transmit").read_expect(TRANSMIT_GREETING),
        TestCase::new("receive").write(RECEIVE_GREETING),
        TestCase::new("recv_with_timeout").write_paced(PACED_GREETING, pace),
        TestCase::new("recv_with_data_timeout")
            .write(vec![FLUSH_SENTINEL])
            .write_paced(PACED_GREETING, pace),
        TestCase::new("long_receive").write(interjection_corpus()),
        TestCase::new("long_transmit").read_expect(board_transmit_corpus()),
        TestCase::new("line_endings").write(line_ending_payload()),
        status,
    ]
}

/// Keep the cases whose name contains `filter`; all cases when `None`.
pub fn select(cases: Vec<TestCase>, filter: Option<&str>) -> Vec<TestCase> {
    match filter {
        Some(pattern) => cases
            .into_iter()
            .filter(|case| case.name.contains(pattern))
            .collect(),
        None => cases,
    }
}
