//! Tests requiring a real board behind a CMSIS-DAP probe.
//!
//! Cases must run in firmware order, so every test here runs the suite (or a
//! prefix of it) in one go rather than one case per test.

pub mod board_tests;
pub mod utils;
