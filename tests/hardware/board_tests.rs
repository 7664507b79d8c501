//! Full built-in suite against the real board.

use super::utils::discover_probes;
use uart_conformance::port::SystemPortOpener;
use uart_conformance::{suite, Runner};

#[test]
#[ignore] // Run with --ignored flag
fn test_builtin_suite_on_board() {
    let fixture = crate::board_or_skip!();

    let cases = suite::builtin(&fixture.config.timing);
    let runner = Runner::new(SystemPortOpener, fixture.settings);
    let report = runner.run(&cases);

    println!("{}", report.summary());
    assert!(report.all_passed(), "{} case(s) failed", report.failed());
}

#[test]
#[ignore]
fn test_configured_probe_is_attached() {
    let fixture = crate::board_or_skip!();
    let probes = discover_probes();
    println!("Attached probes: {:?}", probes);

    let serial = fixture.config.device.serial_id.unwrap_or_default();
    assert!(
        probes.iter().any(|p| *p == serial),
        "probe {} not among attached probes",
        serial
    );
}
