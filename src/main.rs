use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use uart_conformance::config::{ConfigError, ConfigLoader, LogFormat};
use uart_conformance::error::{
    AppError, AppResult, EXIT_CASE_FAILED, EXIT_CONFIG_ERROR, EXIT_SUCCESS,
};
use uart_conformance::harness::{self, Runner, RunnerSettings, SuiteReport, TestCase};
use uart_conformance::port::SystemPortOpener;
use uart_conformance::{logging, suite, Config};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "uart-conformance",
    version,
    about = "Host-side UART conformance suite for boards behind a CMSIS-DAP debug probe.",
    long_about = "Opens the board's serial device once per case, exchanges fixed byte sequences with the \
                  conformance firmware and compares what comes back byte for byte. Exits 0 when every \
                  case passed, 1 when any case failed and 2 on configuration errors."
)]
struct Cli {
    /// Configuration file (default: UART_CONFORMANCE_CONFIG, ./uart-conformance.toml, user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Suite script replacing the built-in cases
    #[arg(long, global = true)]
    script: Option<PathBuf>,

    /// Only cases whose name contains this substring
    #[arg(short, long, global = true)]
    filter: Option<String>,

    /// Log format: json, pretty, compact
    #[arg(long, global = true, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the suite against the board (default)
    Run(RunArgs),
    /// Print the selected cases without opening a port
    List,
}

#[derive(clap::Args, Debug, Default, Clone)]
struct RunArgs {
    /// Debug probe serial number (overrides SERIAL)
    #[arg(short, long)]
    serial: Option<String>,

    /// Explicit device path; skips the probe path template
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Write the JSON report here ("-" for stdout)
    #[arg(short, long)]
    report: Option<PathBuf>,
}

impl RunArgs {
    /// Values from `self` win; anything unset falls back to `outer`.
    fn or(self, outer: &RunArgs) -> RunArgs {
        RunArgs {
            serial: self.serial.or_else(|| outer.serial.clone()),
            device: self.device.or_else(|| outer.device.clone()),
            report: self.report.or_else(|| outer.report.clone()),
        }
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "json" => Ok(LogFormat::Json),
        "pretty" => Ok(LogFormat::Pretty),
        "compact" => Ok(LogFormat::Compact),
        other => Err(format!("unknown log format '{}'", other)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "aborted");
            eprintln!("error: {}", e);
            e.exit_code()
        }
    }
}

fn run(cli: Cli) -> AppResult<ExitCode> {
    let mut config = match cli.config {
        Some(ref path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    }
    .into_config();

    let run_args = effective_run_args(&cli);
    apply_cli_overrides(&mut config, &cli, &run_args);

    logging::init(&config.logging)?;

    let cases = suite::select(load_cases(&config)?, cli.filter.as_deref());
    if cases.is_empty() {
        return Err(ConfigError::validation("filter", "no case matches").into());
    }

    match cli.command {
        Some(Command::List) => {
            list_cases(&cases);
            Ok(ExitCode::SUCCESS)
        }
        _ => run_suite(&config, &cases, &run_args),
    }
}

/// Run options given after `run` override the same options given before it.
fn effective_run_args(cli: &Cli) -> RunArgs {
    match cli.command {
        Some(Command::Run(ref args)) => args.clone().or(&cli.run),
        _ => cli.run.clone(),
    }
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli, run_args: &RunArgs) {
    if let Some(ref serial) = run_args.serial {
        config.device.serial_id = Some(serial.clone());
    }
    if let Some(ref device) = run_args.device {
        config.device.path = Some(device.display().to_string());
    }
    if let Some(ref script) = cli.script {
        config.suite.script = Some(script.clone());
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
}

fn load_cases(config: &Config) -> AppResult<Vec<TestCase>> {
    match config.suite.script {
        Some(ref path) => {
            info!(script = %path.display(), "loading suite script");
            Ok(suite::load_script(path, &config.timing)?)
        }
        None => Ok(suite::builtin(&config.timing)),
    }
}

fn list_cases(cases: &[TestCase]) {
    for case in cases {
        let bytes: usize = case.steps.iter().map(|s| s.len()).sum();
        let actions: Vec<_> = case.steps.iter().map(|s| s.action()).collect();
        println!(
            "{:<24} {:>2} steps {:>6} bytes  [{}]",
            case.name,
            case.steps.len(),
            bytes,
            actions.join(", ")
        );
    }
}

fn run_suite(config: &Config, cases: &[TestCase], args: &RunArgs) -> AppResult<ExitCode> {
    let settings = match RunnerSettings::from_config(config) {
        Ok(settings) => settings,
        Err(ConfigError::MissingRequired(reason)) => {
            let report = harness::unconfigured(cases, &reason);
            emit_report(&report, args)?;
            return Ok(ExitCode::from(exit_status(&report, false)));
        }
        Err(e) => return Err(AppError::Config(e)),
    };

    let runner = Runner::new(SystemPortOpener, settings);
    let report = runner.run(cases);
    emit_report(&report, args)?;
    Ok(ExitCode::from(exit_status(&report, true)))
}

/// Process status for a finished run. `configured` is false when no device
/// could be addressed.
fn exit_status(report: &SuiteReport, configured: bool) -> u8 {
    if !configured {
        EXIT_CONFIG_ERROR
    } else if report.all_passed() {
        EXIT_SUCCESS
    } else {
        EXIT_CASE_FAILED
    }
}

fn emit_report(report: &SuiteReport, args: &RunArgs) -> AppResult<()> {
    match args.report {
        Some(ref path) if path.as_os_str() == "-" => println!("{}", report.to_json()?),
        Some(ref path) => {
            std::fs::write(path, report.to_json()?)?;
            print!("{}", report.summary());
            info!(report = %path.display(), "report written");
        }
        None => print!("{}", report.summary()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uart_conformance::harness::{CaseOutcome, FailureRecord, Mismatch, StepFailure};

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bare_invocation_runs() {
        let cli = Cli::try_parse_from(["uart-conformance", "--serial", "ABC123"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.serial.as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_run_subcommand_overrides() {
        let cli = Cli::try_parse_from([
            "uart-conformance",
            "--filter",
            "long",
            "run",
            "--device",
            "/dev/ttyACM0",
        ])
        .unwrap();
        let mut config = Config::default();
        let args = effective_run_args(&cli);
        apply_cli_overrides(&mut config, &cli, &args);

        assert_eq!(config.device.resolve_path().unwrap(), "/dev/ttyACM0");
        assert_eq!(cli.filter.as_deref(), Some("long"));
    }

    #[test]
    fn test_options_before_run_are_kept() {
        let cli = Cli::try_parse_from(["uart-conformance", "--serial", "ABC123", "run"]).unwrap();
        let mut config = Config::default();
        apply_cli_overrides(&mut config, &cli, &effective_run_args(&cli));

        assert_eq!(config.device.serial_id.as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_options_after_run_win() {
        let cli = Cli::try_parse_from([
            "uart-conformance",
            "--serial",
            "OUTER",
            "--report",
            "outer.json",
            "run",
            "--serial",
            "INNER",
        ])
        .unwrap();
        let args = effective_run_args(&cli);

        assert_eq!(args.serial.as_deref(), Some("INNER"));
        assert_eq!(args.report, Some(PathBuf::from("outer.json")));
    }

    #[test]
    fn test_exit_status_mapping() {
        let mut report = SuiteReport::new("MOCK0");
        report.push(CaseOutcome::passed("transmit", 1, Duration::ZERO));
        assert_eq!(exit_status(&report, true), 0);

        let failure = FailureRecord::from_failure(
            &StepFailure::Mismatch(Mismatch::new(b"bleh", b"blah")),
            Some(0),
        );
        report.push(CaseOutcome::failed("receive", 1, Duration::ZERO, failure));
        assert_eq!(exit_status(&report, true), 1);

        let cases = [TestCase::new("transmit").read_expect("bleh")];
        let unconfigured = harness::unconfigured(&cases, "probe serial id");
        assert_eq!(exit_status(&unconfigured, false), 2);
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(parse_log_format("JSON"), Ok(LogFormat::Json));
        assert!(parse_log_format("xml").is_err());
    }
}
