mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "asciilink",
    version,
    about = "Talk to tag-prefixed ASCII serial instruments"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). `debug` shows every frame on the wire.
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::cmd::{DataBitsArg, ParityArg};

    #[test]
    fn parses_query_with_catalog() {
        let cli = Cli::try_parse_from([
            "asciilink",
            "query",
            "position",
            "--port",
            "/dev/ttyUSB0",
            "--catalog",
            "/etc/asciilink/valve.json",
        ])
        .expect("query args should parse");

        let Command::Query(args) = cli.command else {
            panic!("expected query subcommand");
        };
        assert_eq!(args.target, "position");
        assert_eq!(args.serial.port, "/dev/ttyUSB0");
        assert_eq!(
            args.catalog.catalog.as_deref(),
            Some(Path::new("/etc/asciilink/valve.json"))
        );
    }

    #[test]
    fn serial_defaults_are_seven_even_one() {
        let cli = Cli::try_parse_from(["asciilink", "clear", "--port", "COM3"])
            .expect("clear args should parse");
        let Command::Clear(args) = cli.command else {
            panic!("expected clear subcommand");
        };

        let config = args.serial.serial_config().expect("defaults are valid");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.timeout_ms, 200);
        assert!(matches!(args.serial.data_bits, DataBitsArg::Seven));
        assert!(matches!(args.serial.parity, ParityArg::Even));
    }

    #[test]
    fn parses_write_with_multiple_values() {
        let cli = Cli::try_parse_from([
            "asciilink",
            "write",
            "s:21",
            "1",
            "0001000",
            "--port",
            "/dev/ttyS1",
            "--data-bits",
            "8",
            "--parity",
            "none",
            "--lock-timeout",
            "2s",
        ])
        .expect("write args should parse");

        let Command::Write(args) = cli.command else {
            panic!("expected write subcommand");
        };
        assert_eq!(args.values, vec!["1", "0001000"]);
        assert!(matches!(args.serial.data_bits, DataBitsArg::Eight));
        assert_eq!(
            args.serial.lock_config().unwrap().timeout,
            Some(std::time::Duration::from_secs(2))
        );
    }

    #[test]
    fn rejects_unknown_parity() {
        let err = Cli::try_parse_from([
            "asciilink",
            "clear",
            "--port",
            "/dev/ttyS1",
            "--parity",
            "mark",
        ])
        .expect_err("mark parity is not supported");

        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn parses_watch_and_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "asciilink",
            "watch",
            "A:",
            "--port",
            "/dev/ttyUSB0",
            "--interval",
            "500ms",
            "--count",
            "3",
            "--format",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("watch args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert!(matches!(cli.log_level, LogLevel::Debug));
        let Command::Watch(args) = cli.command else {
            panic!("expected watch subcommand");
        };
        assert_eq!(args.count, Some(3));
        assert_eq!(args.interval, "500ms");
    }

    #[test]
    fn parses_errors_subcommand() {
        let cli = Cli::try_parse_from(["asciilink", "errors"]).expect("errors should parse");
        assert!(matches!(cli.command, Command::Errors));
    }
}
