use std::path::{Path, PathBuf};
use std::time::Duration;

use asciilink_codec::{Body, Value};
use asciilink_protocol::{CommandRegistry, Instrument};
use asciilink_transport::{
    open_serial_channel, DataBits, LockConfig, Parity, SerialConfig, SerialTransport, StopBits,
};
use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{protocol_error, transport_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod clear;
pub mod commands;
pub mod errors;
pub mod query;
pub mod version;
pub mod watch;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Query a catalog command or a raw tag and print the reply.
    Query(QueryArgs),
    /// Write a value with a catalog command or a raw tag.
    Write(WriteArgs),
    /// Discard stale bytes pending on the serial line.
    Clear(ClearArgs),
    /// Poll a query at a fixed interval until interrupted.
    Watch(WatchArgs),
    /// List the commands defined in a catalog.
    Commands(CommandsArgs),
    /// Print the device error code table.
    Errors,
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Query(args) => query::run(args, format),
        Command::Write(args) => write::run(args, format),
        Command::Clear(args) => clear::run(args, format),
        Command::Watch(args) => watch::run(args, format),
        Command::Commands(args) => commands::run(args, format),
        Command::Errors => errors::run(format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum DataBitsArg {
    #[value(name = "7")]
    Seven,
    #[value(name = "8")]
    Eight,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ParityArg {
    None,
    Odd,
    Even,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum StopBitsArg {
    #[value(name = "1")]
    One,
    #[value(name = "2")]
    Two,
}

#[derive(Args, Debug)]
pub struct SerialArgs {
    /// Serial device path (e.g. /dev/ttyUSB0, COM3).
    #[arg(long, short = 'p', env = "ASCIILINK_PORT")]
    pub port: String,
    /// Line speed.
    #[arg(long, env = "ASCIILINK_BAUD", default_value_t = 9600)]
    pub baud: u32,
    #[arg(long, value_enum, default_value = "7")]
    pub data_bits: DataBitsArg,
    #[arg(long, value_enum, default_value = "even")]
    pub parity: ParityArg,
    #[arg(long, value_enum, default_value = "1")]
    pub stop_bits: StopBitsArg,
    /// Per-read timeout (e.g. 200ms, 1s).
    #[arg(long, default_value = "200ms")]
    pub timeout: String,
    /// Directory holding cross-process lock files. Default: system temp dir.
    #[arg(long, env = "ASCIILINK_LOCK_DIR", value_name = "DIR")]
    pub lock_dir: Option<PathBuf>,
    /// Give up waiting for another process holding the port (e.g. 5s).
    #[arg(long)]
    pub lock_timeout: Option<String>,
}

impl SerialArgs {
    pub fn serial_config(&self) -> CliResult<SerialConfig> {
        let timeout = parse_duration(&self.timeout)?;
        Ok(SerialConfig {
            path: self.port.clone(),
            baud_rate: self.baud,
            data_bits: match self.data_bits {
                DataBitsArg::Seven => DataBits::Seven,
                DataBitsArg::Eight => DataBits::Eight,
            },
            parity: match self.parity {
                ParityArg::None => Parity::None,
                ParityArg::Odd => Parity::Odd,
                ParityArg::Even => Parity::Even,
            },
            stop_bits: match self.stop_bits {
                StopBitsArg::One => StopBits::One,
                StopBitsArg::Two => StopBits::Two,
            },
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    pub fn lock_config(&self) -> CliResult<LockConfig> {
        Ok(LockConfig {
            directory: self.lock_dir.clone(),
            timeout: self.lock_timeout.as_deref().map(parse_duration).transpose()?,
        })
    }
}

#[derive(Args, Debug)]
pub struct CatalogArg {
    /// JSON command catalog. Without it, targets are raw tags.
    #[arg(long, env = "ASCIILINK_CATALOG", value_name = "FILE")]
    pub catalog: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Catalog command name, or a raw tag such as `A:` or `i:83`.
    pub target: String,
    #[command(flatten)]
    pub catalog: CatalogArg,
    #[command(flatten)]
    pub serial: SerialArgs,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Catalog command name, or a raw tag such as `R:`.
    pub target: String,
    /// Value(s) to write. Frame commands take one value per field; raw tags
    /// send them as preformatted fragments.
    pub values: Vec<String>,
    #[command(flatten)]
    pub catalog: CatalogArg,
    #[command(flatten)]
    pub serial: SerialArgs,
}

#[derive(Args, Debug)]
pub struct ClearArgs {
    #[command(flatten)]
    pub serial: SerialArgs,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Catalog command name, or a raw tag.
    pub target: String,
    /// Delay between polls (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
    /// Exit after N readings.
    #[arg(long)]
    pub count: Option<usize>,
    #[command(flatten)]
    pub catalog: CatalogArg,
    #[command(flatten)]
    pub serial: SerialArgs,
}

#[derive(Args, Debug)]
pub struct CommandsArgs {
    /// JSON command catalog.
    #[arg(long, env = "ASCIILINK_CATALOG", value_name = "FILE")]
    pub catalog: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn load_catalog(path: &Path) -> CliResult<CommandRegistry> {
    CommandRegistry::from_file(path).map_err(|err| protocol_error("catalog load failed", err))
}

/// Open the port, take its lock file and wrap it in an instrument.
pub fn open_instrument(
    serial: &SerialArgs,
    catalog: &CatalogArg,
) -> CliResult<Instrument<SerialTransport>> {
    let registry = match &catalog.catalog {
        Some(path) => load_catalog(path)?,
        None => CommandRegistry::new(),
    };
    let channel = open_serial_channel(&serial.serial_config()?, &serial.lock_config()?)
        .map_err(|err| transport_error("open failed", err))?;
    Ok(Instrument::with_registry(channel, registry))
}

/// Query a named catalog command, or `target` as a raw tag when `named` is
/// false.
pub fn read_target(
    instrument: &Instrument<SerialTransport>,
    target: &str,
    named: bool,
) -> CliResult<Value> {
    if !named {
        let tokens = instrument
            .query_raw(target, &[])
            .map_err(|err| protocol_error("query failed", err))?;
        return Ok(tokens_to_value(tokens));
    }
    instrument
        .query(target)
        .map_err(|err| protocol_error("query failed", err))
}

/// Raw reply tokens as a value: one token as text, several as a sequence.
pub fn tokens_to_value(mut tokens: Vec<String>) -> Value {
    if tokens.len() == 1 {
        if let Some(token) = tokens.pop() {
            return Value::Text(token);
        }
    }
    Value::Sequence(tokens.into_iter().map(Value::Text).collect())
}

/// Build the value a command body expects from positional arguments.
///
/// Frames take one argument per field; scalar bodies take exactly one, or
/// none for an empty raw payload. Integers are passed as decimal text and
/// parsed by the codec.
pub fn value_from_args(body: &Body, values: &[String]) -> CliResult<Value> {
    match (body, values) {
        (Body::Frame(_), values) => Ok(Value::Sequence(
            values.iter().cloned().map(Value::Text).collect(),
        )),
        (Body::Field(_), []) => Ok(Value::empty()),
        (Body::Field(_), [value]) => Ok(Value::Text(value.clone())),
        (Body::Field(_), values) => Err(CliError::usage(format!(
            "expected a single value, got {}",
            values.len()
        ))),
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use asciilink_codec::{FieldCodec, FieldSpec, FrameCodec};

    use super::*;
    use crate::exit::USAGE;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn frame_bodies_take_one_value_per_field() {
        let body: Body = FrameCodec::new([FieldSpec::raw(1), FieldSpec::raw(7)])
            .unwrap()
            .into();
        let value = value_from_args(&body, &["1".to_string(), "0001000".to_string()]).unwrap();
        assert_eq!(value, Value::from(vec!["1", "0001000"]));
    }

    #[test]
    fn scalar_bodies_take_at_most_one_value() {
        let body: Body = FieldCodec::integer(6).unwrap().into();
        assert_eq!(
            value_from_args(&body, &["500".to_string()]).unwrap(),
            Value::from("500")
        );
        assert_eq!(value_from_args(&body, &[]).unwrap(), Value::empty());

        let err = value_from_args(&body, &["1".to_string(), "2".to_string()]).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn single_raw_token_is_text() {
        assert_eq!(tokens_to_value(vec!["VAT590".into()]), Value::from("VAT590"));
        assert_eq!(
            tokens_to_value(vec!["VAT".into(), "590".into()]),
            Value::from(vec!["VAT", "590"])
        );
        assert_eq!(tokens_to_value(Vec::new()), Value::Sequence(Vec::new()));
    }
}
