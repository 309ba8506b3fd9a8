use asciilink_codec::Value;
use asciilink_protocol::Instrument;
use asciilink_transport::open_serial_channel;

use crate::cmd::ClearArgs;
use crate::exit::{protocol_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_reading, OutputFormat};

pub fn run(args: ClearArgs, format: OutputFormat) -> CliResult<i32> {
    let channel = open_serial_channel(
        &args.serial.serial_config()?,
        &args.serial.lock_config()?,
    )
    .map_err(|err| transport_error("open failed", err))?;

    let chunks = Instrument::new(channel)
        .clear()
        .map_err(|err| protocol_error("clear failed", err))?;

    let discarded = Value::Int(i64::try_from(chunks).unwrap_or(i64::MAX));
    print_reading("discarded_chunks", &discarded, format);
    Ok(SUCCESS)
}
