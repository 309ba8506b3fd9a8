use tracing::info;

use crate::cmd::{open_instrument, value_from_args, WriteArgs};
use crate::exit::{protocol_error, CliResult, SUCCESS};
use crate::output::{print_reading, OutputFormat};

pub fn run(args: WriteArgs, format: OutputFormat) -> CliResult<i32> {
    let instrument = open_instrument(&args.serial, &args.catalog)?;

    let written = if args.catalog.catalog.is_some() {
        let command = instrument
            .registry()
            .get(&args.target)
            .map_err(|err| protocol_error("write failed", err))?;
        let value = value_from_args(command.body(), &args.values)?;
        instrument
            .write(&args.target, &value)
            .map_err(|err| protocol_error("write failed", err))?;
        value
    } else {
        let fragments: Vec<&str> = args.values.iter().map(String::as_str).collect();
        instrument
            .write_raw(&args.target, &fragments)
            .map_err(|err| protocol_error("write failed", err))?;
        args.values.concat().into()
    };

    info!(tag = %args.target, value = %written, "write acknowledged");
    print_reading(&args.target, &written, format);
    Ok(SUCCESS)
}
