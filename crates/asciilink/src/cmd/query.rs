use crate::cmd::{open_instrument, read_target, QueryArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_reading, OutputFormat};

pub fn run(args: QueryArgs, format: OutputFormat) -> CliResult<i32> {
    let instrument = open_instrument(&args.serial, &args.catalog)?;
    let value = read_target(&instrument, &args.target, args.catalog.catalog.is_some())?;
    print_reading(&args.target, &value, format);
    Ok(SUCCESS)
}
