use asciilink_protocol::DEVICE_ERRORS;
use serde::Serialize;

use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_records, OutputFormat};

#[derive(Serialize)]
struct ErrorRow {
    code: &'static str,
    message: &'static str,
}

pub fn run(format: OutputFormat) -> CliResult<i32> {
    let rows: Vec<ErrorRow> = DEVICE_ERRORS
        .iter()
        .map(|&(code, message)| ErrorRow { code, message })
        .collect();

    print_records(&["CODE", "MESSAGE"], &rows, format, |row| {
        vec![row.code.to_string(), row.message.to_string()]
    });
    Ok(SUCCESS)
}
