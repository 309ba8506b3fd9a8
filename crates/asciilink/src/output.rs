use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use asciilink_codec::Value;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

const READING_SCHEMA: &str = "https://schemas.3leaps.dev/asciilink/cli/v1/reading.schema.json";

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReadingOutput<'a> {
    schema_id: &'a str,
    target: &'a str,
    value: &'a Value,
    timestamp: String,
}

/// Print one value read from the device.
pub fn print_reading(target: &str, value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReadingOutput {
                schema_id: READING_SCHEMA,
                target,
                value,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            print_table(&["TARGET", "VALUE"], [vec![target.to_string(), value.to_string()]]);
        }
        OutputFormat::Pretty => println!("{target} = {value}"),
        OutputFormat::Raw => print_raw(&format!("{value}\n")),
    }
}

/// Print a list of records: serialized as a JSON array, or one table row
/// per record.
pub fn print_records<R, F>(header: &[&str], records: &[R], format: OutputFormat, row: F)
where
    R: Serialize,
    F: Fn(&R) -> Vec<String>,
{
    match format {
        OutputFormat::Json => print_json(&records),
        OutputFormat::Table => print_table(header, records.iter().map(&row)),
        OutputFormat::Pretty | OutputFormat::Raw => {
            for record in records {
                println!("{}", row(record).join("  "));
            }
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(text: &str) {
    let mut out = std::io::stdout();
    let _ = out.write_all(text.as_bytes());
    let _ = out.flush();
}

fn print_table(header: &[&str], rows: impl IntoIterator<Item = Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
