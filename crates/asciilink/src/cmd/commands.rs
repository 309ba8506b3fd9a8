use asciilink_codec::{Body, FieldCodec};
use serde::Serialize;

use crate::cmd::{load_catalog, CommandsArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_records, OutputFormat};

#[derive(Serialize)]
struct CommandRow<'a> {
    name: &'a str,
    query: Option<&'a str>,
    write: Option<&'a str>,
    body: String,
}

pub fn run(args: CommandsArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_catalog(&args.catalog)?;

    let rows: Vec<CommandRow<'_>> = registry
        .names()
        .into_iter()
        .filter_map(|name| {
            let command = registry.get(name).ok()?;
            Some(CommandRow {
                name,
                query: command.query_tag(),
                write: command.write_tag(),
                body: describe_body(command.body()),
            })
        })
        .collect();

    print_records(
        &["NAME", "QUERY", "WRITE", "BODY"],
        &rows,
        format,
        |row| {
            vec![
                row.name.to_string(),
                row.query.unwrap_or("-").to_string(),
                row.write.unwrap_or("-").to_string(),
                row.body.clone(),
            ]
        },
    );
    Ok(SUCCESS)
}

fn describe_field(codec: &FieldCodec) -> String {
    match codec {
        FieldCodec::Raw => "raw".to_string(),
        FieldCodec::Integer { width } => format!("integer({width})"),
        FieldCodec::Enumeration(table) => {
            let labels: Vec<&str> = table.entries().map(|(label, _)| label).collect();
            format!("enum[{}]", labels.join("|"))
        }
    }
}

fn describe_body(body: &Body) -> String {
    match body {
        Body::Field(codec) => describe_field(codec),
        Body::Frame(frame) => {
            let fields: Vec<String> = frame
                .fields()
                .iter()
                .map(|field| match &field.codec {
                    FieldCodec::Raw => format!("raw({})", field.width),
                    other => describe_field(other),
                })
                .collect();
            format!("frame({})", fields.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use asciilink_codec::{FieldSpec, FrameCodec};

    use super::*;

    #[test]
    fn describes_bodies() {
        assert_eq!(describe_body(&Body::raw()), "raw");

        let frame: Body = FrameCodec::new([
            FieldSpec::raw(6),
            FieldSpec::new(
                1,
                FieldCodec::enumeration(1, [("Closed", "3"), ("Opened", "4")]).unwrap(),
            ),
            FieldSpec::new(2, FieldCodec::integer(2).unwrap()),
        ])
        .unwrap()
        .into();
        assert_eq!(
            describe_body(&frame),
            "frame(raw(6), enum[Closed|Opened], integer(2))"
        );
    }
}
