use std::sync::Arc;

use crate::error::{CodecError, Result};
use crate::table::EnumTable;
use crate::value::Value;

/// Encodes one scalar value to a fixed-width ASCII code and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCodec {
    /// Text passed through unchanged.
    Raw,
    /// Decimal integer, zero-padded to `width`. Build it with
    /// [`FieldCodec::integer`]; a zero width fails every encode and decode.
    Integer { width: usize },
    /// Label ↔ code lookup. Tables are shared between fields that reuse them.
    Enumeration(Arc<EnumTable>),
}

impl FieldCodec {
    /// A zero-padded integer field.
    pub fn integer(width: usize) -> Result<Self> {
        if width == 0 {
            return Err(CodecError::ZeroWidth);
        }
        Ok(FieldCodec::Integer { width })
    }

    /// An enumeration field over a table built from `(label, code)` pairs.
    pub fn enumeration<L, C>(
        width: usize,
        entries: impl IntoIterator<Item = (L, C)>,
    ) -> Result<Self>
    where
        L: Into<String>,
        C: Into<String>,
    {
        let table = EnumTable::new(width, entries)?;
        Ok(FieldCodec::Enumeration(Arc::new(table)))
    }

    /// Fixed code width. `None` for raw fields, which take any length when
    /// used on their own.
    pub fn width(&self) -> Option<usize> {
        match self {
            FieldCodec::Raw => None,
            FieldCodec::Integer { width } => Some(*width),
            FieldCodec::Enumeration(table) => Some(table.width()),
        }
    }

    /// Encode a value into its code.
    pub fn encode(&self, value: &Value) -> Result<String> {
        match self {
            FieldCodec::Raw => match value {
                Value::Text(text) => ascii(text.clone()),
                Value::Int(n) => Ok(n.to_string()),
                other => Err(mismatch("text", other)),
            },
            FieldCodec::Integer { width: 0 } => Err(CodecError::ZeroWidth),
            FieldCodec::Integer { width } => {
                let n = match value {
                    Value::Int(n) => *n,
                    // Callers holding a decimal string may pass it as text.
                    Value::Text(text) => text
                        .trim()
                        .parse()
                        .map_err(|_| CodecError::InvalidInteger { code: text.clone() })?,
                    other => return Err(mismatch("integer", other)),
                };
                let code = format!("{n:0width$}", width = *width);
                if code.len() > *width {
                    return Err(CodecError::IntegerOverflow {
                        value: n,
                        width: *width,
                    });
                }
                Ok(code)
            }
            FieldCodec::Enumeration(table) => {
                let code = match value {
                    Value::Text(label) => table.code(label)?,
                    Value::Int(n) => table.code(&n.to_string())?,
                    other => return Err(mismatch("label", other)),
                };
                Ok(code.to_string())
            }
        }
    }

    /// Decode a code into its value.
    pub fn decode(&self, code: &str) -> Result<Value> {
        match self {
            FieldCodec::Raw => Ok(Value::Text(code.to_string())),
            FieldCodec::Integer { width: 0 } => Err(CodecError::ZeroWidth),
            FieldCodec::Integer { .. } => parse_integer(code).map(Value::Int),
            FieldCodec::Enumeration(table) => Ok(Value::Text(table.label(code)?.to_string())),
        }
    }
}

fn parse_integer(code: &str) -> Result<i64> {
    let digits = code.strip_prefix(['-', '+']).unwrap_or(code);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::InvalidInteger {
            code: code.to_string(),
        });
    }
    code.parse().map_err(|_| CodecError::InvalidInteger {
        code: code.to_string(),
    })
}

fn ascii(text: String) -> Result<String> {
    if text.is_ascii() {
        Ok(text)
    } else {
        Err(CodecError::NonAscii { text })
    }
}

fn mismatch(expected: &'static str, actual: &Value) -> CodecError {
    CodecError::TypeMismatch {
        expected,
        actual: actual.kind(),
    }
}
