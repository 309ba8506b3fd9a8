use crate::error::{CodecError, Result};
use crate::field::FieldCodec;
use crate::frame::FrameCodec;
use crate::value::Value;

/// Payload codec shared by a command's query and write forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// A single scalar field.
    Field(FieldCodec),
    /// A multi-field frame; values travel as [`Value::Sequence`].
    Frame(FrameCodec),
}

impl Body {
    /// Raw text body, for commands without structured payload.
    pub fn raw() -> Self {
        Body::Field(FieldCodec::Raw)
    }

    /// Encode a value into the payload placed after the write tag.
    pub fn encode(&self, value: &Value) -> Result<String> {
        match self {
            Body::Field(codec) => codec.encode(value),
            Body::Frame(frame) => match value {
                Value::Sequence(values) => frame.encode(values),
                other => Err(CodecError::TypeMismatch {
                    expected: "sequence",
                    actual: other.kind(),
                }),
            },
        }
    }

    /// Decode a payload that follows the echoed tag.
    pub fn decode(&self, payload: &str) -> Result<Value> {
        match self {
            Body::Field(codec) => codec.decode(payload),
            Body::Frame(frame) => frame.decode(payload).map(Value::Sequence),
        }
    }

    /// Decode whitespace-separated reply tokens.
    ///
    /// Zero tokens decode as the empty payload; more than one is an error,
    /// since packed bodies never contain whitespace.
    pub fn decode_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Value> {
        match tokens {
            [] => self.decode(""),
            [token] => self.decode(token.as_ref()),
            _ => Err(CodecError::TokenCount {
                actual: tokens.len(),
            }),
        }
    }
}

impl From<FieldCodec> for Body {
    fn from(codec: FieldCodec) -> Self {
        Body::Field(codec)
    }
}

impl From<FrameCodec> for Body {
    fn from(frame: FrameCodec) -> Self {
        Body::Frame(frame)
    }
}
