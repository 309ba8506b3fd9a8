use crate::error::{CodecError, Result};
use crate::field::FieldCodec;
use crate::value::Value;

/// One positional slot of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub width: usize,
    pub codec: FieldCodec,
}

impl FieldSpec {
    pub fn new(width: usize, codec: FieldCodec) -> Self {
        Self { width, codec }
    }

    /// A raw text slot.
    pub fn raw(width: usize) -> Self {
        Self::new(width, FieldCodec::Raw)
    }
}

/// Fixed-width positional frame: encoded fields concatenated with no
/// delimiters.
///
/// Layout of a six-field frame with widths `[6, 1, 7, 1, 1, 1]`:
/// ```text
/// ┌────────┬───┬─────────┬───┬───┬───┐
/// │ 000123 │ 0 │ 0012345 │ 0 │ 2 │ 0 │
/// └────────┴───┴─────────┴───┴───┴───┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCodec {
    fields: Vec<FieldSpec>,
    width: usize,
}

impl FrameCodec {
    /// Build a frame, checking that every slot width is positive and agrees
    /// with its codec's own width.
    pub fn new(fields: impl IntoIterator<Item = FieldSpec>) -> Result<Self> {
        let fields: Vec<FieldSpec> = fields.into_iter().collect();
        for (index, field) in fields.iter().enumerate() {
            if field.width == 0 {
                return Err(CodecError::ZeroWidth);
            }
            if let Some(codec) = field.codec.width() {
                if codec != field.width {
                    return Err(CodecError::WidthConflict {
                        index,
                        declared: field.width,
                        codec,
                    });
                }
            }
        }
        let width = fields.iter().map(|field| field.width).sum();
        Ok(Self { fields, width })
    }

    /// Sum of all field widths.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Encode one value per field, in field order.
    pub fn encode(&self, values: &[Value]) -> Result<String> {
        if values.len() != self.fields.len() {
            return Err(CodecError::FieldCount {
                expected: self.fields.len(),
                actual: values.len(),
            });
        }

        let mut out = String::with_capacity(self.width);
        for (index, (field, value)) in self.fields.iter().zip(values).enumerate() {
            let code = field.codec.encode(value)?;
            if code.len() != field.width {
                return Err(CodecError::FieldWidthMismatch {
                    index,
                    expected: field.width,
                    actual: code.len(),
                });
            }
            out.push_str(&code);
        }
        Ok(out)
    }

    /// Slice `raw` left to right into field-width pieces and decode each.
    pub fn decode(&self, raw: &str) -> Result<Vec<Value>> {
        if raw.len() != self.width {
            return Err(CodecError::FrameLengthMismatch {
                expected: self.width,
                actual: raw.len(),
            });
        }
        if !raw.is_ascii() {
            return Err(CodecError::NonAscii {
                text: raw.to_string(),
            });
        }

        let mut offset = 0usize;
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let code = &raw[offset..offset + field.width];
            values.push(field.codec.decode(code)?);
            offset += field.width;
        }
        Ok(values)
    }
}
