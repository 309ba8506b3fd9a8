/// Errors raised while building or applying a codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Encoding a label that is not in the enumeration table.
    #[error("unknown label {label:?}")]
    UnknownLabel { label: String },

    /// Decoding a code that is not in the enumeration table.
    #[error("unknown code {code:?}")]
    UnknownCode { code: String },

    /// A frame payload does not match the declared total width.
    #[error("frame length mismatch (expected {expected} characters, got {actual})")]
    FrameLengthMismatch { expected: usize, actual: usize },

    /// An integer field did not contain a decimal number.
    #[error("invalid integer field {code:?}")]
    InvalidInteger { code: String },

    /// An integer does not fit the field once zero-padded.
    #[error("integer {value} does not fit in {width} characters")]
    IntegerOverflow { value: i64, width: usize },

    /// The value's shape does not fit the codec.
    #[error("expected {expected} value, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A frame was given the wrong number of values.
    #[error("frame has {expected} fields, got {actual} values")]
    FieldCount { expected: usize, actual: usize },

    /// An encoded frame field came out at the wrong width.
    #[error("field {index} encoded to {actual} characters, expected {expected}")]
    FieldWidthMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// A reply carried more tokens than a body can decode.
    #[error("expected at most one payload token, got {actual}")]
    TokenCount { actual: usize },

    /// An enumeration code does not have the table's width.
    #[error("code {code:?} is not {width} characters wide")]
    CodeWidthMismatch { code: String, width: usize },

    /// Two labels map to the same code.
    #[error("duplicate code {code:?}")]
    DuplicateCode { code: String },

    /// A label appears twice in one table.
    #[error("duplicate label {label:?}")]
    DuplicateLabel { label: String },

    /// A field was declared with zero width.
    #[error("field width must be positive")]
    ZeroWidth,

    /// A frame slot width disagrees with its codec's own width.
    #[error("field {index} declared {declared} characters but its codec is {codec} wide")]
    WidthConflict {
        index: usize,
        declared: usize,
        codec: usize,
    },

    /// Wire payloads are ASCII only.
    #[error("non-ASCII text {text:?}")]
    NonAscii { text: String },
}

pub type Result<T> = std::result::Result<T, CodecError>;
