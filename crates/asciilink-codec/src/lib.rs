//! Fixed-width ASCII field and frame codecs.
//!
//! Instruments speaking tag-prefixed ASCII protocols pack their payloads as
//! positional, fixed-width fields with no separators. This crate turns
//! symbolic [`Value`]s into those codes and back:
//! - [`FieldCodec`]: one field, as raw text, a zero-padded integer, or an
//!   enumeration backed by a bijective [`EnumTable`]
//! - [`FrameCodec`]: an ordered list of fixed-width fields
//! - [`Body`]: the payload codec of a command, either of the above
//!
//! All schema validation happens at construction. A codec that was built
//! successfully only fails on values or codes it does not know.

pub mod body;
pub mod error;
pub mod field;
pub mod frame;
pub mod table;
pub mod value;

pub use body::Body;
pub use error::{CodecError, Result};
pub use field::FieldCodec;
pub use frame::{FieldSpec, FrameCodec};
pub use table::EnumTable;
pub use value::Value;
