//! Synchronous request/response protocol for tag-prefixed ASCII instruments.
//!
//! One exchange is `<tag><payload>\r\n` out and `<tag><payload>\r\n` (or
//! `E:<code>\r\n`) back, performed while holding the channel's
//! [`Session`](asciilink_transport::Session). On top of that:
//! - [`Command`] binds query/write tags to a payload [`Body`](asciilink_codec::Body)
//! - [`CommandRegistry`] loads named commands from a declarative catalog
//! - [`Instrument`] is the handle a device driver builds on

pub mod command;
pub mod device_error;
pub mod error;
pub mod instrument;
pub mod message;
pub mod registry;
pub mod transaction;

pub use command::Command;
pub use device_error::{describe_device_error, DEVICE_ERRORS};
pub use error::{ProtocolError, Result};
pub use instrument::Instrument;
pub use message::{encode_message, parse_response, ERROR_MARKER, TERMINATOR};
pub use registry::{CommandRegistry, MAX_CATALOG_SIZE};
pub use transaction::{ProtocolConfig, TransactionProtocol};
