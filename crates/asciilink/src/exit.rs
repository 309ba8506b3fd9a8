use std::fmt;

use asciilink_codec::CodecError;
use asciilink_protocol::ProtocolError;
use asciilink_transport::TransportError;

// Exit code constants aligned with rsfulmen/DDR-0002 semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match err {
        TransportError::Timeout | TransportError::LockTimeout { .. } => TIMEOUT,
        TransportError::Open { .. }
        | TransportError::Io(_)
        | TransportError::Closed
        | TransportError::Lock { .. } => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn protocol_error(context: &str, err: ProtocolError) -> CliError {
    match err {
        ProtocolError::Communication { context: step, source } => {
            transport_error(&format!("{context} ({step})"), source)
        }
        ProtocolError::Codec(err) => codec_error(context, err),
        ProtocolError::DeviceError { .. }
        | ProtocolError::HeaderMismatch { .. }
        | ProtocolError::InvalidEncoding(_)
        | ProtocolError::Catalog(_)
        | ProtocolError::InvalidCommand(_)
        | ProtocolError::DuplicateCommand(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        ProtocolError::UnknownCommand(_) | ProtocolError::UnsupportedOperation { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        ProtocolError::ClearLimitExceeded { .. } => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
    }
}
