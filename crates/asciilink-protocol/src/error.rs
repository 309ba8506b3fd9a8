/// Errors that can occur in protocol operations.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Transport failure while talking to the device, including timeouts.
    #[error("communication error ({context}): {source}")]
    Communication {
        context: &'static str,
        source: asciilink_transport::TransportError,
    },

    /// The device answered with an `E:<code>` frame.
    #[error("device error {code}: {}", .message.unwrap_or("unknown error code"))]
    DeviceError {
        code: String,
        message: Option<&'static str>,
    },

    /// The reply does not echo the tag that was sent.
    #[error("response header mismatch: received {received:?}, expected {expected:?}")]
    HeaderMismatch { received: String, expected: String },

    /// Payload encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] asciilink_codec::CodecError),

    /// The command has no tag for the requested direction.
    #[error("command {command} does not support {operation}")]
    UnsupportedOperation {
        command: String,
        operation: &'static str,
    },

    /// A command definition is malformed.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A message or reply is not plain single-line ASCII.
    #[error("invalid encoding: {0:?}")]
    InvalidEncoding(String),

    /// `clear` kept receiving data past its configured limit.
    #[error("channel still producing data after {chunks} chunks")]
    ClearLimitExceeded { chunks: usize },

    /// No command registered under this name.
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    /// A command name was registered twice.
    #[error("command {0:?} already registered")]
    DuplicateCommand(String),

    /// A command catalog could not be loaded.
    #[error("failed to load catalog: {0}")]
    Catalog(String),
}

impl ProtocolError {
    pub(crate) fn communication(
        context: &'static str,
    ) -> impl FnOnce(asciilink_transport::TransportError) -> Self {
        move |source| ProtocolError::Communication { context, source }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
