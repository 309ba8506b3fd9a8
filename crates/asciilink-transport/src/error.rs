use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The serial device could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        source: serialport::Error,
    },

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A read or write did not complete within the configured timeout.
    #[error("transport timed out")]
    Timeout,

    /// The stream reported end-of-file.
    #[error("transport closed")]
    Closed,

    /// The cross-process lock file could not be opened or locked.
    #[error("failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The cross-process lock was not released within the configured timeout.
    #[error("timed out after {timeout:?} waiting for lock {path}")]
    LockTimeout { path: PathBuf, timeout: Duration },
}

impl TransportError {
    /// True for the timeout condition `clear` treats as end-of-data.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout)
    }

    /// Classify an I/O error from a blocking read or write.
    ///
    /// Serial drivers report an expired timeout as `TimedOut`, sockets with
    /// a read timeout as `WouldBlock`.
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => TransportError::Timeout,
            ErrorKind::UnexpectedEof => TransportError::Closed,
            _ => TransportError::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_out_and_would_block_classify_as_timeout() {
        let err = TransportError::from_io(std::io::Error::from(ErrorKind::TimedOut));
        assert!(err.is_timeout());
        let err = TransportError::from_io(std::io::Error::from(ErrorKind::WouldBlock));
        assert!(err.is_timeout());
    }

    #[test]
    fn other_io_errors_are_not_timeouts() {
        let err = TransportError::from_io(std::io::Error::from(ErrorKind::BrokenPipe));
        assert!(!err.is_timeout());
        assert!(matches!(err, TransportError::Io(_)));
    }
}
