use std::io::{ErrorKind, Read, Write};

use bytes::{Bytes, BytesMut};

use crate::error::{Result, TransportError};

const INITIAL_BUFFER_CAPACITY: usize = 256;
const READ_CHUNK_SIZE: usize = 64;

/// Default upper bound on one terminated reply.
pub const DEFAULT_MAX_LINE: usize = 4 * 1024;

/// Byte-level contract required of a device transport.
///
/// Every operation may fail with [`TransportError::Timeout`], which callers
/// must be able to tell apart from other failures.
pub trait Transport: Send {
    /// Write all bytes and flush.
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Read until `terminator` has been seen.
    ///
    /// The returned bytes include the terminator. Bytes received after the
    /// terminator are kept for the next read.
    fn read_until(&mut self, terminator: &[u8]) -> Result<Bytes>;

    /// Read at most `len` bytes, blocking until at least one is available.
    fn read_bytes(&mut self, len: usize) -> Result<Bytes>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_all(data)
    }

    fn read_until(&mut self, terminator: &[u8]) -> Result<Bytes> {
        (**self).read_until(terminator)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        (**self).read_bytes(len)
    }
}

/// Buffered [`Transport`] over any blocking `Read + Write` stream.
///
/// Handles partial reads internally. Timeouts are whatever the wrapped
/// stream is configured with.
pub struct StreamTransport<S> {
    inner: S,
    buf: BytesMut,
    max_line: usize,
}

impl<S: Read + Write + Send> StreamTransport<S> {
    /// Wrap a stream with the default maximum reply length.
    pub fn new(inner: S) -> Self {
        Self::with_max_line(inner, DEFAULT_MAX_LINE)
    }

    /// Wrap a stream with an explicit maximum reply length.
    pub fn with_max_line(inner: S, max_line: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_line,
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the transport and return the inner stream.
    ///
    /// Buffered bytes that were not yet handed out are discarded.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Number of received bytes not yet returned to a caller.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    fn fill(&mut self, want: usize) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let want = want.clamp(1, READ_CHUNK_SIZE);
        loop {
            match self.inner.read(&mut chunk[..want]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::from_io(err)),
            }
        }
    }
}

impl<S: Read + Write + Send> Transport for StreamTransport<S> {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < data.len() {
            match self.inner.write(&data[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::from_io(err)),
            }
        }

        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::from_io(err)),
            }
        }
    }

    fn read_until(&mut self, terminator: &[u8]) -> Result<Bytes> {
        if terminator.is_empty() {
            return Err(TransportError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                "empty terminator",
            )));
        }

        let mut searched = 0usize;
        loop {
            if let Some(pos) = find(&self.buf[searched..], terminator) {
                let end = searched + pos + terminator.len();
                return Ok(self.buf.split_to(end).freeze());
            }
            // A terminator may straddle two reads.
            searched = self.buf.len().saturating_sub(terminator.len() - 1);

            if self.buf.len() > self.max_line {
                let len = self.buf.len();
                self.buf.clear();
                return Err(TransportError::Io(std::io::Error::new(
                    ErrorKind::InvalidData,
                    format!("no terminator within {len} bytes"),
                )));
            }

            self.fill(READ_CHUNK_SIZE)?;
        }
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        if len == 0 {
            return Ok(Bytes::new());
        }
        if self.buf.is_empty() {
            self.fill(len)?;
        }
        let n = len.min(self.buf.len());
        Ok(self.buf.split_to(n).freeze())
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

impl<S> std::fmt::Debug for StreamTransport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("buffered", &self.buf.len())
            .field("max_line", &self.max_line)
            .finish()
    }
}
