use asciilink_transport::{Channel, Transport};
use bytes::BytesMut;
use tracing::{debug, error, trace, warn};

use crate::device_error::describe_device_error;
use crate::error::{ProtocolError, Result};
use crate::message::{decode_line, encode_message, parse_response, ERROR_MARKER, TERMINATOR};

/// Tuning for [`TransactionProtocol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Bytes requested per read while clearing stale input.
    pub clear_chunk_size: usize,
    /// Chunks `clear` may discard before giving up on a device that never
    /// goes quiet.
    pub max_clear_chunks: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            clear_chunk_size: 25,
            max_clear_chunks: 4096,
        }
    }
}

/// Strictly synchronous request/response exchanges over a [`Channel`].
///
/// Holds no state between calls. Every operation acquires the channel for
/// its whole duration and releases it on every exit path.
#[derive(Debug, Clone, Default)]
pub struct TransactionProtocol {
    config: ProtocolConfig,
}

impl TransactionProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProtocolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Write raw bytes to the device.
    pub fn send<T: Transport + ?Sized>(&self, transport: &mut T, message: &[u8]) -> Result<()> {
        debug!(message = ?String::from_utf8_lossy(message), "sending");
        transport
            .write_all(message)
            .map_err(ProtocolError::communication("send message"))
    }

    /// Read one terminated reply and return it without the terminator.
    pub fn receive<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<String> {
        let line = transport
            .read_until(TERMINATOR)
            .map_err(ProtocolError::communication("read response"))?;
        let reply = decode_line(&line)?;
        debug!(response = ?reply, "received");
        Ok(reply.to_string())
    }

    /// Send `tag` + `payload` and return the tokens of the matching reply.
    pub fn query<T: Transport>(
        &self,
        channel: &Channel<T>,
        tag: &str,
        payload: &[&str],
    ) -> Result<Vec<String>> {
        let mut session = channel
            .acquire()
            .map_err(ProtocolError::communication("acquire channel"))?;
        let reply = self.exchange(&mut *session, tag, payload)?;
        parse_response(&reply, tag)
    }

    /// Send `tag` + `payload` and consume the reply without failing on it.
    ///
    /// The device acknowledges a write by echoing the tag. Some firmware
    /// adds data to that echo although none is expected. Extra data, a
    /// foreign header and device errors are logged and the call still
    /// succeeds.
    pub fn write<T: Transport>(
        &self,
        channel: &Channel<T>,
        tag: &str,
        payload: &[&str],
    ) -> Result<()> {
        let mut session = channel
            .acquire()
            .map_err(ProtocolError::communication("acquire channel"))?;
        let reply = self.exchange(&mut *session, tag, payload)?;
        drop(session);

        match WriteReply::classify(&reply, tag) {
            WriteReply::Ack => {}
            WriteReply::Rejected(code) => error!(
                tag,
                code,
                message = describe_device_error(code).unwrap_or("unknown error code"),
                "device rejected write"
            ),
            WriteReply::Unexpected => {
                warn!(tag, response = ?reply, "unexpected response data to write")
            }
        }
        Ok(())
    }

    /// Discard whatever is pending on the channel.
    ///
    /// Reads fixed-size chunks until a read times out, which is the normal
    /// way this returns. Returns the number of chunks discarded.
    pub fn clear<T: Transport>(&self, channel: &Channel<T>) -> Result<usize> {
        let mut session = channel
            .acquire()
            .map_err(ProtocolError::communication("acquire channel"))?;

        let mut chunks = 0usize;
        loop {
            match session.read_bytes(self.config.clear_chunk_size) {
                Ok(chunk) => {
                    trace!(chunk = ?String::from_utf8_lossy(&chunk), "discarded");
                    chunks += 1;
                    if chunks >= self.config.max_clear_chunks {
                        return Err(ProtocolError::ClearLimitExceeded { chunks });
                    }
                }
                Err(err) if err.is_timeout() => {
                    debug!(chunks, "channel cleared");
                    return Ok(chunks);
                }
                Err(err) => {
                    return Err(ProtocolError::Communication {
                        context: "clear channel",
                        source: err,
                    })
                }
            }
        }
    }

    fn exchange<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        tag: &str,
        payload: &[&str],
    ) -> Result<String> {
        let mut message = BytesMut::new();
        encode_message(tag, payload, &mut message)?;
        self.send(transport, &message)?;
        self.receive(transport)
    }
}

/// How a write reply is reported.
#[derive(Debug, PartialEq, Eq)]
enum WriteReply<'a> {
    /// Bare tag echo, or nothing at all.
    Ack,
    /// `E:` reply, carrying the code.
    Rejected(&'a str),
    /// Payload after the echo, or a header other than the tag.
    Unexpected,
}

impl<'a> WriteReply<'a> {
    fn classify(reply: &'a str, tag: &str) -> Self {
        if let Some(code) = reply.strip_prefix(ERROR_MARKER) {
            return WriteReply::Rejected(code);
        }
        if reply.trim().is_empty() {
            return WriteReply::Ack;
        }
        match reply.strip_prefix(tag) {
            Some(rest) if rest.trim().is_empty() => WriteReply::Ack,
            _ => WriteReply::Unexpected,
        }
    }
}
