use asciilink_codec::{Body, Value};
use asciilink_transport::{Channel, Transport};

use crate::error::{ProtocolError, Result};
use crate::transaction::TransactionProtocol;

/// A device command: optional query and write tags plus the payload codec
/// both directions share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    query_tag: Option<String>,
    write_tag: Option<String>,
    body: Body,
}

impl Command {
    /// Build a command. At least one tag must be given; tags must be
    /// non-empty ASCII without whitespace.
    pub fn new(query_tag: Option<&str>, write_tag: Option<&str>, body: Body) -> Result<Self> {
        if query_tag.is_none() && write_tag.is_none() {
            return Err(ProtocolError::InvalidCommand(
                "command needs a query tag or a write tag".to_string(),
            ));
        }
        for tag in query_tag.iter().chain(write_tag.iter()) {
            validate_tag(tag)?;
        }

        Ok(Self {
            query_tag: query_tag.map(str::to_string),
            write_tag: write_tag.map(str::to_string),
            body,
        })
    }

    pub fn query_only(tag: &str, body: Body) -> Result<Self> {
        Self::new(Some(tag), None, body)
    }

    pub fn write_only(tag: &str, body: Body) -> Result<Self> {
        Self::new(None, Some(tag), body)
    }

    /// A command whose query and write forms share one tag.
    pub fn read_write(tag: &str, body: Body) -> Result<Self> {
        Self::new(Some(tag), Some(tag), body)
    }

    pub fn query_tag(&self) -> Option<&str> {
        self.query_tag.as_deref()
    }

    pub fn write_tag(&self) -> Option<&str> {
        self.write_tag.as_deref()
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Send the query tag and decode the reply payload.
    pub fn query<T: Transport>(
        &self,
        channel: &Channel<T>,
        protocol: &TransactionProtocol,
    ) -> Result<Value> {
        let tag = self
            .query_tag
            .as_deref()
            .ok_or_else(|| self.unsupported("query"))?;
        let tokens = protocol.query(channel, tag, &[])?;
        Ok(self.body.decode_tokens(&tokens)?)
    }

    /// Encode `value` and send it after the write tag.
    ///
    /// Encoding happens before the channel is touched, so an invalid value
    /// never reaches the device.
    pub fn write<T: Transport>(
        &self,
        channel: &Channel<T>,
        protocol: &TransactionProtocol,
        value: &Value,
    ) -> Result<()> {
        let tag = self
            .write_tag
            .as_deref()
            .ok_or_else(|| self.unsupported("write"))?;
        let payload = self.body.encode(value)?;
        protocol.write(channel, tag, &[payload.as_str()])
    }

    fn unsupported(&self, operation: &'static str) -> ProtocolError {
        let command = self
            .query_tag
            .as_deref()
            .or(self.write_tag.as_deref())
            .unwrap_or_default()
            .to_string();
        ProtocolError::UnsupportedOperation { command, operation }
    }
}

fn validate_tag(tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(ProtocolError::InvalidCommand("empty tag".to_string()));
    }
    if !tag.is_ascii() || tag.contains(char::is_whitespace) {
        return Err(ProtocolError::InvalidCommand(format!(
            "tag {tag:?} must be printable ASCII"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use asciilink_codec::{CodecError, FieldCodec, FieldSpec, FrameCodec};
    use asciilink_transport::{Result as TransportResult, TransportError};
    use bytes::Bytes;

    use super::*;

    #[derive(Default)]
    struct Device {
        replies: VecDeque<&'static [u8]>,
        written: Vec<String>,
    }

    impl Device {
        fn replying(replies: &[&'static [u8]]) -> Self {
            Self {
                replies: replies.iter().copied().collect(),
                ..Self::default()
            }
        }
    }

    impl Transport for Device {
        fn write_all(&mut self, data: &[u8]) -> TransportResult<()> {
            self.written.push(String::from_utf8_lossy(data).into_owned());
            Ok(())
        }

        fn read_until(&mut self, _terminator: &[u8]) -> TransportResult<Bytes> {
            self.replies
                .pop_front()
                .map(Bytes::from_static)
                .ok_or(TransportError::Timeout)
        }

        fn read_bytes(&mut self, len: usize) -> TransportResult<Bytes> {
            self.read_until(&[]).map(|b| b.slice(..len.min(b.len())))
        }
    }

    fn access_mode() -> Body {
        FieldCodec::enumeration(1, [("local", "0"), ("remote", "1"), ("locked", "2")])
            .unwrap()
            .into()
    }

    #[test]
    fn requires_at_least_one_tag() {
        assert!(matches!(
            Command::new(None, None, Body::raw()),
            Err(ProtocolError::InvalidCommand(_))
        ));
        assert!(matches!(
            Command::query_only("", Body::raw()),
            Err(ProtocolError::InvalidCommand(_))
        ));
        assert!(matches!(
            Command::write_only("R:\r\n", Body::raw()),
            Err(ProtocolError::InvalidCommand(_))
        ));
    }

    #[test]
    fn query_decodes_enumeration() {
        let channel = Channel::new(Device::replying(&[b"c:011\r\n"]));
        let command = Command::read_write("c:01", access_mode()).unwrap();

        let value = command.query(&channel, &TransactionProtocol::new()).unwrap();
        assert_eq!(value, Value::from("remote"));
        assert_eq!(channel.into_inner().written, vec!["c:01\r\n"]);
    }

    #[test]
    fn write_encodes_frame() {
        let body: Body = FrameCodec::new([
            FieldSpec::new(2, FieldCodec::integer(2).unwrap()),
            FieldSpec::raw(3),
        ])
        .unwrap()
        .into();
        let command = Command::write_only("s:04", body).unwrap();
        let channel = Channel::new(Device::replying(&[b"s:04\r\n"]));

        command
            .write(
                &channel,
                &TransactionProtocol::new(),
                &Value::from(vec![Value::Int(7), Value::from("abc")]),
            )
            .unwrap();
        assert_eq!(channel.into_inner().written, vec!["s:0407abc\r\n"]);
    }

    #[test]
    fn missing_direction_is_unsupported() {
        let channel = Channel::new(Device::default());
        let protocol = TransactionProtocol::new();

        let query_only = Command::query_only("i:83", Body::raw()).unwrap();
        let err = query_only
            .write(&channel, &protocol, &Value::from("x"))
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnsupportedOperation {
                ref command,
                operation: "write"
            } if command == "i:83"
        ));

        let write_only = Command::write_only("C:", Body::raw()).unwrap();
        let err = write_only.query(&channel, &protocol).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnsupportedOperation {
                operation: "query",
                ..
            }
        ));
        assert!(channel.into_inner().written.is_empty());
    }

    #[test]
    fn invalid_value_never_reaches_device() {
        let command = Command::read_write("c:01", access_mode()).unwrap();
        let channel = Channel::new(Device::default());

        let err = command
            .write(&channel, &TransactionProtocol::new(), &Value::from("offline"))
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Codec(CodecError::UnknownLabel { .. })
        ));
        assert!(channel.into_inner().written.is_empty());
    }

    #[test]
    fn unknown_reply_code_is_a_codec_error() {
        let command = Command::read_write("c:01", access_mode()).unwrap();
        let channel = Channel::new(Device::replying(&[b"c:019\r\n"]));

        let err = command
            .query(&channel, &TransactionProtocol::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Codec(CodecError::UnknownCode { .. })
        ));
    }
}
