use asciilink_codec::Value;
use asciilink_transport::{Channel, Transport};

use crate::command::Command;
use crate::error::Result;
use crate::registry::CommandRegistry;
use crate::transaction::TransactionProtocol;

/// A device reached over one [`Channel`], addressed by command name.
///
/// `Instrument` is `Sync` whenever the transport is `Send`; share it behind
/// an `Arc` to issue commands from several threads.
#[derive(Debug)]
pub struct Instrument<T> {
    channel: Channel<T>,
    protocol: TransactionProtocol,
    registry: CommandRegistry,
}

impl<T: Transport> Instrument<T> {
    pub fn new(channel: Channel<T>) -> Self {
        Self::with_registry(channel, CommandRegistry::new())
    }

    pub fn with_registry(channel: Channel<T>, registry: CommandRegistry) -> Self {
        Self {
            channel,
            protocol: TransactionProtocol::new(),
            registry,
        }
    }

    pub fn with_protocol(mut self, protocol: TransactionProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn register(&mut self, name: impl Into<String>, command: Command) -> Result<()> {
        self.registry.register(name, command)
    }

    /// Query the named command and decode its reply.
    pub fn query(&self, name: &str) -> Result<Value> {
        self.registry
            .get(name)?
            .query(&self.channel, &self.protocol)
    }

    /// Encode `value` and write it with the named command.
    pub fn write(&self, name: &str, value: &Value) -> Result<()> {
        self.registry
            .get(name)?
            .write(&self.channel, &self.protocol, value)
    }

    /// Query an unregistered tag and return the raw reply tokens.
    pub fn query_raw(&self, tag: &str, payload: &[&str]) -> Result<Vec<String>> {
        self.protocol.query(&self.channel, tag, payload)
    }

    /// Write an unregistered tag with preformatted payload fragments.
    pub fn write_raw(&self, tag: &str, payload: &[&str]) -> Result<()> {
        self.protocol.write(&self.channel, tag, payload)
    }

    /// Discard stale input. Returns the number of chunks discarded.
    pub fn clear(&self) -> Result<usize> {
        self.protocol.clear(&self.channel)
    }

    pub fn channel(&self) -> &Channel<T> {
        &self.channel
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn protocol(&self) -> &TransactionProtocol {
        &self.protocol
    }

    pub fn into_channel(self) -> Channel<T> {
        self.channel
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use asciilink_codec::{Body, FieldCodec};
    use asciilink_transport::{Result as TransportResult, TransportError};
    use bytes::Bytes;

    use super::*;
    use crate::error::ProtocolError;

    #[derive(Default)]
    struct Device {
        replies: VecDeque<&'static [u8]>,
        written: Vec<String>,
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

        fn read_bytes(&mut self, _len: usize) -> TransportResult<Bytes> {
            self.read_until(b"")
        }
    }

    fn instrument(replies: &[&'static [u8]]) -> Instrument<Device> {
        let device = Device {
            replies: replies.iter().copied().collect(),
            ..Device::default()
        };
        let mut instrument = Instrument::new(Channel::new(device));
        let position = Command::new(Some("A:"), Some("R:"), FieldCodec::integer(6).unwrap().into());
        instrument.register("position", position.unwrap()).unwrap();
        instrument
    }

    #[test]
    fn named_query_and_write() {
        let instrument = instrument(&[b"A:000500\r\n", b"R:\r\n"]);
        assert_eq!(instrument.query("position").unwrap(), Value::Int(500));
        instrument.write("position", &Value::Int(750)).unwrap();

        let device = instrument.into_channel().into_inner();
        assert_eq!(device.written, vec!["A:\r\n", "R:000750\r\n"]);
    }

    #[test]
    fn unknown_name_fails_without_io() {
        let instrument = instrument(&[]);
        assert!(matches!(
            instrument.query("pressure"),
            Err(ProtocolError::UnknownCommand(_))
        ));
        assert!(instrument.into_channel().into_inner().written.is_empty());
    }

    #[test]
    fn raw_exchanges_bypass_registry() {
        let instrument = instrument(&[b"i:83 VAT590\r\n", b"O:\r\n", b"junk"]);
        assert_eq!(instrument.query_raw("i:83", &[]).unwrap(), vec!["VAT590"]);
        instrument.write_raw("O:", &[]).unwrap();
        assert_eq!(instrument.clear().unwrap(), 1);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut instrument = instrument(&[]);
        let err = instrument
            .register("position", Command::write_only("R:", Body::raw()).unwrap())
            .unwrap_err();
        assert!(matches!(err, ProtocolError::DuplicateCommand(_)));
        assert_eq!(instrument.registry().len(), 1);
    }
}
