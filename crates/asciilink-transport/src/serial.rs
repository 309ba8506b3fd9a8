use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::channel::{Channel, LockConfig};
use crate::error::{Result, TransportError};
use crate::traits::StreamTransport;

/// Transport over an opened serial port.
pub type SerialTransport = StreamTransport<Box<dyn serialport::SerialPort>>;

/// Character size on the serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    One,
    Two,
}

/// Serial line parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub path: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// Per-call read/write timeout in milliseconds.
    pub timeout_ms: u64,
}

impl SerialConfig {
    /// Default line settings for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Per-call timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            baud_rate: 9600,
            data_bits: DataBits::Seven,
            parity: Parity::Even,
            stop_bits: StopBits::One,
            timeout_ms: 200,
        }
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Open a serial port with the given line settings.
pub fn open_serial(config: &SerialConfig) -> Result<SerialTransport> {
    let port = serialport::new(&config.path, config.baud_rate)
        .data_bits(config.data_bits.into())
        .parity(config.parity.into())
        .stop_bits(config.stop_bits.into())
        .flow_control(serialport::FlowControl::None)
        .timeout(config.timeout())
        .open()
        .map_err(|source| TransportError::Open {
            path: config.path.clone(),
            source,
        })?;

    info!(
        path = %config.path,
        baud_rate = config.baud_rate,
        timeout_ms = config.timeout_ms,
        "opened serial port"
    );
    Ok(StreamTransport::new(port))
}

/// Open a serial port and guard it with a lock file derived from its path.
pub fn open_serial_channel(
    config: &SerialConfig,
    lock_config: &LockConfig,
) -> Result<Channel<SerialTransport>> {
    let transport = open_serial(config)?;
    Channel::for_device(transport, &config.path, lock_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_common_instrument_line_settings() {
        let config = SerialConfig::new("/dev/ttyUSB5");
        assert_eq!(config.path, "/dev/ttyUSB5");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.data_bits, DataBits::Seven);
        assert_eq!(config.parity, Parity::Even);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.timeout(), Duration::from_millis(200));
    }

    #[test]
    fn config_deserializes_with_defaults_for_missing_fields() {
        let config: SerialConfig =
            serde_json::from_str(r#"{"path":"/dev/ttyS0","parity":"none","data_bits":"eight"}"#)
                .unwrap();
        assert_eq!(config.path, "/dev/ttyS0");
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.baud_rate, 9600);
    }

    #[test]
    fn line_settings_map_onto_serialport() {
        assert_eq!(
            serialport::Parity::from(Parity::Even),
            serialport::Parity::Even
        );
        assert_eq!(
            serialport::DataBits::from(DataBits::Seven),
            serialport::DataBits::Seven
        );
        assert_eq!(
            serialport::StopBits::from(StopBits::Two),
            serialport::StopBits::Two
        );
    }

    #[test]
    fn opening_missing_device_reports_path() {
        let config = SerialConfig::new("/dev/asciilink-does-not-exist");
        let err = open_serial(&config).unwrap_err();
        match err {
            TransportError::Open { path, .. } => assert_eq!(path, "/dev/asciilink-does-not-exist"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
