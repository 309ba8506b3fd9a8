//! Synchronous ASCII protocol stack for serial laboratory instruments.
//!
//! Devices in this family take `<tag><fixed-width fields>\r\n` and answer
//! with the same tag echoed, or `E:<code>`. asciilink splits the problem in
//! three layers:
//!
//! - [`transport`]: blocking byte transport, serial port setup and the
//!   process-wide plus cross-process [`Channel`](transport::Channel) lock
//! - [`codec`]: fixed-width integer, enumeration and frame codecs
//! - [`protocol`]: request/response exchanges, commands, JSON command
//!   catalogs and the [`Instrument`](protocol::Instrument) handle
//!
//! ```no_run
//! use std::path::Path;
//!
//! use asciilink::protocol::{CommandRegistry, Instrument};
//! use asciilink::transport::{open_serial_channel, LockConfig, SerialConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let channel = open_serial_channel(&SerialConfig::new("/dev/ttyUSB0"), &LockConfig::default())?;
//! let registry = CommandRegistry::from_file(Path::new("valve.json"))?;
//! let valve = Instrument::with_registry(channel, registry);
//! println!("position = {}", valve.query("position")?);
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use asciilink_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use asciilink_codec::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use asciilink_protocol::*;
}
