//! Blocking transport layer for ASCII instruments.
//!
//! Provides the byte-level contract the protocol layer relies on:
//! - [`Transport`]: write, read-until-terminator, read-chunk, with a
//!   distinguishable timeout
//! - [`StreamTransport`]: buffered implementation over any `Read + Write`
//!   (serial ports in production, scripted doubles in tests)
//! - [`Channel`]: exclusive access to one shared device, guarded in-process
//!   by a mutex and across processes by an advisory [`FileLock`]
//!
//! This is the lowest layer of asciilink. Everything else builds on the
//! [`Session`] guard handed out by [`Channel::acquire`].

pub mod channel;
pub mod error;
pub mod lock;
pub mod serial;
pub mod traits;

pub use channel::{Channel, LockConfig, Session};
pub use error::{Result, TransportError};
pub use lock::{FileLock, FileLockGuard};
pub use serial::{
    open_serial, open_serial_channel, DataBits, Parity, SerialConfig, SerialTransport, StopBits,
};
pub use traits::{StreamTransport, Transport};
