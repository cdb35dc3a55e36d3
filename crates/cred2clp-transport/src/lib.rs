//! Camera Link serial transport abstraction.
//!
//! Provides a unified interface over the places a C-RED2 shell can be reached:
//! - The frame grabber's `ISerial` object handed in by a CLProtocol host
//! - A local serial port (`serial` feature)
//! - A scripted in-memory double for tests (`testing` feature)
//!
//! This is the lowest layer of cred2clp. Everything else builds on top of
//! the [`SerialTransport`] trait provided here.

pub mod baud;
pub mod error;
pub mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod scripted;
#[cfg(feature = "serial")]
pub mod serial;

pub use baud::{BaudRate, BaudRateSet};
pub use error::{Result, TransportError};
pub use traits::SerialTransport;

#[cfg(any(test, feature = "testing"))]
pub use scripted::ScriptedTransport;
#[cfg(feature = "serial")]
pub use serial::SerialPortTransport;
