use std::time::Duration;

use crate::baud::{BaudRate, BaudRateSet};
use crate::error::Result;

/// A blocking Camera Link serial line.
///
/// This is the only I/O surface the adapter uses. The owner of the port
/// (the frame grabber host, a local serial device, or a test double) keeps
/// it open; the adapter borrows it for the duration of one call and never
/// retains it.
pub trait SerialTransport {
    /// Write `data` to the line, returning the number of bytes accepted.
    fn write(&mut self, data: &[u8], timeout: Duration) -> Result<usize>;

    /// Read whatever bytes are available into `buf`, waiting up to `timeout`.
    ///
    /// Returns `Err(TransportError::Timeout)` when nothing arrived in time.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Baud rates the port can be switched to.
    fn supported_baud_rates(&mut self) -> Result<BaudRateSet>;

    /// Switch the line speed.
    fn set_baud_rate(&mut self, rate: BaudRate) -> Result<()>;

    /// Short name for diagnostics.
    fn transport_name(&self) -> &'static str {
        "serial"
    }
}

impl<T: SerialTransport + ?Sized> SerialTransport for &mut T {
    fn write(&mut self, data: &[u8], timeout: Duration) -> Result<usize> {
        (**self).write(data, timeout)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        (**self).read(buf, timeout)
    }

    fn supported_baud_rates(&mut self) -> Result<BaudRateSet> {
        (**self).supported_baud_rates()
    }

    fn set_baud_rate(&mut self, rate: BaudRate) -> Result<()> {
        (**self).set_baud_rate(rate)
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}

impl<T: SerialTransport + ?Sized> SerialTransport for Box<T> {
    fn write(&mut self, data: &[u8], timeout: Duration) -> Result<usize> {
        (**self).write(data, timeout)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        (**self).read(buf, timeout)
    }

    fn supported_baud_rates(&mut self) -> Result<BaudRateSet> {
        (**self).supported_baud_rates()
    }

    fn set_baud_rate(&mut self, rate: BaudRate) -> Result<()> {
        (**self).set_baud_rate(rate)
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}
