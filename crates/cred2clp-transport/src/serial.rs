use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use tracing::{debug, info};

use crate::baud::{BaudRate, BaudRateSet};
use crate::error::{Result, TransportError};
use crate::traits::SerialTransport;

/// Local serial port transport backed by the `serialport` crate.
///
/// Used when talking to a camera without a frame grabber in between, e.g.
/// over a Camera Link to USB bridge on a bench.
pub struct SerialPortTransport {
    port: Box<dyn serialport::SerialPort>,
    path: String,
    supported: BaudRateSet,
}

impl SerialPortTransport {
    /// Open `path` at the Camera Link default speed.
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with_rate(path, BaudRate::DEFAULT)
    }

    /// Open `path` at an explicit speed.
    pub fn open_with_rate(path: &str, rate: BaudRate) -> Result<Self> {
        let port = serialport::new(path, rate.bits_per_second())
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|err| TransportError::Open {
                path: path.to_string(),
                message: err.to_string(),
            })?;

        info!(path, %rate, "opened serial port");

        Ok(Self {
            port,
            path: path.to_string(),
            supported: BaudRate::ALL.into_iter().collect(),
        })
    }

    /// Restrict the rates reported as supported (some bridges top out early).
    pub fn with_supported_rates(mut self, supported: BaudRateSet) -> Self {
        self.supported = supported;
        self
    }

    /// The device path this transport was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl SerialTransport for SerialPortTransport {
    fn write(&mut self, data: &[u8], timeout: Duration) -> Result<usize> {
        self.port
            .set_timeout(timeout)
            .map_err(|err| TransportError::Io(err.into()))?;

        let mut offset = 0usize;
        while offset < data.len() {
            match self.port.write(&data[offset..]) {
                Ok(0) => {
                    return Err(TransportError::Io(std::io::Error::new(
                        ErrorKind::WriteZero,
                        "serial port accepted no bytes",
                    )))
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut => {
                    return Err(TransportError::Timeout)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        self.port.flush()?;
        Ok(offset)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        self.port
            .set_timeout(timeout)
            .map_err(|err| TransportError::Io(err.into()))?;

        loop {
            match self.port.read(buf) {
                Ok(0) => return Err(TransportError::Timeout),
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::TimedOut || err.kind() == ErrorKind::WouldBlock =>
                {
                    return Err(TransportError::Timeout)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn supported_baud_rates(&mut self) -> Result<BaudRateSet> {
        Ok(self.supported)
    }

    fn set_baud_rate(&mut self, rate: BaudRate) -> Result<()> {
        if !self.supported.contains(rate) {
            return Err(TransportError::BaudRateNotSupported(rate));
        }
        self.port
            .set_baud_rate(rate.bits_per_second())
            .map_err(|err| TransportError::Io(err.into()))?;
        debug!(path = %self.path, %rate, "changed serial baud rate");
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "serialport"
    }
}

impl std::fmt::Debug for SerialPortTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortTransport")
            .field("path", &self.path)
            .field("supported", &self.supported)
            .finish()
    }
}
