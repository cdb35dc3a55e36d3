use std::collections::VecDeque;
use std::time::Duration;

use crate::baud::{BaudRate, BaudRateSet};
use crate::error::{Result, TransportError};
use crate::traits::SerialTransport;

enum ScriptedRead {
    Data(Vec<u8>),
    Fail(i32),
}

/// In-memory transport that replays scripted device output.
///
/// Each queued chunk is returned by exactly one `read` call (truncated to the
/// caller's buffer). An empty queue reads as a timeout, matching a silent
/// device.
pub struct ScriptedTransport {
    reads: VecDeque<ScriptedRead>,
    writes: Vec<Vec<u8>>,
    read_calls: usize,
    fail_writes: Option<TransportError>,
    write_limit: Option<usize>,
    supported: BaudRateSet,
    baud_calls: Vec<BaudRate>,
}

impl ScriptedTransport {
    /// A transport supporting 9600 and 115200 baud with nothing queued.
    pub fn new() -> Self {
        Self {
            reads: VecDeque::new(),
            writes: Vec::new(),
            read_calls: 0,
            fail_writes: None,
            write_limit: None,
            supported: [BaudRate::B9600, BaudRate::B115200].into_iter().collect(),
            baud_calls: Vec::new(),
        }
    }

    /// Queue one chunk of device output.
    pub fn push_read(&mut self, chunk: impl AsRef<[u8]>) -> &mut Self {
        self.reads
            .push_back(ScriptedRead::Data(chunk.as_ref().to_vec()));
        self
    }

    /// Queue a complete reply followed by the shell prompt.
    pub fn push_reply(&mut self, text: &str) -> &mut Self {
        self.push_read(format!("{text}\r\nfli-cli>"))
    }

    /// Queue a device-level read failure with the given status code.
    pub fn push_read_failure(&mut self, code: i32) -> &mut Self {
        self.reads.push_back(ScriptedRead::Fail(code));
        self
    }

    /// Accept at most `limit` bytes per write, like a congested port.
    pub fn limit_writes_to(&mut self, limit: usize) -> &mut Self {
        self.write_limit = Some(limit);
        self
    }

    /// Make every following write fail with `err`.
    pub fn fail_writes_with(&mut self, err: TransportError) -> &mut Self {
        self.fail_writes = Some(err);
        self
    }

    pub fn set_supported(&mut self, supported: BaudRateSet) -> &mut Self {
        self.supported = supported;
        self
    }

    /// Every write so far, decoded as text.
    pub fn written_lines(&self) -> Vec<String> {
        self.writes
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    /// Most recent write, decoded as text.
    pub fn last_write(&self) -> Option<String> {
        self.writes
            .last()
            .map(|w| String::from_utf8_lossy(w).into_owned())
    }

    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls
    }

    pub fn pending_reads(&self) -> usize {
        self.reads.len()
    }

    /// Baud rates requested through `set_baud_rate`, in call order.
    pub fn baud_calls(&self) -> &[BaudRate] {
        &self.baud_calls
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialTransport for ScriptedTransport {
    fn write(&mut self, data: &[u8], _timeout: Duration) -> Result<usize> {
        if let Some(err) = &self.fail_writes {
            return Err(clone_error(err));
        }
        let n = self.write_limit.map_or(data.len(), |limit| limit.min(data.len()));
        self.writes.push(data[..n].to_vec());
        Ok(n)
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        self.read_calls += 1;
        match self.reads.pop_front() {
            None => Err(TransportError::Timeout),
            Some(ScriptedRead::Fail(code)) => Err(TransportError::Device { code }),
            Some(ScriptedRead::Data(chunk)) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                Ok(n)
            }
        }
    }

    fn supported_baud_rates(&mut self) -> Result<BaudRateSet> {
        Ok(self.supported)
    }

    fn set_baud_rate(&mut self, rate: BaudRate) -> Result<()> {
        self.baud_calls.push(rate);
        if !self.supported.contains(rate) {
            return Err(TransportError::BaudRateNotSupported(rate));
        }
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "scripted"
    }
}

fn clone_error(err: &TransportError) -> TransportError {
    match err {
        TransportError::Timeout => TransportError::Timeout,
        TransportError::Io(io) => TransportError::Io(std::io::Error::new(io.kind(), io.to_string())),
        TransportError::Device { code } => TransportError::Device { code: *code },
        TransportError::BaudRateNotSupported(rate) => TransportError::BaudRateNotSupported(*rate),
        TransportError::InvalidBaudRate(mask) => TransportError::InvalidBaudRate(*mask),
        TransportError::Open { path, message } => TransportError::Open {
            path: path.clone(),
            message: message.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_millis(10);

    #[test]
    fn empty_queue_reads_as_timeout() {
        let mut transport = ScriptedTransport::new();
        let mut buf = [0u8; 16];
        assert!(matches!(
            transport.read(&mut buf, T),
            Err(TransportError::Timeout)
        ));
        assert_eq!(transport.read_calls(), 1);
    }

    #[test]
    fn chunks_are_returned_one_per_read() {
        let mut transport = ScriptedTransport::new();
        transport.push_read("12").push_read("3.0\r\n");

        let mut buf = [0u8; 16];
        let n = transport.read(&mut buf, T).unwrap();
        assert_eq!(&buf[..n], b"12");
        let n = transport.read(&mut buf, T).unwrap();
        assert_eq!(&buf[..n], b"3.0\r\n");
    }

    #[test]
    fn failing_writes_are_not_recorded() {
        let mut transport = ScriptedTransport::new();
        transport.fail_writes_with(TransportError::Timeout);
        assert!(transport.write(b"fps raw\n", T).unwrap_err().is_timeout());
        assert_eq!(transport.write_count(), 0);
    }

    #[test]
    fn set_baud_rate_records_calls_and_rejects_unsupported() {
        let mut transport = ScriptedTransport::new();
        transport.set_baud_rate(BaudRate::B9600).unwrap();
        assert!(matches!(
            transport.set_baud_rate(BaudRate::B57600),
            Err(TransportError::BaudRateNotSupported(BaudRate::B57600))
        ));
        assert_eq!(
            transport.baud_calls(),
            &[BaudRate::B9600, BaudRate::B57600]
        );
    }
}
