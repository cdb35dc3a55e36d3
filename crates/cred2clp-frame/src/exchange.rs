use std::time::Duration;

use bytes::BytesMut;
use cred2clp_transport::SerialTransport;
use tracing::{debug, trace, warn};

use crate::error::{FrameError, Result};
use crate::prompt::{contains_prompt, trim_reply};

/// Default number of read attempts per exchange.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 32;

/// Default size of a single transport read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 256;

/// Tuning for the command/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Maximum number of reads while waiting for the prompt.
    pub retry_attempts: u32,
    /// Bytes requested per read.
    pub read_chunk_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

/// The trimmed text of one shell reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply body without the prompt and surrounding whitespace.
    pub text: String,
    /// Whether the prompt was seen before the read budget ran out.
    pub prompt_seen: bool,
}

impl Reply {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One command/response exchange partner over a borrowed transport.
///
/// Nothing is retained between exchanges: each call performs exactly one
/// write, and `query` then reads until the prompt or the read budget is spent.
pub struct CommandChannel<'a, T: SerialTransport + ?Sized> {
    transport: &'a mut T,
    timeout: Duration,
    config: ChannelConfig,
}

impl<'a, T: SerialTransport + ?Sized> CommandChannel<'a, T> {
    /// Create a channel with the default configuration.
    pub fn new(transport: &'a mut T, timeout: Duration) -> Self {
        Self::with_config(transport, timeout, ChannelConfig::default())
    }

    /// Create a channel with explicit configuration.
    pub fn with_config(transport: &'a mut T, timeout: Duration, config: ChannelConfig) -> Self {
        Self {
            transport,
            timeout,
            config,
        }
    }

    /// Send `command` followed by a newline, without waiting for a reply.
    pub fn send(&mut self, command: &str) -> Result<()> {
        if command.contains(['\r', '\n']) {
            return Err(FrameError::InvalidCommand(command.escape_debug().to_string()));
        }
        let mut line = Vec::with_capacity(command.len() + 1);
        line.extend_from_slice(command.as_bytes());
        line.push(b'\n');

        debug!(
            transport = self.transport.transport_name(),
            command, "sending shell command"
        );
        let written = self.transport.write(&line, self.timeout)?;
        if written != line.len() {
            return Err(FrameError::ShortWrite {
                written,
                expected: line.len(),
            });
        }
        Ok(())
    }

    /// Send `command` and collect the reply up to the prompt.
    ///
    /// A read timeout only consumes one attempt. Any other transport error
    /// ends the exchange immediately.
    pub fn query(&mut self, command: &str) -> Result<Reply> {
        self.send(command)?;

        let mut acc = BytesMut::with_capacity(self.config.read_chunk_size);
        let mut chunk = vec![0u8; self.config.read_chunk_size.max(1)];
        let mut prompt_seen = false;

        for attempt in 0..self.config.retry_attempts {
            match self.transport.read(&mut chunk, self.timeout) {
                Ok(n) => {
                    acc.extend_from_slice(&chunk[..n]);
                    if contains_prompt(&acc) {
                        prompt_seen = true;
                        break;
                    }
                }
                Err(err) if err.is_timeout() => {
                    trace!(command, attempt, "read timed out waiting for prompt");
                }
                Err(err) => return Err(FrameError::Transport(err)),
            }
        }

        let text = trim_reply(&acc);
        if !prompt_seen {
            warn!(
                command,
                attempts = self.config.retry_attempts,
                received = acc.len(),
                "prompt not seen before read budget ran out"
            );
        }
        debug!(command, reply = %text, prompt_seen, "received shell reply");

        Ok(Reply { text, prompt_seen })
    }

    /// Current channel configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }
}

/// Send a command line that expects no reply.
pub fn send_command<T: SerialTransport + ?Sized>(
    transport: &mut T,
    command: &str,
    timeout: Duration,
) -> Result<()> {
    CommandChannel::new(transport, timeout).send(command)
}

/// Send a command line and wait for the prompt-terminated reply.
pub fn send_command_await_reply<T: SerialTransport + ?Sized>(
    transport: &mut T,
    command: &str,
    timeout: Duration,
) -> Result<Reply> {
    CommandChannel::new(transport, timeout).query(command)
}

#[cfg(test)]
mod tests {
    use cred2clp_transport::{ScriptedTransport, TransportError};

    use super::*;

    const T: Duration = Duration::from_millis(5);

    #[test]
    fn send_appends_newline_in_one_write() {
        let mut transport = ScriptedTransport::new();
        send_command(&mut transport, "save", T).unwrap();
        assert_eq!(transport.written_lines(), vec!["save\n".to_string()]);
        assert_eq!(transport.read_calls(), 0);
    }

    #[test]
    fn send_rejects_embedded_newline() {
        let mut transport = ScriptedTransport::new();
        let err = send_command(&mut transport, "set password a\nshutdown", T).unwrap_err();
        assert!(matches!(err, FrameError::InvalidCommand(_)));
        assert_eq!(transport.write_count(), 0);
    }

    #[test]
    fn query_accumulates_chunks_until_prompt() {
        let mut transport = ScriptedTransport::new();
        transport
            .push_read("60")
            .push_read("0.0\r\n")
            .push_read("fli-cli>")
            .push_read("never read");

        let reply = send_command_await_reply(&mut transport, "fps raw", T).unwrap();
        assert_eq!(reply.text, "600.0");
        assert!(reply.prompt_seen);
        assert_eq!(transport.read_calls(), 3);
        assert_eq!(transport.pending_reads(), 1);
        assert_eq!(transport.last_write().as_deref(), Some("fps raw\n"));
    }

    #[test]
    fn timeouts_are_poll_iterations() {
        let mut transport = ScriptedTransport::new();
        // Nothing queued: every read times out.
        let reply = send_command_await_reply(&mut transport, "tint raw", T).unwrap();
        assert!(reply.is_empty());
        assert!(!reply.prompt_seen);
        assert_eq!(transport.read_calls(), DEFAULT_RETRY_ATTEMPTS as usize);
    }

    #[test]
    fn partial_reply_without_prompt_is_kept() {
        let mut transport = ScriptedTransport::new();
        transport.push_read("12.5\r\n");
        let reply = send_command_await_reply(&mut transport, "tint raw", T).unwrap();
        assert_eq!(reply.text, "12.5");
        assert!(!reply.prompt_seen);
    }

    #[test]
    fn transport_error_aborts_exchange() {
        let mut transport = ScriptedTransport::new();
        transport.push_read("1").push_read_failure(-7).push_reply("2");
        let err = send_command_await_reply(&mut transport, "led raw", T).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::Device { code: -7 })
        ));
        assert_eq!(transport.read_calls(), 2);
    }

    #[test]
    fn short_write_is_an_error() {
        let mut transport = ScriptedTransport::new();
        transport.limit_writes_to(3);
        let err = send_command_await_reply(&mut transport, "fps raw", T).unwrap_err();
        assert!(matches!(
            err,
            FrameError::ShortWrite {
                written: 3,
                expected: 8
            }
        ));
        assert_eq!(transport.read_calls(), 0);
    }

    #[test]
    fn write_timeout_is_reported_as_timeout() {
        let mut transport = ScriptedTransport::new();
        transport.fail_writes_with(TransportError::Timeout);
        let err = send_command_await_reply(&mut transport, "fps raw", T).unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(transport.read_calls(), 0);
    }

    #[test]
    fn retry_budget_is_configurable() {
        let mut transport = ScriptedTransport::new();
        let config = ChannelConfig {
            retry_attempts: 3,
            read_chunk_size: 4,
        };
        transport.push_read("abcdefgh");
        let reply = CommandChannel::with_config(&mut transport, T, config)
            .query("status raw")
            .unwrap();
        // The scripted chunk is truncated to the configured read size.
        assert_eq!(reply.text, "abcd");
        assert_eq!(transport.read_calls(), 3);
    }
}
