use std::time::Duration;

use cred2clp_frame::{
    decode_bounded_string, decode_f32, decode_i32, encode_f32, encode_i32, encode_string,
    ChannelConfig, CommandChannel,
};
use cred2clp_transport::SerialTransport;
use tracing::debug;

use crate::error::{EngineError, Operation, Result};
use crate::registers::{lookup, ReadRule, RegisterDescriptor, WriteRule};
use crate::session::{Selector, SelectorState};
use crate::vocab::{
    choice_index, choice_word, format_float, parse_bool, parse_leading_f32, parse_leading_i32,
};

/// What a successful register write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteEffect {
    /// A command line was sent to the device.
    Sent(String),
    /// A selector value must be stored in the session. No I/O happened.
    StoreSelector(Selector, i32),
}

/// Look up `address` and check that it can be read into `len` bytes.
pub fn resolve_read(address: u64, len: usize) -> Result<(&'static RegisterDescriptor, ReadRule)> {
    let reg = lookup(address).ok_or(EngineError::UnknownRegister(address))?;
    let rule = reg.read.ok_or_else(|| denied(reg, Operation::Read))?;
    check_width(reg, len)?;
    Ok((reg, rule))
}

/// Look up `address` and check that it can be written from `len` bytes.
pub fn resolve_write(
    address: u64,
    len: usize,
) -> Result<(&'static RegisterDescriptor, WriteRule)> {
    let reg = lookup(address).ok_or(EngineError::UnknownRegister(address))?;
    let rule = reg.write.ok_or_else(|| denied(reg, Operation::Write))?;
    check_width(reg, len)?;
    Ok((reg, rule))
}

fn denied(reg: &RegisterDescriptor, operation: Operation) -> EngineError {
    EngineError::AccessDenied {
        address: reg.address,
        name: reg.name,
        access: reg.access().as_str(),
        operation,
    }
}

fn check_width(reg: &RegisterDescriptor, len: usize) -> Result<()> {
    if len < reg.width() {
        return Err(EngineError::BufferTooSmall {
            needed: reg.width(),
            actual: len,
        });
    }
    Ok(())
}

/// Translates register accesses into shell commands.
///
/// The dispatcher holds no session state. Reads and writes see a snapshot of
/// the session's selectors, and selector writes come back as a
/// [`WriteEffect::StoreSelector`] for the caller to commit.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    timeout: Duration,
    channel: ChannelConfig,
}

impl Dispatcher {
    pub fn new(timeout: Duration, channel: ChannelConfig) -> Self {
        Self { timeout, channel }
    }

    /// Read register `address` into the start of `buf`.
    ///
    /// Only the register's width is written; bytes past it are left alone.
    pub fn read<T: SerialTransport + ?Sized>(
        &self,
        selectors: &SelectorState,
        address: u64,
        transport: &mut T,
        buf: &mut [u8],
    ) -> Result<()> {
        let (reg, rule) = resolve_read(address, buf.len())?;
        let out = &mut buf[..reg.width()];

        match rule {
            ReadRule::Selector(selector) => encode_i32(out, selectors.get(selector))?,
            ReadRule::Constant(value) => encode_i32(out, value)?,
            ReadRule::Empty => encode_string(out, "")?,
            ReadRule::Text(cmd) => {
                let text = self.query(transport, cmd)?;
                encode_string(out, &text)?;
            }
            ReadRule::Int(cmd) => {
                let text = self.query(transport, cmd)?;
                let value = parse_leading_i32(&text).ok_or_else(|| {
                    EngineError::decode(cmd, format!("not an integer: {text:?}"))
                })?;
                encode_i32(out, value)?;
            }
            ReadRule::Float(_) | ReadRule::SelectedFloat { .. } => {
                // Both variants always yield a command.
                let cmd = rule.command(selectors).unwrap_or_default();
                let text = self.query(transport, cmd)?;
                let value = parse_leading_f32(&text)
                    .ok_or_else(|| EngineError::decode(cmd, format!("not a number: {text:?}")))?;
                encode_f32(out, value)?;
            }
            ReadRule::Bool(cmd) => {
                let text = self.query(transport, cmd)?;
                let value = parse_bool(&text)
                    .ok_or_else(|| EngineError::decode(cmd, format!("not a boolean: {text:?}")))?;
                encode_i32(out, i32::from(value))?;
            }
            ReadRule::Choice(cmd, words) => {
                let text = self.query(transport, cmd)?;
                let value = choice_index(words, &text).ok_or_else(|| {
                    EngineError::decode(cmd, format!("unknown value {text:?}, expected one of {words:?}"))
                })?;
                encode_i32(out, value)?;
            }
        }

        debug!(address = format_args!("{address:#06x}"), register = reg.name, "register read");
        Ok(())
    }

    /// Write `payload` to register `address`.
    pub fn write<T: SerialTransport + ?Sized>(
        &self,
        selectors: &SelectorState,
        address: u64,
        payload: &[u8],
        transport: &mut T,
    ) -> Result<WriteEffect> {
        let (reg, rule) = resolve_write(address, payload.len())?;
        let payload = &payload[..reg.width()];

        let command = match rule {
            WriteRule::Selector(selector) => {
                let value = decode_i32(payload)?;
                debug!(register = reg.name, ?selector, value, "selector write");
                return Ok(WriteEffect::StoreSelector(selector, value));
            }
            WriteRule::Command(cmd) => cmd.to_string(),
            WriteRule::SelectorCommand(prefix, selector) => {
                format!("{prefix} {}", selectors.get(selector))
            }
            WriteRule::Bool(prefix, spelling) => {
                format!("{prefix} {}", spelling.word(decode_i32(payload)? != 0))
            }
            WriteRule::Int(prefix) => format!("{prefix} {}", decode_i32(payload)?),
            WriteRule::Float(prefix) => {
                format!("{prefix} {}", format_float(decode_f32(payload)?))
            }
            WriteRule::Text(prefix) => format!("{prefix} {}", decode_bounded_string(payload)),
            WriteRule::Choice(prefix, words) => {
                format!("{prefix} {}", choice_word(words, decode_i32(payload)?))
            }
        };

        CommandChannel::with_config(transport, self.timeout, self.channel).send(&command)?;
        debug!(address = format_args!("{address:#06x}"), register = reg.name, "register write");
        Ok(WriteEffect::Sent(command))
    }

    /// Run one command/response exchange and return the non-empty reply.
    fn query<T: SerialTransport + ?Sized>(&self, transport: &mut T, cmd: &str) -> Result<String> {
        let reply = CommandChannel::with_config(transport, self.timeout, self.channel).query(cmd)?;
        if reply.is_empty() {
            if reply.prompt_seen {
                return Err(EngineError::decode(cmd, "empty reply"));
            }
            return Err(EngineError::Timeout(format!("no reply to {cmd:?}")));
        }
        Ok(reply.text)
    }
}
