//! Typed register values for callers that work with text, like the CLI.

use std::fmt;

use cred2clp_frame::{
    decode_bounded_string, decode_f32, decode_i32, encode_f32, encode_i32, encode_string,
};
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::registers::{ReadRule, RegisterDescriptor, RegisterKind, WriteRule};
use crate::vocab::{choice_index, parse_bool};

/// A register value decoded according to its register's kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RegisterValue {
    Int(i32),
    Float(f32),
    Text(String),
}

impl RegisterValue {
    /// Decode the first `reg.width()` bytes of `buf`.
    pub fn decode(reg: &RegisterDescriptor, buf: &[u8]) -> Result<Self> {
        let value = match reg.kind {
            RegisterKind::Int32 | RegisterKind::Enum => RegisterValue::Int(decode_i32(buf)?),
            RegisterKind::Float32 => RegisterValue::Float(decode_f32(buf)?),
            RegisterKind::String(len) => {
                RegisterValue::Text(decode_bounded_string(&buf[..len.min(buf.len())]))
            }
        };
        Ok(value)
    }

    /// Parse user text for a write to `reg`.
    ///
    /// Integers accept decimal or `0x` hex. Boolean registers also accept
    /// `on`/`off`, `enable`/`disable` and `true`/`false`; enumerated ones
    /// accept their vocabulary words.
    pub fn parse(reg: &RegisterDescriptor, text: &str) -> Result<Self> {
        let text = text.trim();
        let invalid = || {
            EngineError::InvalidArgument(format!(
                "{text:?} is not a valid {} value for {}",
                reg.kind, reg.name
            ))
        };

        match reg.kind {
            RegisterKind::String(_) => Ok(RegisterValue::Text(text.to_string())),
            RegisterKind::Float32 => text
                .parse::<f32>()
                .map(RegisterValue::Float)
                .map_err(|_| invalid()),
            RegisterKind::Int32 | RegisterKind::Enum => {
                if let Some(value) = parse_int(text) {
                    return Ok(RegisterValue::Int(value));
                }
                word_value(reg, text)
                    .map(RegisterValue::Int)
                    .ok_or_else(invalid)
            }
        }
    }

    /// Encode into a buffer exactly as wide as `reg`.
    pub fn encode(&self, reg: &RegisterDescriptor) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; reg.width()];
        match (self, reg.kind) {
            (RegisterValue::Int(v), RegisterKind::Int32 | RegisterKind::Enum) => {
                encode_i32(&mut buf, *v)?
            }
            (RegisterValue::Float(v), RegisterKind::Float32) => encode_f32(&mut buf, *v)?,
            (RegisterValue::Text(text), RegisterKind::String(_)) => encode_string(&mut buf, text)?,
            _ => {
                return Err(EngineError::InvalidArgument(format!(
                    "{self} does not fit {} register {}",
                    reg.kind, reg.name
                )))
            }
        }
        Ok(buf)
    }
}

impl fmt::Display for RegisterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterValue::Int(v) => write!(f, "{v}"),
            RegisterValue::Float(v) => write!(f, "{v}"),
            RegisterValue::Text(text) => f.write_str(text),
        }
    }
}

fn parse_int(text: &str) -> Option<i32> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    i32::try_from(if negative { -magnitude } else { magnitude }).ok()
}

fn word_value(reg: &RegisterDescriptor, text: &str) -> Option<i32> {
    if let Some(WriteRule::Choice(_, words)) = reg.write {
        return choice_index(words, text);
    }
    if let Some(ReadRule::Choice(_, words)) = reg.read {
        return choice_index(words, text);
    }
    let is_bool = matches!(reg.write, Some(WriteRule::Bool(..)))
        || matches!(reg.read, Some(ReadRule::Bool(_)));
    if !is_bool {
        return None;
    }
    match text.to_ascii_lowercase().as_str() {
        "true" => Some(1),
        "false" => Some(0),
        word => parse_bool(word).map(i32::from),
    }
}
