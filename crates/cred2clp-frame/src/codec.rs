use bytes::{Buf, BufMut};

use crate::error::{FrameError, Result};

/// Width of every numeric and enumerated register.
pub const WORD_SIZE: usize = 4;

fn check_word(buf: &[u8]) -> Result<()> {
    if buf.len() < WORD_SIZE {
        return Err(FrameError::BufferTooSmall {
            needed: WORD_SIZE,
            actual: buf.len(),
        });
    }
    Ok(())
}

/// Write `value` as a little-endian 32-bit signed integer into the first
/// four bytes of `buf`.
pub fn encode_i32(buf: &mut [u8], value: i32) -> Result<()> {
    check_word(buf)?;
    let mut dst = &mut buf[..WORD_SIZE];
    dst.put_i32_le(value);
    Ok(())
}

/// Read a little-endian 32-bit signed integer from the first four bytes of `buf`.
pub fn decode_i32(buf: &[u8]) -> Result<i32> {
    check_word(buf)?;
    let mut src = &buf[..WORD_SIZE];
    Ok(src.get_i32_le())
}

/// Write `value` as little-endian IEEE-754 single precision.
pub fn encode_f32(buf: &mut [u8], value: f32) -> Result<()> {
    check_word(buf)?;
    let mut dst = &mut buf[..WORD_SIZE];
    dst.put_f32_le(value);
    Ok(())
}

/// Read a little-endian IEEE-754 single precision value.
pub fn decode_f32(buf: &[u8]) -> Result<f32> {
    check_word(buf)?;
    let mut src = &buf[..WORD_SIZE];
    Ok(src.get_f32_le())
}

/// Copy `text` into a fixed-size, NUL-terminated register buffer.
///
/// The whole buffer is zero-filled first. At most `buf.len() - 1` bytes of
/// `text` are copied so the result is always terminated.
pub fn encode_string(buf: &mut [u8], text: &str) -> Result<()> {
    if buf.is_empty() {
        return Err(FrameError::BufferTooSmall {
            needed: 1,
            actual: 0,
        });
    }
    buf.fill(0);
    let copy = text.len().min(buf.len() - 1);
    buf[..copy].copy_from_slice(&text.as_bytes()[..copy]);
    Ok(())
}

/// Read a string stored in a register buffer: everything before the first
/// NUL, or the whole buffer when there is none. Invalid UTF-8 is replaced.
pub fn decode_bounded_string(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}
