//! Register value codec and command exchange for the C-RED2 text shell.
//!
//! Two halves meet in this crate:
//! - The binary side: 4-byte little-endian integers and floats, and
//!   fixed-size NUL-terminated strings, as a register-map host expects them
//! - The text side: a command line terminated by `\n`, answered by free text
//!   that ends when the `fli-cli>` prompt reappears
//!
//! Callers never touch partial reads or prompt detection.

pub mod codec;
pub mod error;
pub mod exchange;
pub mod prompt;

pub use codec::{
    decode_bounded_string, decode_f32, decode_i32, encode_f32, encode_i32, encode_string,
    WORD_SIZE,
};
pub use error::{FrameError, Result};
pub use exchange::{
    send_command, send_command_await_reply, ChannelConfig, CommandChannel, Reply,
    DEFAULT_READ_CHUNK_SIZE, DEFAULT_RETRY_ATTEMPTS,
};
pub use prompt::{contains_prompt, trim_reply, PROMPT};
