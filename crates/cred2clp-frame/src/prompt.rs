//! Prompt-delimited reply framing.
//!
//! The camera shell has no length prefix or terminator of its own: a reply is
//! everything the device printed before it showed the prompt again.

/// The shell prompt that ends every reply.
pub const PROMPT: &[u8] = b"fli-cli>";

/// True if `data` contains the prompt anywhere.
pub fn contains_prompt(data: &[u8]) -> bool {
    find_prompt(data).is_some()
}

/// Offset of the first prompt in `data`.
pub fn find_prompt(data: &[u8]) -> Option<usize> {
    data.windows(PROMPT.len()).position(|w| w == PROMPT)
}

/// Cut `data` at the first prompt and strip CR, LF, space and tab from both
/// ends of what remains.
pub fn trim_reply(data: &[u8]) -> String {
    let body = match find_prompt(data) {
        Some(at) => &data[..at],
        None => data,
    };
    let is_pad = |b: &u8| matches!(b, b'\r' | b'\n' | b' ' | b'\t');
    let start = body.iter().position(|b| !is_pad(b)).unwrap_or(body.len());
    let end = body
        .iter()
        .rposition(|b| !is_pad(b))
        .map_or(start, |idx| idx + 1);
    String::from_utf8_lossy(&body[start..end]).into_owned()
}
