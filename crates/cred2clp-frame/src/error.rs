use cred2clp_transport::TransportError;

/// Errors that can occur while encoding register values or exchanging commands.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The caller's buffer cannot hold the encoded value.
    #[error("buffer too small ({actual} bytes, need {needed})")]
    BufferTooSmall { needed: usize, actual: usize },

    /// The command text cannot be sent as a single shell line.
    #[error("invalid command text: {0}")]
    InvalidCommand(String),

    /// The transport accepted only part of the command line.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },

    /// The transport failed while sending or receiving.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl FrameError {
    /// True when the underlying failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FrameError::Transport(err) if err.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
