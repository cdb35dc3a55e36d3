use crate::baud::BaudRate;

/// Errors that can occur in serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The operation did not complete within the requested timeout.
    ///
    /// For reads this is an ordinary poll outcome, not a fault.
    #[error("serial operation timed out")]
    Timeout,

    /// An I/O error occurred on the underlying port.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The host-side serial implementation reported a non-zero status code.
    #[error("serial device reported error code {code}")]
    Device { code: i32 },

    /// The port refused the requested baud rate.
    #[error("baud rate {0} not supported by the serial port")]
    BaudRateNotSupported(BaudRate),

    /// A baud-rate bitmask value did not name exactly one known rate.
    #[error("invalid baud rate value {0:#x}")]
    InvalidBaudRate(u32),

    /// The port could not be opened.
    #[error("failed to open serial port {path}: {message}")]
    Open { path: String, message: String },
}

impl TransportError {
    /// True when the error is a timeout rather than a transport fault.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Timeout => true,
            TransportError::Io(err) => {
                matches!(
                    err.kind(),
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                )
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
