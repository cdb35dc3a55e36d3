use std::fmt;

use cred2clp_description::DescriptionError;
use cred2clp_frame::FrameError;
use cred2clp_transport::TransportError;

/// Direction of a register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => f.write_str("read"),
            Operation::Write => f.write_str("write"),
        }
    }
}

/// Errors returned by the register translation engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A required argument was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No live session has this handle.
    #[error("invalid session handle {0}")]
    InvalidSession(u32),

    /// The address is not part of the register map.
    #[error("unknown register address {0:#06x}")]
    UnknownRegister(u64),

    /// The register exists but does not support this direction.
    #[error("register {address:#06x} cannot be {operation} ({name} is {access})")]
    AccessDenied {
        address: u64,
        name: &'static str,
        access: &'static str,
        operation: Operation,
    },

    /// The caller's buffer is narrower than the register.
    #[error("buffer too small ({actual} bytes, register needs {needed})")]
    BufferTooSmall { needed: usize, actual: usize },

    /// The device reply did not parse as the register's kind.
    #[error("failed to decode reply to {command:?}: {message}")]
    DecodeFailure { command: String, message: String },

    /// The transport reported an error other than a timeout.
    #[error("transport failure: {message}")]
    TransportFailure { code: Option<i32>, message: String },

    /// The device did not answer in time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// A baud rate outside the port's supported set was requested.
    #[error("unsupported capability: {0}")]
    UnsupportedCapability(String),

    /// Memory for the register description could not be reserved.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// The probe templates do not name this adapter's device.
    #[error("device identity mismatch: {0:?}")]
    IdentityMismatch(String),

    /// The XML ID does not belong to the session's device.
    #[error("no register description for XML ID {id:?}: {reason}")]
    UnknownXmlId { id: String, reason: String },

    /// The register description could not be loaded.
    #[error("register description unavailable: {0}")]
    DescriptionUnavailable(String),

    /// Every non-zero handle is in use.
    #[error("session table full")]
    SessionTableFull,
}

/// Coarse, stable classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidSession,
    UnknownRegister,
    AccessDenied,
    BufferTooSmall,
    DecodeFailure,
    TransportFailure,
    Timeout,
    UnsupportedCapability,
    OutOfMemory,
    IdentityMismatch,
    UnknownXmlId,
    DescriptionUnavailable,
    SessionTableFull,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::InvalidSession => "invalid_session",
            ErrorKind::UnknownRegister => "unknown_register",
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::BufferTooSmall => "buffer_too_small",
            ErrorKind::DecodeFailure => "decode_failure",
            ErrorKind::TransportFailure => "transport_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::UnsupportedCapability => "unsupported_capability",
            ErrorKind::OutOfMemory => "out_of_memory",
            ErrorKind::IdentityMismatch => "identity_mismatch",
            ErrorKind::UnknownXmlId => "unknown_xml_id",
            ErrorKind::DescriptionUnavailable => "description_unavailable",
            ErrorKind::SessionTableFull => "session_table_full",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            EngineError::InvalidSession(_) => ErrorKind::InvalidSession,
            EngineError::UnknownRegister(_) => ErrorKind::UnknownRegister,
            EngineError::AccessDenied { .. } => ErrorKind::AccessDenied,
            EngineError::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            EngineError::DecodeFailure { .. } => ErrorKind::DecodeFailure,
            EngineError::TransportFailure { .. } => ErrorKind::TransportFailure,
            EngineError::Timeout(_) => ErrorKind::Timeout,
            EngineError::UnsupportedCapability(_) => ErrorKind::UnsupportedCapability,
            EngineError::OutOfMemory(_) => ErrorKind::OutOfMemory,
            EngineError::IdentityMismatch(_) => ErrorKind::IdentityMismatch,
            EngineError::UnknownXmlId { .. } => ErrorKind::UnknownXmlId,
            EngineError::DescriptionUnavailable(_) => ErrorKind::DescriptionUnavailable,
            EngineError::SessionTableFull => ErrorKind::SessionTableFull,
        }
    }

    pub(crate) fn decode(command: &str, message: impl Into<String>) -> Self {
        EngineError::DecodeFailure {
            command: command.to_string(),
            message: message.into(),
        }
    }
}

impl From<TransportError> for EngineError {
    fn from(err: TransportError) -> Self {
        if err.is_timeout() {
            return EngineError::Timeout(err.to_string());
        }
        let message = err.to_string();
        match err {
            TransportError::BaudRateNotSupported(_) | TransportError::InvalidBaudRate(_) => {
                EngineError::UnsupportedCapability(message)
            }
            TransportError::Device { code } => EngineError::TransportFailure {
                code: Some(code),
                message,
            },
            _ => EngineError::TransportFailure {
                code: None,
                message,
            },
        }
    }
}

impl From<FrameError> for EngineError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::BufferTooSmall { needed, actual } => {
                EngineError::BufferTooSmall { needed, actual }
            }
            FrameError::InvalidCommand(text) => {
                EngineError::InvalidArgument(format!("value cannot be sent as one line: {text}"))
            }
            FrameError::ShortWrite { .. } => EngineError::TransportFailure {
                code: None,
                message: err.to_string(),
            },
            FrameError::Transport(err) => err.into(),
        }
    }
}

impl From<DescriptionError> for EngineError {
    fn from(err: DescriptionError) -> Self {
        match err {
            DescriptionError::UnknownXmlId { id, reason } => EngineError::UnknownXmlId { id, reason },
            DescriptionError::OutOfMemory { .. } => EngineError::OutOfMemory(err.to_string()),
            other => EngineError::DescriptionUnavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
