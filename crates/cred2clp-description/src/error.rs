/// Errors that can occur while loading or serving the register description.
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    /// The description file could not be opened or read, or was empty.
    #[error("failed to load register description: {0}")]
    LoadFailed(String),

    /// The description file exceeds the configured maximum.
    #[error("register description too large ({size} bytes, max {max})")]
    TooLarge { size: u64, max: usize },

    /// No memory could be reserved for the document.
    #[error("out of memory buffering register description ({size} bytes)")]
    OutOfMemory { size: usize },

    /// The requested XML ID does not belong to this device.
    #[error("no register description for XML ID {id:?}: {reason}")]
    UnknownXmlId { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DescriptionError>;
