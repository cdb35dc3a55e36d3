use std::path::PathBuf;

/// Environment variable naming a description file to serve instead of the
/// embedded document.
pub const XML_PATH_ENV: &str = "CLP_XML_PATH";

/// Largest description file accepted from disk.
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 4 * 1024 * 1024;

/// Controls where the register description comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionConfig {
    /// File to load instead of the embedded document.
    pub source_path: Option<PathBuf>,
    /// Maximum bytes accepted from `source_path`.
    pub max_document_size: usize,
}

impl DescriptionConfig {
    /// Read the override path from `CLP_XML_PATH`. Unset or empty means
    /// "use the embedded document".
    pub fn from_env() -> Self {
        let source_path = std::env::var_os(XML_PATH_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self {
            source_path,
            ..Self::default()
        }
    }

    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }
}

impl Default for DescriptionConfig {
    fn default() -> Self {
        Self {
            source_path: None,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
        }
    }
}
