use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::config::DescriptionConfig;
use crate::error::{DescriptionError, Result};

/// The C-RED2 register description compiled into the adapter.
pub const EMBEDDED_DESCRIPTION: &str = include_str!("../assets/cred2.xml");

/// Where a loaded document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Embedded,
    File(PathBuf),
}

/// A loaded register description, kept with its terminating NUL so it can be
/// handed to C callers verbatim.
#[derive(Debug)]
pub struct Document {
    bytes: Vec<u8>,
    source: DocumentSource,
}

impl Document {
    fn from_text(text: &[u8], source: DocumentSource) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(text.len() + 1)
            .map_err(|_| DescriptionError::OutOfMemory {
                size: text.len() + 1,
            })?;
        bytes.extend_from_slice(text);
        bytes.push(0);
        Ok(Self { bytes, source })
    }

    /// Document bytes including the trailing NUL.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes
    }

    /// Document bytes without the trailing NUL.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - 1]
    }

    /// Size a caller must provide, NUL included.
    pub fn len_with_nul(&self) -> usize {
        self.bytes.len()
    }

    pub fn source(&self) -> &DocumentSource {
        &self.source
    }
}

/// Lazily loaded, process-wide register description.
///
/// The first `document()` call loads from the configured file or falls back to
/// the embedded copy; later calls share the cached result until `clear()`.
#[derive(Debug)]
pub struct DescriptionStore {
    config: DescriptionConfig,
    cached: Mutex<Option<Arc<Document>>>,
}

impl DescriptionStore {
    pub fn new(config: DescriptionConfig) -> Self {
        Self {
            config,
            cached: Mutex::new(None),
        }
    }

    /// Store configured from `CLP_XML_PATH`.
    pub fn from_env() -> Self {
        Self::new(DescriptionConfig::from_env())
    }

    /// The cached document, loading it on first use.
    ///
    /// A failed load is not cached; the next call tries again.
    pub fn document(&self) -> Result<Arc<Document>> {
        let mut cached = self.lock();
        if let Some(doc) = cached.as_ref() {
            return Ok(Arc::clone(doc));
        }

        let doc = Arc::new(self.load()?);
        info!(
            source = ?doc.source(),
            bytes = doc.len_with_nul(),
            "loaded register description"
        );
        *cached = Some(Arc::clone(&doc));
        Ok(doc)
    }

    /// Drop the cached document.
    pub fn clear(&self) {
        if self.lock().take().is_some() {
            debug!("released register description");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    pub fn config(&self) -> &DescriptionConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<Document>>> {
        // The cache holds no invariant a panic could break.
        self.cached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load(&self) -> Result<Document> {
        match &self.config.source_path {
            Some(path) => load_file(path, self.config.max_document_size),
            None => Document::from_text(EMBEDDED_DESCRIPTION.as_bytes(), DocumentSource::Embedded),
        }
    }
}

impl Default for DescriptionStore {
    fn default() -> Self {
        Self::new(DescriptionConfig::default())
    }
}

fn load_file(path: &Path, max: usize) -> Result<Document> {
    let file = File::open(path).map_err(|err| {
        DescriptionError::LoadFailed(format!("failed to open {}: {err}", path.display()))
    })?;
    let size = file
        .metadata()
        .map_err(|err| {
            DescriptionError::LoadFailed(format!("failed to stat {}: {err}", path.display()))
        })?
        .len();

    if size == 0 {
        return Err(DescriptionError::LoadFailed(format!(
            "empty XML file {}",
            path.display()
        )));
    }
    if size > max as u64 {
        return Err(DescriptionError::TooLarge { size, max });
    }

    let mut text = Vec::new();
    text.try_reserve_exact(size as usize)
        .map_err(|_| DescriptionError::OutOfMemory {
            size: size as usize,
        })?;
    // The file may grow between stat and read; never read past the limit.
    file.take(max as u64 + 1)
        .read_to_end(&mut text)
        .map_err(|err| {
            DescriptionError::LoadFailed(format!("failed to read {}: {err}", path.display()))
        })?;

    if text.is_empty() {
        return Err(DescriptionError::LoadFailed(format!(
            "empty XML file {}",
            path.display()
        )));
    }
    if text.len() > max {
        return Err(DescriptionError::TooLarge {
            size: text.len() as u64,
            max,
        });
    }

    Document::from_text(&text, DocumentSource::File(path.to_path_buf()))
}
