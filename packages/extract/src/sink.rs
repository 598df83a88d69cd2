//! Side channel for diagnostic artifacts.
//!
//! The free-text rung hands the raw results page to a [`DebugSink`] before
//! parsing it, so a failed parse can be inspected afterwards.

use std::path::{Path, PathBuf};

/// Receives the raw markup of a page that needed free-text extraction.
pub trait DebugSink {
    /// Stores `markup`.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] if the markup cannot be stored.
    fn save_page(&self, markup: &str) -> std::io::Result<()>;
}

/// Writes the page to a file, replacing any previous dump.
#[derive(Debug, Clone)]
pub struct FileDebugSink {
    path: PathBuf,
}

impl FileDebugSink {
    /// Creates a sink writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DebugSink for FileDebugSink {
    fn save_page(&self, markup: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, markup)?;
        log::info!("Saved results page to {}", self.path.display());
        Ok(())
    }
}
