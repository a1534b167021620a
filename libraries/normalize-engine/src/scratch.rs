//! Scratch storage for decoded PCM
//!
//! One directory per batch, shared by all workers. Each job owns a distinct
//! file inside it and removes that file when the job ends, whatever the
//! outcome.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Batch-wide directory holding the temporary raw files
#[derive(Debug)]
pub enum ScratchDir {
    /// Freshly created directory, removed on drop
    Temp(TempDir),
    /// Existing directory used when no temp dir could be created
    Fallback(PathBuf),
}

impl ScratchDir {
    /// Create a `normalize*` directory under `root` (or the system temp dir)
    ///
    /// Falls back to the current directory when creation fails.
    pub fn create(root: Option<&Path>) -> Self {
        let mut builder = tempfile::Builder::new();
        builder.prefix("normalize");
        let created = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };

        match created {
            Ok(dir) => {
                tracing::debug!("Scratch directory: {}", dir.path().display());
                Self::Temp(dir)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to create temporary directory ({}), using current directory",
                    e
                );
                Self::Fallback(PathBuf::from("."))
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Temp(dir) => dir.path(),
            Self::Fallback(path) => path,
        }
    }
}

/// Removes a file when dropped
///
/// A missing file is not an error; jobs may fail before creating it.
#[derive(Debug)]
pub struct TempFileGuard {
    path: PathBuf,
}

impl TempFileGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}
