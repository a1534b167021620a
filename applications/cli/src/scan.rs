//! Candidate file discovery

use crate::error::{CliError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds the files a batch should process
///
/// Folders are listed one level deep in file-name order; explicit files are
/// kept in argument order. Both must carry one of the configured extensions.
/// Folder entries that cannot be inspected are logged and skipped.
#[derive(Debug, Clone)]
pub struct FileScanner {
    /// Lowercase extensions without the leading dot
    extensions: Vec<String>,
}

impl FileScanner {
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        let extensions = extensions
            .iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    /// Check whether a path carries one of the configured extensions
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Expand command-line paths into the list of files to normalize
    ///
    /// No paths means the current directory. A path that does not exist is
    /// an argument error and nothing is returned.
    pub fn collect(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let current_dir = [PathBuf::from(".")];
        let paths = if paths.is_empty() { &current_dir[..] } else { paths };

        let mut files = Vec::new();
        for path in paths {
            let metadata = std::fs::metadata(path).map_err(|e| {
                CliError::Argument(format!("cannot access {}: {}", path.display(), e))
            })?;

            if metadata.is_dir() {
                files.extend(self.scan_directory(path)?);
            } else if self.matches(path) {
                files.push(path.clone());
            } else {
                tracing::warn!(
                    "Ignoring {}: extension is not one of {:?}",
                    path.display(),
                    self.extensions
                );
            }
        }

        Ok(files)
    }

    /// List matching files directly inside `dir`
    pub fn scan_directory(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                // The folder itself is unreadable
                Err(e) if e.depth() == 0 => {
                    return Err(CliError::Argument(format!(
                        "cannot read {}: {}",
                        dir.display(),
                        e
                    )));
                }
                Err(e) => {
                    tracing::warn!("Skipping entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            if entry.file_type().is_file() && self.matches(entry.path()) {
                files.push(entry.into_path());
            }
        }

        tracing::debug!("Found {} candidate files in {}", files.len(), dir.display());
        Ok(files)
    }
}
