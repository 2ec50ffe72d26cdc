//! One-level directory scanner producing game candidates.
//!
//! Directories are always candidates. Files are candidates only when their
//! name ends with a configured installer or archive suffix, which is stripped
//! before the name is normalized.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ScannerConfig;
use crate::normalizer::NameNormalizer;

/// A game candidate found directly under a scan root. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredEntry {
    /// Full path of the directory or file.
    pub path: String,
    /// Raw file or directory name.
    pub name_on_disk: String,
    /// Normalized title guess.
    pub extracted_name: String,
}

/// Why a root produced no candidates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("scan root does not exist: {0}")]
    Missing(String),

    #[error("permission denied reading scan root: {0}")]
    PermissionDenied(String),

    #[error("scan root is not a directory: {0}")]
    NotADirectory(String),

    #[error("failed to read scan root {path}: {message}")]
    Io { path: String, message: String },
}

/// Outcome of scanning one root.
///
/// A failing root yields no entries and an error instead of aborting the run.
#[derive(Debug, Clone, Default)]
pub struct RootScan {
    pub entries: Vec<DiscoveredEntry>,
    pub error: Option<ScanError>,
}

/// Scans the direct children of a root directory.
#[derive(Debug, Clone)]
pub struct PathScanner {
    normalizer: Arc<NameNormalizer>,
    /// Lowercased suffixes, most dot-segments first.
    extensions: Vec<String>,
}

impl PathScanner {
    pub fn new<I, S>(normalizer: Arc<NameNormalizer>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extensions: Vec<String> = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().to_lowercase())
            .filter(|ext| ext.len() > 1)
            .collect();
        // ".tar.gz" must win over ".gz"
        extensions.sort_by(|a, b| {
            let segments = |ext: &str| ext.matches('.').count();
            segments(b)
                .cmp(&segments(a))
                .then_with(|| b.len().cmp(&a.len()))
                .then_with(|| a.cmp(b))
        });
        extensions.dedup();

        Self {
            normalizer,
            extensions,
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(
            Arc::new(NameNormalizer::from_config(config)),
            &config.extensions,
        )
    }

    /// Scan `root`, logging and returning any root-level failure.
    ///
    /// Output order follows filesystem enumeration order.
    pub fn scan(&self, root: &Path) -> RootScan {
        match self.try_scan(root) {
            Ok(entries) => RootScan {
                entries,
                error: None,
            },
            Err(error) => {
                warn!("Skipping scan root: {}", error);
                RootScan {
                    entries: Vec::new(),
                    error: Some(error),
                }
            }
        }
    }

    fn try_scan(&self, root: &Path) -> Result<Vec<DiscoveredEntry>, ScanError> {
        let root_display = root.display().to_string();

        if !root.exists() {
            return Err(ScanError::Missing(root_display));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root_display));
        }

        let read_dir = fs::read_dir(root).map_err(|e| io_error(&root_display, e))?;

        let mut found = Vec::new();
        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Unreadable entry under {}: {}", root_display, e);
                    continue;
                }
            };

            let path = entry.path();
            let name_on_disk = entry.file_name().to_string_lossy().into_owned();

            if let Some(candidate) = self.classify(&path, &name_on_disk) {
                debug!(
                    "Candidate {:?} -> {:?}",
                    candidate.name_on_disk, candidate.extracted_name
                );
                found.push(candidate);
            }
        }

        Ok(found)
    }

    fn classify(&self, path: &Path, name_on_disk: &str) -> Option<DiscoveredEntry> {
        // Follows symlinks, so a linked install directory counts as a directory.
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!("Cannot stat {}: {}", path.display(), e);
                return None;
            }
        };

        let stem = if metadata.is_dir() {
            name_on_disk
        } else if metadata.is_file() {
            self.strip_extension(name_on_disk)?
        } else {
            return None;
        };

        Some(DiscoveredEntry {
            path: path.to_string_lossy().into_owned(),
            name_on_disk: name_on_disk.to_string(),
            extracted_name: self.normalizer.normalize(stem),
        })
    }

    /// Strip the first matching suffix, or `None` if the file is not a candidate.
    fn strip_extension<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let lower = file_name.to_lowercase();
        self.extensions
            .iter()
            .find(|ext| lower.ends_with(ext.as_str()) && lower.len() > ext.len())
            .and_then(|ext| {
                // Lowercasing can change byte lengths for non-ASCII names, so cut
                // by the suffix's char count rather than by byte offset.
                let keep = file_name.chars().count().checked_sub(ext.chars().count())?;
                let cut = file_name
                    .char_indices()
                    .nth(keep)
                    .map(|(idx, _)| idx)
                    .unwrap_or(file_name.len());
                Some(&file_name[..cut])
            })
    }
}

fn io_error(root: &str, err: io::Error) -> ScanError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(root.to_string()),
        io::ErrorKind::NotFound => ScanError::Missing(root.to_string()),
        _ => ScanError::Io {
            path: root.to_string(),
            message: err.to_string(),
        },
    }
}
