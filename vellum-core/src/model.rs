//! Values that flow through the ingestion pipeline.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A directory subscribed to for creation events. Fixed for the lifetime of
/// the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchedRoot {
    path: PathBuf,
}

impl WatchedRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `candidate` lives under this root (or is the root itself).
    pub fn contains(&self, candidate: &Path) -> bool {
        candidate.starts_with(&self.path)
    }
}

impl fmt::Display for WatchedRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Creation event delivered by the notification boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Created(PathBuf),
    DirectoryCreated(PathBuf),
}

impl FileEvent {
    pub fn path(&self) -> &Path {
        match self {
            FileEvent::Created(path) | FileEvent::DirectoryCreated(path) => {
                path
            }
        }
    }
}

/// Transient copy of a source file inside the staging root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Absolute location of the copy.
    pub path: PathBuf,
    /// Source base name without its extension.
    pub archival_name: String,
    pub size_bytes: u64,
}

/// Encoded staged file waiting in the submission batch.
///
/// Field names follow the archive API's `digitalResources` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFileRecord {
    /// Base64 file content.
    #[serde(rename = "handler")]
    pub encoded_content: String,
    /// Byte length as read from the filesystem, in decimal.
    #[serde(rename = "size")]
    pub size_bytes: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "mimetype")]
    pub mime_type: String,
}
