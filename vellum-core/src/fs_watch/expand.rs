//! Directory events become one file event per contained regular file.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::model::FileEvent;

/// Enumerates the regular files below a directory.
pub trait DirectoryLister: Send + Sync {
    /// Regular files transitively contained in `dir`, in walk order.
    /// Entries that cannot be read are skipped.
    fn regular_files(&self, dir: &Path) -> Vec<PathBuf>;
}

/// Recursive walk on the live filesystem. Symlinks are not followed, so a
/// link cycle cannot make the walk unbounded.
#[derive(Debug, Default, Clone, Copy)]
pub struct WalkDirLister;

impl DirectoryLister for WalkDirLister {
    fn regular_files(&self, dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).follow_links(false) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(err) => warn!(
                    dir = %dir.display(),
                    error = %err,
                    "skipping unreadable entry while expanding directory"
                ),
            }
        }
        files
    }
}

impl fmt::Debug for dyn DirectoryLister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DirectoryLister")
    }
}

/// File events pass through untouched; a directory event becomes one
/// `Created` per regular file beneath it, in listing order and without
/// duplicates.
pub fn expand(event: FileEvent, lister: &dyn DirectoryLister) -> Vec<FileEvent> {
    match event {
        FileEvent::Created(path) => vec![FileEvent::Created(path)],
        FileEvent::DirectoryCreated(dir) => {
            let mut seen = HashSet::new();
            lister
                .regular_files(&dir)
                .into_iter()
                .filter(|path| seen.insert(path.clone()))
                .map(FileEvent::Created)
                .collect()
        }
    }
}
