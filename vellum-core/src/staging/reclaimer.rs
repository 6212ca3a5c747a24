use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};

/// Outcome of a best-effort staging purge.
#[derive(Debug, Default)]
pub struct PurgeReport {
    pub removed: usize,
    pub failures: Vec<(PathBuf, io::Error)>,
}

impl PurgeReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Remove every direct entry of `staging_root`: files and symlinks one by
/// one, directories recursively. Symlinks are never followed. Entry-level
/// failures are recorded and skipped; only an unreadable root is an error.
pub async fn purge(staging_root: &Path) -> Result<PurgeReport> {
    let mut entries = fs::read_dir(staging_root)
        .await
        .map_err(|err| IngestError::io(staging_root, err))?;
    let mut report = PurgeReport::default();

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(err) => {
                warn!(
                    staging = %staging_root.display(),
                    error = %err,
                    "failed to list staging entry"
                );
                report.failures.push((staging_root.to_path_buf(), err));
                break;
            }
        };

        let path = entry.path();
        match remove_entry(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed staged entry");
                report.removed += 1;
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to delete staged entry"
                );
                report.failures.push((path, err));
            }
        }
    }

    Ok(report)
}

async fn remove_entry(path: &Path) -> io::Result<()> {
    let file_type = fs::symlink_metadata(path).await?.file_type();
    if file_type.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn removes_files_and_nested_directories() {
        let staging = tempdir().unwrap();
        std::fs::write(staging.path().join("a.txt"), b"a").unwrap();
        let nested = staging.path().join("left/over");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("b.pdf"), b"b").unwrap();

        let report = purge(staging.path()).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.removed, 2);
        assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
        assert!(staging.path().exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn removes_symlink_without_touching_target() {
        let staging = tempdir().unwrap();
        let outside = tempdir().unwrap();
        let target = outside.path().join("keep.txt");
        std::fs::write(&target, b"keep").unwrap();
        std::os::unix::fs::symlink(&target, staging.path().join("link"))
            .unwrap();

        let report = purge(staging.path()).await.unwrap();

        assert_eq!(report.removed, 1);
        assert!(target.exists());
        assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let err = purge(&dir.path().join("absent")).await.unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }

    #[tokio::test]
    async fn empty_root_is_a_complete_purge() {
        let staging = tempdir().unwrap();
        let report = purge(staging.path()).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.removed, 0);
    }
}
