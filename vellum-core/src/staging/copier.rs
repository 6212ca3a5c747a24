use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tokio::task::spawn_blocking;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};
use crate::model::StagedFile;
use crate::staging::stabilizer::{FileStabilizer, OpenReadProbe, ReadProbe};

/// Copies stabilized source files into the staging root under their base
/// name. Same-named files overwrite each other's staged copy.
#[derive(Debug)]
pub struct StagingCopier<P: ReadProbe = OpenReadProbe> {
    staging_root: PathBuf,
    stabilizer: FileStabilizer<P>,
}

impl<P: ReadProbe> StagingCopier<P> {
    pub fn new(staging_root: PathBuf, stabilizer: FileStabilizer<P>) -> Self {
        Self {
            staging_root,
            stabilizer,
        }
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    pub async fn stage(&self, source: &Path) -> Result<StagedFile> {
        let base_name = source.file_name().ok_or_else(|| {
            IngestError::InvalidPath(format!(
                "{} has no file name",
                source.display()
            ))
        })?;
        let archival_name = archival_name(source)?;

        self.stabilizer.await_readable(source).await?;

        let target = self.staging_root.join(base_name);
        let size_bytes = copy_with_metadata(source, &target).await?;

        debug!(
            source = %source.display(),
            staged = %target.display(),
            size_bytes,
            "staged file"
        );

        Ok(StagedFile {
            path: target,
            archival_name,
            size_bytes,
        })
    }
}

/// Base name without extension; directory context is discarded.
pub fn archival_name(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            IngestError::InvalidPath(format!(
                "{} has no usable file name",
                path.display()
            ))
        })
}

async fn copy_with_metadata(source: &Path, target: &Path) -> Result<u64> {
    let source = source.to_path_buf();
    let target = target.to_path_buf();

    spawn_blocking(move || {
        // fs::copy carries permission bits over.
        let size = fs::copy(&source, &target)
            .map_err(|err| IngestError::io(&source, err))?;

        match fs::metadata(&source) {
            Ok(meta) => {
                let atime = FileTime::from_last_access_time(&meta);
                let mtime = FileTime::from_last_modification_time(&meta);
                if let Err(err) = filetime::set_file_times(&target, atime, mtime)
                {
                    warn!(
                        staged = %target.display(),
                        error = %err,
                        "could not preserve timestamps on staged copy"
                    );
                }
            }
            Err(err) => warn!(
                source = %source.display(),
                error = %err,
                "could not read source metadata"
            ),
        }

        Ok(size)
    })
    .await
    .map_err(|join_err| {
        IngestError::io(
            PathBuf::new(),
            io::Error::other(format!("staging copy panicked: {join_err}")),
        )
    })?
}
