//! Stage, encode, batch and submit: the per-event work driven by the watch
//! coordinator.
//!
//! A pipeline is owned by exactly one worker task. It is the only writer of
//! the staging root and the only holder of the submission batch, which is
//! what makes purging the whole staging root after a success safe.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::spawn_blocking;
use tracing::{debug, error, info};

use crate::archive::{ArchiveSink, SubmissionBatch, build_payload};
use crate::encode::encode;
use crate::error::{IngestError, Result};
use crate::fs_watch::expand::{DirectoryLister, WalkDirLister, expand};
use crate::model::FileEvent;
use crate::settings::{ArchiveMetadata, IngestSettings, has_ignored_suffix};
use crate::staging::{
    FileStabilizer, OpenReadProbe, PurgeReport, ReadProbe, StagingCopier,
    purge,
};

/// What happened to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Not a regular file, vanished, or matched an ignored suffix.
    Ignored,
    /// Appended; the batch is not yet full enough to submit.
    Pending,
    /// Appended and the whole batch was accepted by the archive.
    Submitted { records: usize },
    /// Appended but the submission failed; the batch is kept.
    Retained { records: usize },
    /// Already handled as part of an enclosing directory expansion.
    Duplicate,
}

/// How long a path produced by a directory expansion suppresses its own
/// creation event. That event is queued around the time the file is listed,
/// so it arrives well within this window unless the queue is badly backed up.
pub const EXPANSION_MEMORY: Duration = Duration::from_secs(600);

pub struct IngestPipeline<S: ArchiveSink, P: ReadProbe = OpenReadProbe> {
    copier: StagingCopier<P>,
    sink: S,
    lister: Arc<dyn DirectoryLister>,
    metadata: ArchiveMetadata,
    batch_size: usize,
    ignored_suffixes: Vec<String>,
    batch: SubmissionBatch,
    recently_expanded: HashMap<PathBuf, Instant>,
}

impl<S: ArchiveSink, P: ReadProbe> fmt::Debug for IngestPipeline<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("staging_root", &self.copier.staging_root())
            .field("sink_type", &std::any::type_name::<S>())
            .field("batch_size", &self.batch_size)
            .field("pending_records", &self.batch.len())
            .finish()
    }
}

impl<S: ArchiveSink> IngestPipeline<S, OpenReadProbe> {
    pub fn new(settings: &IngestSettings, sink: S) -> Self {
        Self::with_parts(settings, sink, OpenReadProbe, Arc::new(WalkDirLister))
    }
}

impl<S: ArchiveSink, P: ReadProbe> IngestPipeline<S, P> {
    pub fn with_parts(
        settings: &IngestSettings,
        sink: S,
        probe: P,
        lister: Arc<dyn DirectoryLister>,
    ) -> Self {
        let stabilizer = FileStabilizer::with_probe(settings.stabilizer, probe);
        Self {
            copier: StagingCopier::new(
                settings.staging_root.clone(),
                stabilizer,
            ),
            sink,
            lister,
            metadata: settings.metadata.clone(),
            batch_size: settings.batch_size.max(1),
            ignored_suffixes: settings.ignored_suffixes.clone(),
            batch: SubmissionBatch::new(),
            recently_expanded: HashMap::new(),
        }
    }

    pub fn batch(&self) -> &SubmissionBatch {
        &self.batch
    }

    pub fn staging_root(&self) -> &Path {
        self.copier.staging_root()
    }

    /// Run the pipeline for one notification. Directory events are expanded
    /// first. Per-file failures are logged and never stop the remaining
    /// files.
    ///
    /// A file written into a new directory is usually reported twice: by the
    /// expansion of the directory and by its own creation event. Whichever
    /// comes second is reported as [`FileOutcome::Duplicate`] or skipped.
    pub async fn handle_event(
        &mut self,
        event: FileEvent,
    ) -> Vec<(PathBuf, Result<FileOutcome>)> {
        self.forget_stale_expansions();

        let files = match &event {
            FileEvent::Created(path) => {
                if self.recently_expanded.remove(path).is_some() {
                    debug!(
                        path = %path.display(),
                        "already handled with its directory"
                    );
                    return vec![(path.clone(), Ok(FileOutcome::Duplicate))];
                }
                info!(path = %path.display(), "new file detected");
                vec![path.clone()]
            }
            FileEvent::DirectoryCreated(dir) => {
                info!(path = %dir.display(), "new directory detected");
                let expanded = self.expand_directory(event.clone()).await;
                self.remember_expanded(expanded)
            }
        };

        let mut results = Vec::with_capacity(files.len());
        for path in files {
            let result = self.process_file(&path).await;
            if let Err(err) = &result {
                error!(
                    path = %path.display(),
                    error = %err,
                    "dropping file from this cycle"
                );
            }
            results.push((path, result));
        }
        results
    }

    async fn expand_directory(&self, event: FileEvent) -> Vec<PathBuf> {
        let lister = Arc::clone(&self.lister);
        let dir = event.path().to_path_buf();
        match spawn_blocking(move || expand(event, lister.as_ref())).await {
            Ok(events) => events
                .into_iter()
                .map(|event| event.path().to_path_buf())
                .collect(),
            Err(join_err) => {
                error!(
                    path = %dir.display(),
                    error = %join_err,
                    "directory expansion panicked"
                );
                Vec::new()
            }
        }
    }

    /// Record freshly expanded paths and return those not already handled
    /// by an earlier expansion (nested directory events overlap).
    fn remember_expanded(&mut self, paths: Vec<PathBuf>) -> Vec<PathBuf> {
        let now = Instant::now();
        paths
            .into_iter()
            .filter(|path| {
                if self.recently_expanded.contains_key(path) {
                    return false;
                }
                self.recently_expanded.insert(path.clone(), now);
                true
            })
            .collect()
    }

    fn forget_stale_expansions(&mut self) {
        self.recently_expanded
            .retain(|_, seen| seen.elapsed() < EXPANSION_MEMORY);
    }

    /// Stage, encode and append one file, then submit if the batch is due.
    pub async fn process_file(&mut self, path: &Path) -> Result<FileOutcome> {
        if !self.is_candidate(path).await? {
            return Ok(FileOutcome::Ignored);
        }

        let staged = self.copier.stage(path).await?;
        let record = encode(&staged).await?;
        self.batch.append(record);

        if !self.batch.is_due(self.batch_size) {
            info!(
                path = %path.display(),
                pending = self.batch.len(),
                batch_size = self.batch_size,
                "file queued for next submission"
            );
            return Ok(FileOutcome::Pending);
        }

        Ok(self.flush(&staged.archival_name).await)
    }

    async fn is_candidate(&self, path: &Path) -> Result<bool> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        if has_ignored_suffix(&name, &self.ignored_suffixes) {
            info!(path = %path.display(), "ignored temporary file");
            return Ok(false);
        }

        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => Ok(true),
            Ok(_) => {
                info!(path = %path.display(), "ignored non-regular file");
                Ok(false)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "file vanished before staging");
                Ok(false)
            }
            Err(err) => Err(IngestError::io(path, err)),
        }
    }

    /// Submit everything pending under `archive_name`. On success the batch
    /// is cleared and the staging root purged; on failure both are left as
    /// they are.
    pub async fn flush(&mut self, archive_name: &str) -> FileOutcome {
        let records = self.batch.len();
        let submitted = {
            let payload =
                build_payload(self.batch.records(), archive_name, &self.metadata);
            self.sink.submit(&payload).await
        };

        match submitted {
            Ok(()) => {
                info!(archive_name, records, "archive submitted");
                self.batch.clear();
                self.reclaim_staging().await;
                FileOutcome::Submitted { records }
            }
            Err(err) => {
                error!(
                    archive_name,
                    records,
                    error = %err,
                    "archive submission failed; keeping batch for next attempt"
                );
                FileOutcome::Retained { records }
            }
        }
    }

    /// Last submission attempt for anything still pending, used at
    /// shutdown.
    pub async fn finish(&mut self) -> Option<FileOutcome> {
        let archive_name = self.batch.records().last()?.file_name.clone();
        info!(
            records = self.batch.len(),
            "submitting pending records before shutdown"
        );
        Some(self.flush(&archive_name).await)
    }

    async fn reclaim_staging(&self) {
        let staging_root = self.copier.staging_root();
        match purge(staging_root).await {
            Ok(PurgeReport { removed, failures }) if failures.is_empty() => {
                info!(
                    staging = %staging_root.display(),
                    removed,
                    "staging area reclaimed"
                );
            }
            Ok(PurgeReport { removed, failures }) => {
                let failed: Vec<String> = failures
                    .iter()
                    .map(|(path, err)| format!("{}: {err}", path.display()))
                    .collect();
                error!(
                    staging = %staging_root.display(),
                    removed,
                    failed = ?failed,
                    "staging purge incomplete; leftovers will be purged after the next submission"
                );
            }
            Err(err) => {
                error!(
                    staging = %staging_root.display(),
                    error = %err,
                    "could not reclaim staging area"
                );
            }
        }
    }
}
