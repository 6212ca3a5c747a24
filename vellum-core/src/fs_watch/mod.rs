//! Filesystem watch front-end for the ingestion pipeline.
//!
//! A thin wrapper around `notify`: one recursive watcher per configured root,
//! all feeding a single bounded channel. One worker task drains the channel
//! and runs the pipeline for each creation event, so events from every root
//! are processed strictly one at a time and the batch needs no lock.

use std::fmt;
use std::path::Path;

use notify::event::{CreateKind, EventKind};
use notify::{
    Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher,
};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, spawn_blocking};
use tracing::{debug, error, info, warn};

pub mod expand;

use crate::archive::ArchiveSink;
use crate::error::{IngestError, Result};
use crate::model::{FileEvent, WatchedRoot};
use crate::pipeline::IngestPipeline;
use crate::staging::ReadProbe;

/// Capacity of the channel between notify threads and the pipeline worker.
/// A full channel blocks the notify thread rather than dropping events.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Watching,
    Stopped,
}

enum WatchMessage {
    Event(Event),
    Error(String),
}

impl fmt::Debug for WatchMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchMessage::Event(event) => {
                let path_count = event.paths.len();
                f.debug_struct("WatchMessage::Event")
                    .field("kind", &event.kind)
                    .field("path_count", &path_count)
                    .finish()
            }
            WatchMessage::Error(message) => f
                .debug_struct("WatchMessage::Error")
                .field("message", message)
                .finish(),
        }
    }
}

/// Owns the root subscriptions and the pipeline worker.
pub struct WatchCoordinator {
    roots: Vec<WatchedRoot>,
    watchers: Vec<RecommendedWatcher>,
    worker: Option<JoinHandle<()>>,
    state: WatchState,
}

impl fmt::Debug for WatchCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let worker_finished =
            self.worker.as_ref().map(|handle| handle.is_finished());
        f.debug_struct("WatchCoordinator")
            .field("roots", &self.roots)
            .field("active_watchers", &self.watchers.len())
            .field("worker_finished", &worker_finished)
            .field("state", &self.state)
            .finish()
    }
}

impl WatchCoordinator {
    /// Subscribe to every root and start the pipeline worker.
    ///
    /// Roots are resolved to canonical absolute paths first, since that is
    /// how notify reports event paths. A root that cannot be resolved or
    /// watched is logged and skipped; if none is left the error is returned.
    pub async fn start<S, P>(
        roots: Vec<WatchedRoot>,
        pipeline: IngestPipeline<S, P>,
    ) -> Result<Self>
    where
        S: ArchiveSink + 'static,
        P: ReadProbe + 'static,
    {
        if roots.is_empty() {
            return Err(IngestError::Watch("no directories to watch".into()));
        }

        let (tx, rx) = mpsc::channel::<WatchMessage>(EVENT_CHANNEL_CAPACITY);

        // Events raised before the worker exists wait in the channel.
        let watched = spawn_blocking(move || init_watchers(&roots, tx))
            .await
            .map_err(|join_err| {
                IngestError::Watch(format!(
                    "watcher initialization panicked: {join_err}"
                ))
            })?;

        if watched.is_empty() {
            return Err(IngestError::Watch(
                "none of the configured directories could be watched".into(),
            ));
        }

        let (roots, watchers): (Vec<_>, Vec<_>) = watched.into_iter().unzip();
        let worker = spawn_worker(roots.clone(), pipeline, rx);

        Ok(Self {
            roots,
            watchers,
            worker: Some(worker),
            state: WatchState::Watching,
        })
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Resolved roots that are actually being watched.
    pub fn roots(&self) -> &[WatchedRoot] {
        &self.roots
    }

    /// Stop every subscription, let the worker finish queued events and its
    /// final flush, and join it.
    pub async fn shutdown(&mut self) {
        if self.state == WatchState::Stopped {
            return;
        }

        // Dropping the watchers stops notify streams and releases the last
        // senders, which closes the channel.
        self.watchers.clear();

        if let Some(worker) = self.worker.take()
            && let Err(join_err) = worker.await
        {
            error!(error = %join_err, "pipeline worker terminated abnormally");
        }

        self.state = WatchState::Stopped;
        info!("stopped watching");
    }
}

fn spawn_worker<S, P>(
    roots: Vec<WatchedRoot>,
    mut pipeline: IngestPipeline<S, P>,
    mut rx: mpsc::Receiver<WatchMessage>,
) -> JoinHandle<()>
where
    S: ArchiveSink + 'static,
    P: ReadProbe + 'static,
{
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match msg {
                WatchMessage::Event(event) => {
                    for file_event in convert_event(&roots, event) {
                        pipeline.handle_event(file_event).await;
                    }
                }
                WatchMessage::Error(message) => {
                    warn!(error = %message, "filesystem watcher reported an error");
                }
            }
        }

        pipeline.finish().await;
        debug!("pipeline worker drained");
    })
}

/// Map a raw notification onto pipeline events. Only creations inside a
/// watched root are kept.
pub fn convert_event(roots: &[WatchedRoot], event: Event) -> Vec<FileEvent> {
    let EventKind::Create(kind) = event.kind else {
        return Vec::new();
    };

    event
        .paths
        .into_iter()
        .filter(|path| roots.iter().any(|root| root.contains(path)))
        .map(|path| match kind {
            CreateKind::Folder => FileEvent::DirectoryCreated(path),
            CreateKind::File => FileEvent::Created(path),
            CreateKind::Any | CreateKind::Other => classify_by_path(path),
        })
        .collect()
}

fn classify_by_path(path: std::path::PathBuf) -> FileEvent {
    if path.is_dir() {
        FileEvent::DirectoryCreated(path)
    } else {
        FileEvent::Created(path)
    }
}

fn init_watchers(
    roots: &[WatchedRoot],
    tx: mpsc::Sender<WatchMessage>,
) -> Vec<(WatchedRoot, RecommendedWatcher)> {
    let mut watched = Vec::with_capacity(roots.len());
    for root in roots {
        let resolved = match std::fs::canonicalize(root.path()) {
            Ok(path) => WatchedRoot::new(path),
            Err(err) => {
                error!(root = %root, error = %err, "cannot resolve directory");
                continue;
            }
        };
        match watch_root(resolved.path(), tx.clone()) {
            Ok(watcher) => {
                info!(root = %root, resolved = %resolved, "watching directory");
                watched.push((resolved, watcher));
            }
            Err(err) => {
                error!(root = %root, error = %err, "failed to watch directory");
            }
        }
    }
    watched
}

fn watch_root(
    root: &Path,
    tx: mpsc::Sender<WatchMessage>,
) -> Result<RecommendedWatcher> {
    let root_display = root.display().to_string();
    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| match res {
            Ok(event) => {
                if let Err(err) = tx.blocking_send(WatchMessage::Event(event)) {
                    warn!(
                        root = %root_display,
                        error = %err,
                        "watch channel closed; dropping event"
                    );
                }
            }
            Err(err) => {
                let _ = tx.blocking_send(WatchMessage::Error(err.to_string()));
            }
        },
        NotifyConfig::default(),
    )
    .map_err(|err| {
        IngestError::Watch(format!(
            "failed to create watcher for {}: {err}",
            root.display()
        ))
    })?;

    watcher.watch(root, RecursiveMode::Recursive).map_err(|err| {
        IngestError::Watch(format!("failed to watch {}: {err}", root.display()))
    })?;

    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use notify::event::{ModifyKind, RemoveKind};
    use tempfile::tempdir;

    use super::*;

    fn roots() -> Vec<WatchedRoot> {
        vec![WatchedRoot::new("/in"), WatchedRoot::new("/also")]
    }

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn file_and_folder_creations_are_classified() {
        assert_eq!(
            convert_event(
                &roots(),
                event(EventKind::Create(CreateKind::File), "/in/a.txt")
            ),
            vec![FileEvent::Created(PathBuf::from("/in/a.txt"))]
        );
        assert_eq!(
            convert_event(
                &roots(),
                event(EventKind::Create(CreateKind::Folder), "/also/batch")
            ),
            vec![FileEvent::DirectoryCreated(PathBuf::from("/also/batch"))]
        );
    }

    #[test]
    fn non_creation_events_are_dropped() {
        for kind in [
            EventKind::Modify(ModifyKind::Any),
            EventKind::Remove(RemoveKind::File),
            EventKind::Other,
        ] {
            assert!(convert_event(&roots(), event(kind, "/in/a.txt")).is_empty());
        }
    }

    #[test]
    fn paths_outside_roots_are_dropped() {
        assert!(
            convert_event(
                &roots(),
                event(EventKind::Create(CreateKind::File), "/elsewhere/a.txt")
            )
            .is_empty()
        );
    }

    #[test]
    fn ambiguous_creation_inspects_the_path() {
        let dir = tempdir().unwrap();
        let root = WatchedRoot::new(dir.path());
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, b"f").unwrap();

        let events = convert_event(
            &[root],
            Event::new(EventKind::Create(CreateKind::Any))
                .add_path(sub.clone())
                .add_path(file.clone()),
        );

        assert_eq!(
            events,
            vec![FileEvent::DirectoryCreated(sub), FileEvent::Created(file)]
        );
    }
}
