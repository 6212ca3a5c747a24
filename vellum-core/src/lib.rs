//! # Vellum Core
//!
//! The ingestion pipeline behind the Vellum daemon: new files appearing in
//! watched directories are stabilized, copied into a staging area, encoded,
//! batched and deposited into a records-archival HTTP API. Staged copies are
//! reclaimed once the archive accepts a submission.
//!
//! ## Architecture
//!
//! - [`fs_watch`]: `notify` subscriptions per watched root feeding a single
//!   pipeline worker, plus directory expansion
//! - [`staging`]: readiness polling, staging copies, staging purge
//! - [`encode`]: base64 content and media type detection
//! - [`archive`]: the pending batch, deposit payload, and HTTP client
//! - [`pipeline`]: per-event orchestration of the above
//! - [`settings`]: immutable runtime settings built at startup
//!
//! ## Example
//!
//! ```no_run
//! use vellum_core::{
//!     HttpArchiveClient, IngestPipeline, IngestSettings, WatchCoordinator,
//! };
//!
//! async fn run(settings: IngestSettings) -> vellum_core::Result<()> {
//!     let client = HttpArchiveClient::new(settings.submitter.clone())?;
//!     let pipeline = IngestPipeline::new(&settings, client);
//!     let mut coordinator =
//!         WatchCoordinator::start(settings.watched_roots.clone(), pipeline)
//!             .await?;
//!     tokio::signal::ctrl_c().await.ok();
//!     coordinator.shutdown().await;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Archive batch, deposit payload and submission client
pub mod archive;

/// Base64 encoding and media type detection for staged files
pub mod encode;

/// Error types for the ingestion pipeline
pub mod error;

/// Filesystem watching and directory expansion
pub mod fs_watch;

/// Pipeline values: roots, events, staged files, records
pub mod model;

/// Per-event orchestration
pub mod pipeline;

/// Runtime settings
pub mod settings;

/// Staging area management
pub mod staging;

pub use archive::{
    ArchivePayload, ArchiveSink, HttpArchiveClient, SubmissionBatch,
    build_payload,
};
pub use error::{IngestError, Result};
pub use fs_watch::{WatchCoordinator, WatchState};
pub use model::{FileEvent, PendingFileRecord, StagedFile, WatchedRoot};
pub use pipeline::{FileOutcome, IngestPipeline};
pub use settings::{
    ArchiveMetadata, AuthToken, IngestSettings, StabilizerSettings,
    SubmitterSettings,
};
