use std::path::PathBuf;

use vellum_core::{
    ArchiveMetadata, IngestSettings, StabilizerSettings, SubmitterSettings,
    WatchedRoot,
};

/// Fully resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub watched_roots: Vec<PathBuf>,
    /// Directory where copies wait for submission; purged after each
    /// accepted deposit.
    pub staging_dir: PathBuf,
    pub submitter: SubmitterSettings,
    pub metadata: ArchiveMetadata,
    pub stabilizer: StabilizerSettings,
    pub batch_size: usize,
    pub ignored_suffixes: Vec<String>,
    pub source: ConfigMetadata,
}

/// Where the configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub env_file: Option<PathBuf>,
    pub env_file_loaded: bool,
    pub legacy_watched_dir: bool,
}

impl Config {
    pub fn ingest_settings(&self) -> IngestSettings {
        IngestSettings {
            watched_roots: self
                .watched_roots
                .iter()
                .map(|path| WatchedRoot::new(path.clone()))
                .collect(),
            staging_root: self.staging_dir.clone(),
            batch_size: self.batch_size,
            ignored_suffixes: self.ignored_suffixes.clone(),
            stabilizer: self.stabilizer,
            metadata: self.metadata.clone(),
            submitter: self.submitter.clone(),
        }
    }
}
