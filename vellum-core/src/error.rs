use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("{path} still unreadable after {attempts} attempts")]
    StabilizationTimeout { path: PathBuf, attempts: u32 },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive API responded {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },

    #[error("archive API unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Watcher error: {0}")]
    Watch(String),
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IngestError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures of the archive submission itself, after which the
    /// batch is retained for the next attempt.
    pub fn is_submission_failure(&self) -> bool {
        matches!(
            self,
            IngestError::HttpStatus { .. } | IngestError::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
