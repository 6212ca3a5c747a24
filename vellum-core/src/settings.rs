//! Immutable runtime settings for the pipeline.
//!
//! These are built once at startup (see `vellum-config`) and moved into the
//! watch coordinator; nothing in the pipeline reads the environment.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::model::WatchedRoot;

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_BATCH_SIZE: usize = 1;
pub const DEFAULT_FULL_TEXT_INDEXATION: &str = "none";
pub const DEFAULT_USER_AGENT: &str = "service";
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

/// Readability polling policy for freshly created files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilizerSettings {
    /// Total number of readability attempts, including the first.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for StabilizerSettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Descriptive metadata stamped on every archive payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMetadata {
    pub archival_profile_reference: String,
    pub service_level_reference: String,
    pub description_class: String,
    pub description_level: String,
    pub full_text_indexation: String,
}

/// Session token sent as the `LAABS-AUTH` cookie. Cleared from memory when
/// dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AuthToken").field(&"<redacted>").finish()
    }
}

/// Where and how archive payloads are delivered.
#[derive(Debug, Clone)]
pub struct SubmitterSettings {
    pub api_url: Url,
    pub auth_token: AuthToken,
    pub user_agent: String,
    pub timeout: Duration,
}

impl SubmitterSettings {
    pub fn new(api_url: Url, auth_token: AuthToken) -> Self {
        Self {
            api_url,
            auth_token,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_API_TIMEOUT,
        }
    }
}

/// Everything the watch coordinator and its pipeline worker need.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub watched_roots: Vec<WatchedRoot>,
    pub staging_root: PathBuf,
    /// Number of pending records that triggers a submission.
    pub batch_size: usize,
    /// File name suffixes skipped without staging (editor backups etc).
    pub ignored_suffixes: Vec<String>,
    pub stabilizer: StabilizerSettings,
    pub metadata: ArchiveMetadata,
    pub submitter: SubmitterSettings,
}

/// Whether `file_name` ends with one of the non-empty `suffixes`.
pub fn has_ignored_suffix(file_name: &str, suffixes: &[String]) -> bool {
    suffixes
        .iter()
        .any(|suffix| !suffix.is_empty() && file_name.ends_with(suffix.as_str()))
}
