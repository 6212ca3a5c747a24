use std::path::PathBuf;

use thiserror::Error;

use super::models::Config;
use super::util::{is_loopback, normalize_path};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error(
        "staging directory {staging} is inside watched directory {root}; staged copies would be ingested again"
    )]
    StagingInsideWatchedRoot { staging: PathBuf, root: PathBuf },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    let staging = normalize_path(&config.staging_dir);
    for root in &config.watched_roots {
        if staging.starts_with(normalize_path(root)) {
            return Err(ConfigGuardRailError::StagingInsideWatchedRoot {
                staging: config.staging_dir.clone(),
                root: root.clone(),
            });
        }
    }

    let api_url = &config.submitter.api_url;
    if api_url.scheme() == "http" && !is_loopback(api_url) {
        warnings.push_with_hint(
            format!("API_URL {api_url} is plain http; the session token is sent unencrypted"),
            "Use an https:// endpoint unless the archive is on a trusted network",
        );
    }

    if config.ignored_suffixes.is_empty() {
        warnings.push(
            "IGNORED_SUFFIXES is empty; editor backup files will be archived",
        );
    }

    Ok(warnings)
}
