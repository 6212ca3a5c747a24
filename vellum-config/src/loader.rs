use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;
use url::Url;
use vellum_core::settings::{
    DEFAULT_API_TIMEOUT, DEFAULT_BATCH_SIZE, DEFAULT_FULL_TEXT_INDEXATION,
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, DEFAULT_USER_AGENT,
};
use vellum_core::{
    ArchiveMetadata, AuthToken, StabilizerSettings, SubmitterSettings,
};

use super::{
    models::{Config, ConfigMetadata},
    sources::{EnvConfig, keys},
    util::{normalize_path, parse_csv, parse_duration, parse_positive},
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_IGNORED_SUFFIXES: &str = "~";

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load the env file (if any) into the process environment, then read and
    /// validate every setting. Variables already set take precedence over the
    /// file.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file = self
            .options
            .env_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE));

        let env_file_loaded =
            dotenvy::from_path(&env_file).map(|_| true).or_else(|err| {
                match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                }
            })?;
        debug!(path = %env_file.display(), loaded = env_file_loaded, "env file");

        let mut load = Self::compose(EnvConfig::gather())?;
        load.config.source.env_file = Some(env_file.clone());
        load.config.source.env_file_loaded = env_file_loaded;

        if !env_file_loaded && self.options.env_file.is_some() {
            load.warnings.push(format!(
                "env file {} not found; using the process environment only",
                env_file.display()
            ));
        }

        Ok(load)
    }

    /// Turn gathered values into a validated [`Config`].
    pub fn compose(env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();
        let mut source = ConfigMetadata::default();

        let watched_roots = match (&env.watched_dirs, &env.watched_dir) {
            (Some(list), _) => parse_csv(list),
            (None, Some(single)) => {
                source.legacy_watched_dir = true;
                warnings.push_with_hint(
                    "WATCHED_DIR is deprecated",
                    "Rename it to WATCHED_DIRS; it accepts a comma separated list",
                );
                vec![single.trim().to_string()]
            }
            (None, None) => Vec::new(),
        };
        if watched_roots.is_empty() {
            return Err(ConfigLoadError::MissingVar {
                name: keys::WATCHED_DIRS,
            });
        }
        let watched_roots = dedup_roots(watched_roots, &mut warnings);

        let staging_dir =
            PathBuf::from(required(&env.temp_dir, keys::TEMP_DIR)?);
        let api_url = parse_api_url(required(&env.api_url, keys::API_URL)?)?;
        let auth_token = AuthToken::new(required(&env.laabs_auth, keys::LAABS_AUTH)?);

        let metadata = ArchiveMetadata {
            archival_profile_reference: required(
                &env.archival_profile_reference,
                keys::ARCHIVAL_PROFILE_REFERENCE,
            )?
            .to_string(),
            service_level_reference: required(
                &env.service_level_reference,
                keys::SERVICE_LEVEL_REFERENCE,
            )?
            .to_string(),
            description_class: required(
                &env.description_class,
                keys::DESCRIPTION_CLASS,
            )?
            .to_string(),
            description_level: required(
                &env.description_level,
                keys::DESCRIPTION_LEVEL,
            )?
            .to_string(),
            full_text_indexation: env
                .full_text_indexation
                .clone()
                .unwrap_or_else(|| DEFAULT_FULL_TEXT_INDEXATION.to_string()),
        };

        let stabilizer = StabilizerSettings {
            max_retries: optional(
                &env.stabilize_max_retries,
                keys::STABILIZE_MAX_RETRIES,
                parse_positive,
            )?
            .unwrap_or(DEFAULT_MAX_RETRIES),
            retry_delay: optional(
                &env.stabilize_retry_delay,
                keys::STABILIZE_RETRY_DELAY,
                parse_duration,
            )?
            .unwrap_or(DEFAULT_RETRY_DELAY),
        };

        let batch_size =
            optional(&env.batch_size, keys::BATCH_SIZE, parse_positive)?
                .unwrap_or(DEFAULT_BATCH_SIZE);

        let mut submitter = SubmitterSettings::new(api_url, auth_token);
        submitter.timeout =
            optional(&env.api_timeout, keys::API_TIMEOUT, parse_duration)?
                .unwrap_or(DEFAULT_API_TIMEOUT);
        submitter.user_agent = env
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let ignored_suffixes = parse_csv(
            env.ignored_suffixes
                .as_deref()
                .unwrap_or(DEFAULT_IGNORED_SUFFIXES),
        );

        let config = Config {
            watched_roots,
            staging_dir,
            submitter,
            metadata,
            stabilizer,
            batch_size,
            ignored_suffixes,
            source,
        };

        warnings.extend(validation::apply_guard_rails(&config)?);

        Ok(ConfigLoad { config, warnings })
    }
}

fn required<'a>(
    value: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, ConfigLoadError> {
    value
        .as_deref()
        .map(str::trim)
        .ok_or(ConfigLoadError::MissingVar { name })
}

fn optional<T>(
    value: &Option<String>,
    name: &'static str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Option<T>, ConfigLoadError> {
    value
        .as_deref()
        .map(|raw| {
            parse(raw).map_err(|reason| ConfigLoadError::InvalidVar {
                name,
                value: raw.to_string(),
                reason,
            })
        })
        .transpose()
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigLoadError> {
    let invalid = |reason: String| ConfigLoadError::InvalidVar {
        name: keys::API_URL,
        value: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// Keep the first occurrence of each root, comparing normalized paths.
fn dedup_roots(
    roots: Vec<String>,
    warnings: &mut ConfigWarnings,
) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(roots.len());
    for raw in roots {
        let path = PathBuf::from(&raw);
        if seen.insert(normalize_path(&path)) {
            unique.push(path);
        } else {
            warnings.push(format!(
                "watched directory {raw} listed more than once; watching it once"
            ));
        }
    }
    unique
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("required setting {name} is not set")]
    MissingVar { name: &'static str },
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
