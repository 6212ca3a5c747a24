/// Environment variable names read by the loader.
pub mod keys {
    pub const WATCHED_DIRS: &str = "WATCHED_DIRS";
    pub const WATCHED_DIR: &str = "WATCHED_DIR";
    pub const TEMP_DIR: &str = "TEMP_DIR";
    pub const API_URL: &str = "API_URL";
    pub const LAABS_AUTH: &str = "LAABS_AUTH";
    pub const ARCHIVAL_PROFILE_REFERENCE: &str = "ARCHIVAL_PROFILE_REFERENCE";
    pub const SERVICE_LEVEL_REFERENCE: &str = "SERVICE_LEVEL_REFERENCE";
    pub const DESCRIPTION_CLASS: &str = "DESCRIPTION_CLASS";
    pub const DESCRIPTION_LEVEL: &str = "DESCRIPTION_LEVEL";
    pub const FULL_TEXT_INDEXATION: &str = "FULL_TEXT_INDEXATION";
    pub const STABILIZE_MAX_RETRIES: &str = "STABILIZE_MAX_RETRIES";
    pub const STABILIZE_RETRY_DELAY: &str = "STABILIZE_RETRY_DELAY";
    pub const BATCH_SIZE: &str = "BATCH_SIZE";
    pub const API_TIMEOUT: &str = "API_TIMEOUT";
    pub const USER_AGENT: &str = "USER_AGENT";
    pub const IGNORED_SUFFIXES: &str = "IGNORED_SUFFIXES";
}

/// Environment-derived configuration values, unparsed. Blank values are
/// recorded as absent.
#[derive(Default, Clone)]
pub struct EnvConfig {
    pub watched_dirs: Option<String>,
    pub watched_dir: Option<String>,
    pub temp_dir: Option<String>,
    pub api_url: Option<String>,
    pub laabs_auth: Option<String>,
    pub archival_profile_reference: Option<String>,
    pub service_level_reference: Option<String>,
    pub description_class: Option<String>,
    pub description_level: Option<String>,
    pub full_text_indexation: Option<String>,
    pub stabilize_max_retries: Option<String>,
    pub stabilize_retry_delay: Option<String>,
    pub batch_size: Option<String>,
    pub api_timeout: Option<String>,
    pub user_agent: Option<String>,
    pub ignored_suffixes: Option<String>,
}

impl std::fmt::Debug for EnvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvConfig")
            .field("watched_dirs", &self.watched_dirs)
            .field("watched_dir", &self.watched_dir)
            .field("temp_dir", &self.temp_dir)
            .field("api_url", &self.api_url)
            .field(
                "laabs_auth",
                &self.laabs_auth.as_ref().map(|_| "<redacted>"),
            )
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key).filter(|value| !value.trim().is_empty())
        };

        Self {
            watched_dirs: var(keys::WATCHED_DIRS),
            watched_dir: var(keys::WATCHED_DIR),
            temp_dir: var(keys::TEMP_DIR),
            api_url: var(keys::API_URL),
            laabs_auth: var(keys::LAABS_AUTH),
            archival_profile_reference: var(keys::ARCHIVAL_PROFILE_REFERENCE),
            service_level_reference: var(keys::SERVICE_LEVEL_REFERENCE),
            description_class: var(keys::DESCRIPTION_CLASS),
            description_level: var(keys::DESCRIPTION_LEVEL),
            full_text_indexation: var(keys::FULL_TEXT_INDEXATION),
            stabilize_max_retries: var(keys::STABILIZE_MAX_RETRIES),
            stabilize_retry_delay: var(keys::STABILIZE_RETRY_DELAY),
            batch_size: var(keys::BATCH_SIZE),
            api_timeout: var(keys::API_TIMEOUT),
            user_agent: var(keys::USER_AGENT),
            ignored_suffixes: var(keys::IGNORED_SUFFIXES),
        }
    }
}
