use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use vellum_config::{
    ConfigGuardRailError, ConfigLoad, ConfigLoadError, ConfigLoader, EnvConfig,
};

struct Env {
    dir: TempDir,
    vars: HashMap<String, String>,
}

impl Env {
    fn complete() -> Self {
        let dir = TempDir::new().unwrap();
        let mut vars = HashMap::new();
        let input = dir.path().join("in");
        let staging = dir.path().join("staging");
        vars.insert("WATCHED_DIRS".into(), input.display().to_string());
        vars.insert("TEMP_DIR".into(), staging.display().to_string());
        vars.insert(
            "API_URL".into(),
            "https://archive.example/recordsManagement/archive".into(),
        );
        vars.insert("LAABS_AUTH".into(), "session-token".into());
        vars.insert("ARCHIVAL_PROFILE_REFERENCE".into(), "invoice".into());
        vars.insert("SERVICE_LEVEL_REFERENCE".into(), "serviceLevel_001".into());
        vars.insert("DESCRIPTION_CLASS".into(), "archivesPubliques".into());
        vars.insert("DESCRIPTION_LEVEL".into(), "Item".into());
        Self { dir, vars }
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    fn unset(mut self, key: &str) -> Self {
        self.vars.remove(key);
        self
    }

    fn compose(&self) -> Result<ConfigLoad, ConfigLoadError> {
        ConfigLoader::compose(EnvConfig::from_lookup(|key| {
            self.vars.get(key).cloned()
        }))
    }
}

#[test]
fn defaults_apply_to_optional_settings() {
    let env = Env::complete();

    let ConfigLoad { config, warnings } = env.compose().unwrap();

    assert!(warnings.is_empty(), "{warnings:?}");
    assert_eq!(config.watched_roots, vec![env.path("in")]);
    assert_eq!(config.staging_dir, env.path("staging"));
    assert_eq!(config.batch_size, 1);
    assert_eq!(config.stabilizer.max_retries, 5);
    assert_eq!(config.stabilizer.retry_delay, Duration::from_secs(1));
    assert_eq!(config.submitter.timeout, Duration::from_secs(30));
    assert_eq!(config.submitter.user_agent, "service");
    assert_eq!(config.submitter.auth_token.expose(), "session-token");
    assert_eq!(config.metadata.full_text_indexation, "none");
    assert_eq!(config.metadata.archival_profile_reference, "invoice");
    assert_eq!(config.ignored_suffixes, vec!["~"]);

    let settings = config.ingest_settings();
    assert_eq!(settings.watched_roots.len(), 1);
    assert_eq!(settings.staging_root, env.path("staging"));
}

#[test]
fn optional_settings_are_parsed() {
    let env = Env::complete()
        .set("BATCH_SIZE", "4")
        .set("STABILIZE_MAX_RETRIES", "10")
        .set("STABILIZE_RETRY_DELAY", "250ms")
        .set("API_TIMEOUT", "2m")
        .set("USER_AGENT", "scanner-01")
        .set("FULL_TEXT_INDEXATION", "requested")
        .set("IGNORED_SUFFIXES", "~, .part ,.tmp");

    let config = env.compose().unwrap().config;

    assert_eq!(config.batch_size, 4);
    assert_eq!(config.stabilizer.max_retries, 10);
    assert_eq!(config.stabilizer.retry_delay, Duration::from_millis(250));
    assert_eq!(config.submitter.timeout, Duration::from_secs(120));
    assert_eq!(config.submitter.user_agent, "scanner-01");
    assert_eq!(config.metadata.full_text_indexation, "requested");
    assert_eq!(config.ignored_suffixes, vec!["~", ".part", ".tmp"]);
}

#[test]
fn missing_or_blank_required_settings_fail() {
    for key in [
        "TEMP_DIR",
        "API_URL",
        "LAABS_AUTH",
        "ARCHIVAL_PROFILE_REFERENCE",
        "SERVICE_LEVEL_REFERENCE",
        "DESCRIPTION_CLASS",
        "DESCRIPTION_LEVEL",
    ] {
        for env in [Env::complete().unset(key), Env::complete().set(key, "  ")]
        {
            match env.compose() {
                Err(ConfigLoadError::MissingVar { name }) => {
                    assert_eq!(name, key)
                }
                other => panic!("{key}: expected MissingVar, got {other:?}"),
            }
        }
    }
}

#[test]
fn watched_dirs_accepts_several_roots_and_collapses_duplicates() {
    let base = Env::complete();
    let a = base.path("a").display().to_string();
    let b = base.path("b").display().to_string();
    let env = base.set("WATCHED_DIRS", format!("{a}, {b},{a}/./"));

    let ConfigLoad { config, warnings } = env.compose().unwrap();

    assert_eq!(config.watched_roots, vec![env.path("a"), env.path("b")]);
    assert_eq!(warnings.len(), 1);
}

#[test]
fn legacy_watched_dir_is_accepted_with_a_warning() {
    let base = Env::complete();
    let legacy = base.path("legacy").display().to_string();
    let env = base.unset("WATCHED_DIRS").set("WATCHED_DIR", legacy);

    let ConfigLoad { config, warnings } = env.compose().unwrap();

    assert_eq!(config.watched_roots, vec![env.path("legacy")]);
    assert!(config.source.legacy_watched_dir);
    assert_eq!(warnings.len(), 1);
    assert!(warnings.items[0].hint.is_some());
}

#[test]
fn no_watched_directory_fails() {
    let env = Env::complete().unset("WATCHED_DIRS");
    assert!(matches!(
        env.compose(),
        Err(ConfigLoadError::MissingVar { name: "WATCHED_DIRS" })
    ));

    let env = Env::complete().set("WATCHED_DIRS", " , ");
    assert!(matches!(
        env.compose(),
        Err(ConfigLoadError::MissingVar { name: "WATCHED_DIRS" })
    ));
}

#[test]
fn invalid_values_name_the_setting() {
    let cases = [
        ("BATCH_SIZE", "0"),
        ("BATCH_SIZE", "lots"),
        ("STABILIZE_MAX_RETRIES", "0"),
        ("STABILIZE_RETRY_DELAY", "a while"),
        ("API_TIMEOUT", "30"),
        ("API_URL", "not a url"),
        ("API_URL", "ftp://archive.example/upload"),
    ];

    for (key, value) in cases {
        match Env::complete().set(key, value).compose() {
            Err(ConfigLoadError::InvalidVar { name, .. }) => {
                assert_eq!(name, key, "{value}")
            }
            other => panic!("{key}={value}: expected InvalidVar, got {other:?}"),
        }
    }
}

#[test]
fn staging_inside_watched_root_is_refused() {
    let base = Env::complete();
    let nested = base.path("in/.staging").display().to_string();
    let env = base.set("TEMP_DIR", nested);

    assert!(matches!(
        env.compose(),
        Err(ConfigLoadError::GuardRail(
            ConfigGuardRailError::StagingInsideWatchedRoot { .. }
        ))
    ));
}

#[test]
fn plain_http_to_remote_archive_warns() {
    let env = Env::complete().set("API_URL", "http://archive.example/archive");

    let ConfigLoad { warnings, .. } = env.compose().unwrap();

    assert_eq!(warnings.len(), 1);
    assert!(warnings.items[0].message.contains("plain http"));
}

#[test]
fn token_does_not_leak_through_debug() {
    let config = Env::complete().compose().unwrap().config;

    assert!(!format!("{config:?}").contains("session-token"));
}
