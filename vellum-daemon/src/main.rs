//! # Vellum
//!
//! Watches one or more drop directories and deposits every new file into a
//! records-archival HTTP API.
//!
//! Configuration is read from the environment (optionally seeded from a
//! `.env` file). `vellum check` validates it without starting the watchers.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vellum_config::{Config, ConfigLoad, ConfigLoader, ConfigWarnings};
use vellum_core::{HttpArchiveClient, IngestPipeline, WatchCoordinator};

const DEFAULT_LOG_FILTER: &str =
    "info,vellum_core=info,reqwest=warn,hyper=warn";

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "vellum")]
#[command(about = "Deposit new files from watched directories into an archive")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Env file to load before reading settings (defaults to ./.env)
    #[arg(long, env = "VELLUM_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, env = "LOG_FORMAT", default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load and validate the configuration, print it, and exit
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.env_file {
        loader = loader.with_env_file(path.clone());
    }
    let ConfigLoad { config, warnings } =
        loader.load().context("failed to load configuration")?;

    init_tracing(cli.log_format);

    if config.source.env_file_loaded
        && let Some(path) = &config.source.env_file
    {
        info!(path = %path.display(), "loaded env file");
    }
    log_warnings(&warnings);

    match cli.command {
        Some(Command::Check) => {
            print_summary(&config, &warnings);
            Ok(())
        }
        None => run(config).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => {
            registry.with(tracing_subscriber::fmt::layer()).init()
        }
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

fn log_warnings(warnings: &ConfigWarnings) {
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => {
                warn!(message = %warning.message, "configuration warning")
            }
        }
    }
}

fn print_summary(config: &Config, warnings: &ConfigWarnings) {
    println!("configuration OK");
    for root in &config.watched_roots {
        println!("  watched directory   {}", root.display());
    }
    println!("  staging directory   {}", config.staging_dir.display());
    println!("  archive endpoint    {}", config.submitter.api_url);
    println!("  batch size          {}", config.batch_size);
    println!(
        "  stabilization       {} attempts, {:?} apart",
        config.stabilizer.max_retries, config.stabilizer.retry_delay
    );
    if !warnings.is_empty() {
        println!("  {} warning(s), see log output", warnings.len());
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.staging_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create staging directory {}",
                config.staging_dir.display()
            )
        })?;
    report_leftovers(&config.staging_dir).await;

    let settings = config.ingest_settings();
    let client = HttpArchiveClient::new(settings.submitter.clone())
        .context("failed to build archive HTTP client")?;
    let pipeline = IngestPipeline::new(&settings, client);

    let mut coordinator =
        WatchCoordinator::start(settings.watched_roots.clone(), pipeline)
            .await
            .context("failed to start directory watchers")?;

    info!(
        roots = coordinator.roots().len(),
        staging = %settings.staging_root.display(),
        api_url = %settings.submitter.api_url,
        batch_size = settings.batch_size,
        "vellum started"
    );

    shutdown_signal().await;
    info!("shutdown requested; draining queued events");
    coordinator.shutdown().await;

    Ok(())
}

/// Entries left by an earlier run are not part of any batch; they go away
/// with the next accepted submission.
async fn report_leftovers(staging_dir: &Path) {
    let Ok(mut entries) = tokio::fs::read_dir(staging_dir).await else {
        return;
    };
    let mut count = 0usize;
    while let Ok(Some(_)) = entries.next_entry().await {
        count += 1;
    }
    if count > 0 {
        warn!(
            staging = %staging_dir.display(),
            entries = count,
            "staging directory not empty; leftovers will be purged after the next accepted submission"
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
