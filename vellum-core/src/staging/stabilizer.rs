//! Readiness detection for files that may still be written by another
//! process.

use std::fmt;
use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};
use crate::settings::StabilizerSettings;

/// Single readability check against a path.
#[async_trait]
pub trait ReadProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> io::Result<()>;
}

/// Opens the file and reads it through once. A writer holding an exclusive
/// lock makes either step fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenReadProbe;

#[async_trait]
impl ReadProbe for OpenReadProbe {
    async fn probe(&self, path: &Path) -> io::Result<()> {
        let mut file = File::open(path).await?;
        tokio::io::copy(&mut file, &mut tokio::io::sink()).await?;
        Ok(())
    }
}

/// Bounded wait-and-retry loop around a [`ReadProbe`].
pub struct FileStabilizer<P: ReadProbe = OpenReadProbe> {
    settings: StabilizerSettings,
    probe: P,
}

impl<P: ReadProbe> fmt::Debug for FileStabilizer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStabilizer")
            .field("settings", &self.settings)
            .field("probe_type", &std::any::type_name::<P>())
            .finish()
    }
}

impl FileStabilizer<OpenReadProbe> {
    pub fn new(settings: StabilizerSettings) -> Self {
        Self::with_probe(settings, OpenReadProbe)
    }
}

impl<P: ReadProbe> FileStabilizer<P> {
    pub fn with_probe(settings: StabilizerSettings, probe: P) -> Self {
        Self { settings, probe }
    }

    pub fn settings(&self) -> &StabilizerSettings {
        &self.settings
    }

    /// Wait until `path` can be read, sleeping `retry_delay` between at most
    /// `max_retries` attempts. A vanished file fails immediately.
    pub async fn await_readable(&self, path: &Path) -> Result<()> {
        let attempts = self.settings.max_retries.max(1);

        for attempt in 1..=attempts {
            match self.probe.probe(path).await {
                Ok(()) => {
                    if attempt > 1 {
                        debug!(
                            path = %path.display(),
                            attempt,
                            "file became readable"
                        );
                    }
                    return Ok(());
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    return Err(IngestError::io(path, err));
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        attempt,
                        max_attempts = attempts,
                        error = %err,
                        "file is in use, retrying"
                    );
                    if attempt < attempts {
                        sleep(self.settings.retry_delay).await;
                    }
                }
            }
        }

        Err(IngestError::StabilizationTimeout {
            path: path.to_path_buf(),
            attempts,
        })
    }
}
