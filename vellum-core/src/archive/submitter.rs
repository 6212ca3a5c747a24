use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, USER_AGENT};
use tracing::debug;

use crate::archive::payload::ArchivePayload;
use crate::error::{IngestError, Result};
use crate::settings::SubmitterSettings;

const JSON: &str = "application/json";
const AUTH_COOKIE: &str = "LAABS-AUTH";

/// Destination for archive payloads.
///
/// `Ok` means the archive accepted the deposit. Rejections surface as
/// [`IngestError::HttpStatus`], network failures as
/// [`IngestError::Transport`].
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    async fn submit(&self, payload: &ArchivePayload<'_>) -> Result<()>;
}

/// Posts payloads to the archive API over HTTP.
#[derive(Clone)]
pub struct HttpArchiveClient {
    http_client: reqwest::Client,
    settings: SubmitterSettings,
}

impl fmt::Debug for HttpArchiveClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpArchiveClient")
            .field("api_url", &self.settings.api_url.as_str())
            .field("user_agent", &self.settings.user_agent)
            .field("timeout", &self.settings.timeout)
            .finish()
    }
}

impl HttpArchiveClient {
    pub fn new(settings: SubmitterSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            http_client,
            settings,
        })
    }

    pub fn settings(&self) -> &SubmitterSettings {
        &self.settings
    }
}

#[async_trait]
impl ArchiveSink for HttpArchiveClient {
    async fn submit(&self, payload: &ArchivePayload<'_>) -> Result<()> {
        let body = serde_json::to_vec(payload)?;
        let cookie =
            format!("{AUTH_COOKIE}={}", self.settings.auth_token.expose());

        debug!(
            url = %self.settings.api_url,
            records = payload.archive.digital_resources.len(),
            bytes = body.len(),
            "posting archive payload"
        );

        let response = self
            .http_client
            .post(self.settings.api_url.clone())
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON)
            .header(USER_AGENT, self.settings.user_agent.as_str())
            .header(COOKIE, cookie)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        // The body is diagnostic text only.
        let body = response.text().await.unwrap_or_default();
        Err(IngestError::HttpStatus { status, body })
    }
}
