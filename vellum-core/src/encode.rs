//! Turns a staged file into a transport-safe record.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::fs;

use crate::error::{IngestError, Result};
use crate::model::{PendingFileRecord, StagedFile};

/// Media type used when the extension is not in the table.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Read the staged copy into memory and base64 it. The size comes from the
/// filesystem, not from the decoded bytes.
pub async fn encode(staged: &StagedFile) -> Result<PendingFileRecord> {
    let bytes = fs::read(&staged.path)
        .await
        .map_err(|err| IngestError::io(&staged.path, err))?;
    let size = fs::metadata(&staged.path)
        .await
        .map_err(|err| IngestError::io(&staged.path, err))?
        .len();

    Ok(PendingFileRecord {
        encoded_content: STANDARD.encode(&bytes),
        size_bytes: size.to_string(),
        file_name: staged.archival_name.clone(),
        mime_type: guess_mime_type(&staged.path),
    })
}

pub fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}
