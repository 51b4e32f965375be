//! File-backed reader.
//!
//! Stands in for a tag with a JSON dump of its records. Scanning reads the
//! dump, writing replaces it, so a tag written with `nfclink write` can be
//! scanned back with `nfclink scan`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{NfcReader, ReaderError, Result};
use crate::record::{NdefMessage, NdefRecord};

/// A reader that replays a tag dump file.
#[derive(Debug, Clone, Default)]
pub struct ReplayReader {
    tag_file: Option<PathBuf>,
}

impl ReplayReader {
    /// Create a reader over the given dump file.
    ///
    /// Without a file the reader reports NFC as unsupported.
    #[must_use]
    pub fn new(tag_file: Option<PathBuf>) -> Self {
        Self { tag_file }
    }

    /// The dump file, if one is configured.
    #[must_use]
    pub fn tag_file(&self) -> Option<&Path> {
        self.tag_file.as_deref()
    }
}

fn io_error(err: &std::io::Error, path: &Path, wrap: fn(String) -> ReaderError) -> ReaderError {
    if err.kind() == ErrorKind::PermissionDenied {
        ReaderError::PermissionDenied
    } else {
        wrap(format!("{}: {err}", path.display()))
    }
}

#[async_trait::async_trait]
impl NfcReader for ReplayReader {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn is_supported(&self) -> bool {
        self.tag_file.is_some()
    }

    fn is_secure_context(&self) -> bool {
        // Local files travel over no transport.
        true
    }

    async fn scan_once(&mut self) -> Result<NdefMessage> {
        let path = self.tag_file.as_deref().ok_or(ReaderError::Unsupported)?;
        debug!(path = %path.display(), "Reading tag dump");

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| io_error(&e, path, ReaderError::ReadFailed))?;

        serde_json::from_str(&contents).map_err(|e| {
            ReaderError::ReadFailed(format!("{}: invalid tag dump: {e}", path.display()))
        })
    }

    async fn write_records(&mut self, records: Vec<NdefRecord>) -> Result<()> {
        let path = self.tag_file.as_deref().ok_or(ReaderError::Unsupported)?;

        let message = NdefMessage::new(records);
        let json = serde_json::to_string_pretty(&message)
            .map_err(|e| ReaderError::WriteFailed(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(&e, parent, ReaderError::WriteFailed))?;
        }

        tokio::fs::write(path, json)
            .await
            .map_err(|e| io_error(&e, path, ReaderError::WriteFailed))?;

        info!(path = %path.display(), records = message.records.len(), "Tag dump written");
        Ok(())
    }
}
