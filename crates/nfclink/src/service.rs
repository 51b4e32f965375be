//! Scan and write operations over an [`NfcReader`].
//!
//! Both operations refuse to touch the reader unless the context is secure
//! and NFC is supported, in that order.

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::destination::is_valid_url;
use crate::error::{Error, Result};
use crate::interpret::interpret;
use crate::reader::{NfcReader, ReaderError};
use crate::record::{NdefRecord, ScanResult};

/// NFC operations backed by a reader.
#[derive(Debug)]
pub struct NfcService<R> {
    reader: R,
}

impl<R: NfcReader> NfcService<R> {
    /// Create a service over a reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Borrow the underlying reader.
    #[must_use]
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Check if the reader reports NFC support.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.reader.is_supported()
    }

    /// Check if the reader reports a secure context.
    #[must_use]
    pub fn is_secure_context(&self) -> bool {
        self.reader.is_secure_context()
    }

    /// Scan one tag and interpret its records.
    ///
    /// # Errors
    ///
    /// Returns an error if NFC is unusable here, the read fails or is
    /// refused, or a text record on the tag is malformed.
    #[instrument(skip(self), fields(reader = self.reader.name()))]
    pub async fn scan_once(&mut self) -> Result<ScanResult> {
        self.ensure_usable()?;

        let message = self.reader.scan_once().await.map_err(|err| {
            warn!(error = %err, "Scan failed");
            match err {
                ReaderError::PermissionDenied => Error::PermissionDeniedOrCancelled,
                ReaderError::Unsupported => Error::UnsupportedPlatform,
                other => Error::ReadFailure(other),
            }
        })?;

        let interpretation = interpret(&message.records)?;
        let result = ScanResult {
            raw_records: interpretation.raw_records,
            best_value: interpretation.best_value,
            best_value_type: interpretation.best_value_type,
            timestamp: Utc::now(),
        };

        info!(
            best_value_type = %result.best_value_type,
            records = result.raw_records.len(),
            "Tag scanned"
        );
        Ok(result)
    }

    /// Write a single URL record to the next tag.
    ///
    /// The URL is trimmed and validated first; invalid input never reaches
    /// the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if NFC is unusable here, the URL is invalid, or the
    /// write fails or is refused.
    #[instrument(skip(self), fields(reader = self.reader.name()))]
    pub async fn write_url(&mut self, url: &str) -> Result<()> {
        self.ensure_usable()?;

        let url = url.trim();
        if !is_valid_url(url) {
            return Err(Error::invalid_url(url));
        }

        self.reader
            .write_records(vec![NdefRecord::url(url)])
            .await
            .map_err(|err| {
                warn!(error = %err, "Write failed");
                match err {
                    ReaderError::PermissionDenied => Error::PermissionDeniedOrCancelled,
                    ReaderError::Unsupported => Error::UnsupportedPlatform,
                    other => Error::WriteFailure(other),
                }
            })?;

        info!(url, "Tag written");
        Ok(())
    }

    fn ensure_usable(&self) -> Result<()> {
        if !self.reader.is_secure_context() {
            debug!("Refusing NFC access from an insecure context");
            return Err(Error::InsecureContext);
        }
        if !self.reader.is_supported() {
            debug!("NFC is not supported by this reader");
            return Err(Error::UnsupportedPlatform);
        }
        Ok(())
    }
}
