//! NFC reader abstraction.
//!
//! The hardware is reached through [`NfcReader`]. Implementations deliver
//! exactly one read or write per call; taking `&mut self` means a caller
//! cannot start a second operation on a reader before the first settles.

mod channel;
mod replay;

use thiserror::Error;

use crate::record::{NdefMessage, NdefRecord};

pub use channel::{ChannelReader, TagFeed, WriteRequest};
pub use replay::ReplayReader;

/// Errors reported by a reader backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    /// The backend cannot scan or write on this platform.
    #[error("NFC is not supported by this reader")]
    Unsupported,

    /// The user refused the permission prompt or dismissed the operation.
    #[error("permission denied")]
    PermissionDenied,

    /// The tag could not be read.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// The tag could not be written.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// The backend went away while an operation was pending.
    #[error("reader disconnected")]
    Disconnected,
}

/// Result type for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// A platform NFC capability.
#[async_trait::async_trait]
pub trait NfcReader: Send + Sync {
    /// The name of this backend (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Check if NFC scanning and writing are available.
    fn is_supported(&self) -> bool;

    /// Check if the execution context is trusted enough for NFC.
    fn is_secure_context(&self) -> bool;

    /// Wait for one tag and return its records.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the user denies permission.
    async fn scan_once(&mut self) -> Result<NdefMessage>;

    /// Write the records to the next tag presented.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the user denies permission.
    async fn write_records(&mut self, records: Vec<NdefRecord>) -> Result<()>;
}

/// Snapshot of what a reader can do right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderStatus {
    /// Backend name.
    pub name: &'static str,

    /// Whether NFC is available.
    pub supported: bool,

    /// Whether the context is secure.
    pub secure_context: bool,

    /// Human-readable status message.
    pub message: String,
}

impl ReaderStatus {
    /// Probe a reader.
    #[must_use]
    pub fn probe(reader: &dyn NfcReader) -> Self {
        let supported = reader.is_supported();
        let secure_context = reader.is_secure_context();
        let message = if !secure_context {
            "Insecure context, NFC is blocked"
        } else if !supported {
            "NFC not available"
        } else {
            "Ready"
        };

        Self {
            name: reader.name(),
            supported,
            secure_context,
            message: message.to_string(),
        }
    }

    /// Check if both probes pass.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.supported && self.secure_context
    }
}
