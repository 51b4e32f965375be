//! Error types for nfclink.
//!
//! Every failure a user can see maps to one variant here. None of them are
//! retried; the user starts the scan or write again.

use thiserror::Error;

use crate::interpret::RecordError;
use crate::reader::ReaderError;

/// The main error type for nfclink operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Capability Errors ===
    /// The platform has no NFC reader.
    #[error("NFC is not available on this device")]
    UnsupportedPlatform,

    /// NFC requires a secure context and this one is not.
    #[error("HTTPS or localhost is required to use NFC")]
    InsecureContext,

    /// The user refused the permission prompt or dismissed the scan.
    #[error("NFC permission denied or read cancelled")]
    PermissionDeniedOrCancelled,

    // === Tag Errors ===
    /// The reader reported a failed read.
    #[error("could not read the NFC tag: {0}")]
    ReadFailure(#[source] ReaderError),

    /// The reader reported a failed write.
    #[error("could not write the tag: {0}")]
    WriteFailure(#[source] ReaderError),

    /// A text record on the tag could not be decoded.
    #[error("malformed tag record: {0}")]
    MalformedTextRecord(#[from] RecordError),

    /// A URL typed by the user is not an absolute URL.
    #[error("enter a valid URL (got {input:?})")]
    InvalidUrlInput {
        /// The rejected input.
        input: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for nfclink operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an invalid URL input error.
    #[must_use]
    pub fn invalid_url(input: impl Into<String>) -> Self {
        Self::InvalidUrlInput {
            input: input.into(),
        }
    }

    /// Check if this error means NFC cannot be used here at all.
    #[must_use]
    pub fn is_capability_error(&self) -> bool {
        matches!(self, Self::UnsupportedPlatform | Self::InsecureContext)
    }
}
