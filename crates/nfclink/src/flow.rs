//! Scan and write flows.
//!
//! A flow takes the current state by value and returns the next one. The
//! caller owns the state and decides when to render it; nothing here is
//! shared or mutated behind its back.

use serde::Serialize;
use tracing::debug;

use crate::destination::{build_destination_url, is_valid_url};
use crate::error::{Error, Result};
use crate::reader::NfcReader;
use crate::record::ScanResult;
use crate::service::NfcService;

/// Shown when a write is attempted from an insecure context.
const INSECURE_WRITE_MESSAGE: &str = "HTTPS or localhost is required to write NFC.";

/// Shown when a scan is attempted from an insecure context.
const INSECURE_SCAN_MESSAGE: &str = "HTTPS or localhost is required to use NFC.";

/// Shown when the platform has no NFC.
const UNSUPPORTED_MESSAGE: &str = "NFC is not available on this device.";

/// Shown when a typed URL is rejected.
const INVALID_URL_MESSAGE: &str = "Enter a valid URL.";

/// Shown after a successful write.
const WRITE_SUCCESS_MESSAGE: &str = "Tag programmed successfully.";

/// Where a scan stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Idle.
    #[default]
    Ready,
    /// Waiting for the user to bring a tag close.
    Waiting,
    /// A tag was read.
    Read,
    /// NFC cannot be used here.
    Unsupported,
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "Ready to scan"),
            Self::Waiting => write!(f, "Hold the device near the tag"),
            Self::Read => write!(f, "Read"),
            Self::Unsupported => write!(f, "Not supported"),
        }
    }
}

/// Where a write stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    /// Idle.
    #[default]
    Ready,
    /// Waiting for the user to bring a tag close.
    Waiting,
    /// The tag was written.
    Written,
    /// NFC cannot be used here.
    Unsupported,
}

impl std::fmt::Display for WriteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "Ready to write"),
            Self::Waiting => write!(f, "Hold the device near the tag"),
            Self::Written => write!(f, "Write complete"),
            Self::Unsupported => write!(f, "Not supported"),
        }
    }
}

/// State of the scan flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanState {
    /// Current status.
    pub status: ScanStatus,
    /// Message for the last failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The last successful scan, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScanResult>,
    /// Whether a scan is in flight.
    pub scanning: bool,
}

impl ScanState {
    /// Where the current result should lead.
    ///
    /// Without a result, or with an empty value, this is the default redirect.
    #[must_use]
    pub fn destination(&self, default_redirect_url: &str) -> String {
        match &self.result {
            Some(result) if result.has_value() => {
                build_destination_url(&result.best_value, default_redirect_url)
            }
            _ => default_redirect_url.to_string(),
        }
    }

    /// Check if there is anywhere to go.
    #[must_use]
    pub fn has_destination(&self, default_redirect_url: &str) -> bool {
        !self.destination(default_redirect_url).is_empty()
    }
}

/// State of the write flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteState {
    /// Current status.
    pub status: WriteStatus,
    /// Message for the last failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Message for the last success, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
}

/// Arm a scan.
///
/// Clears any previous error and result and checks the probes. When the
/// reader is usable the returned state is `Waiting` with `scanning` set, ready
/// to be rendered before [`finish_scan`] waits for the tag.
#[must_use]
pub fn begin_scan<R: NfcReader>(service: &NfcService<R>, state: ScanState) -> ScanState {
    let mut state = ScanState {
        error: None,
        result: None,
        scanning: false,
        ..state
    };

    if !service.is_secure_context() {
        state.error = Some(INSECURE_SCAN_MESSAGE.to_string());
        state.status = ScanStatus::Unsupported;
        return state;
    }

    if !service.is_supported() {
        state.error = Some(UNSUPPORTED_MESSAGE.to_string());
        state.status = ScanStatus::Unsupported;
        return state;
    }

    state.status = ScanStatus::Waiting;
    state.scanning = true;
    debug!(status = %state.status, "Scan started");
    state
}

/// Wait for the tag of an armed scan.
///
/// A state that is not scanning comes back unchanged. Failures leave the
/// message in `error` and return to `Ready`.
pub async fn finish_scan<R: NfcReader>(
    service: &mut NfcService<R>,
    mut state: ScanState,
) -> ScanState {
    if !state.scanning {
        return state;
    }

    match service.scan_once().await {
        Ok(result) => {
            state.result = Some(result);
            state.status = ScanStatus::Read;
        }
        Err(err) => {
            state.error = Some(user_message(&err));
            state.status = ScanStatus::Ready;
        }
    }

    state.scanning = false;
    state
}

/// Run one scan from start to finish.
pub async fn start_scan<R: NfcReader>(service: &mut NfcService<R>, state: ScanState) -> ScanState {
    let state = begin_scan(service, state);
    finish_scan(service, state).await
}

/// Arm a write.
///
/// Checks the probes and validates the URL without touching the reader. A
/// write that can go ahead comes back `Waiting`.
#[must_use]
pub fn begin_write<R: NfcReader>(
    service: &NfcService<R>,
    state: WriteState,
    url: &str,
) -> WriteState {
    let mut state = WriteState {
        error: None,
        success: None,
        ..state
    };

    if !service.is_secure_context() {
        state.error = Some(INSECURE_WRITE_MESSAGE.to_string());
        state.status = WriteStatus::Unsupported;
        return state;
    }

    if !service.is_supported() {
        state.error = Some(UNSUPPORTED_MESSAGE.to_string());
        state.status = WriteStatus::Unsupported;
        return state;
    }

    if !is_valid_url(url.trim()) {
        state.error = Some(INVALID_URL_MESSAGE.to_string());
        if state.status == WriteStatus::Waiting {
            state.status = WriteStatus::Ready;
        }
        return state;
    }

    state.status = WriteStatus::Waiting;
    debug!(status = %state.status, "Write started");
    state
}

/// Write the URL of an armed write.
///
/// Only a `Waiting` state reaches the reader; anything else comes back
/// unchanged.
pub async fn finish_write<R: NfcReader>(
    service: &mut NfcService<R>,
    mut state: WriteState,
    url: &str,
) -> WriteState {
    if state.status != WriteStatus::Waiting {
        return state;
    }

    match service.write_url(url).await {
        Ok(()) => {
            state.status = WriteStatus::Written;
            state.success = Some(WRITE_SUCCESS_MESSAGE.to_string());
        }
        Err(err) => {
            state.error = Some(user_message(&err));
            state.status = WriteStatus::Ready;
        }
    }

    state
}

/// Write a URL to a tag from start to finish.
pub async fn write_tag<R: NfcReader>(
    service: &mut NfcService<R>,
    state: WriteState,
    url: &str,
) -> WriteState {
    let state = begin_write(service, state, url);
    finish_write(service, state, url).await
}

/// Validate a URL typed by the user.
///
/// # Errors
///
/// Returns [`Error::InvalidUrlInput`] if the trimmed input is not an
/// absolute URL.
pub fn open_manual_url(input: &str) -> Result<String> {
    let url = input.trim();
    if is_valid_url(url) {
        Ok(url.to_string())
    } else {
        Err(Error::invalid_url(url))
    }
}

/// The short message shown to the user for an error.
#[must_use]
pub fn user_message(err: &Error) -> String {
    match err {
        Error::UnsupportedPlatform => UNSUPPORTED_MESSAGE.to_string(),
        Error::InsecureContext => INSECURE_SCAN_MESSAGE.to_string(),
        Error::InvalidUrlInput { .. } => INVALID_URL_MESSAGE.to_string(),
        Error::PermissionDeniedOrCancelled => "NFC permission denied or read cancelled.".to_string(),
        Error::ReadFailure(_) => "Could not read the NFC tag.".to_string(),
        Error::WriteFailure(_) => "Could not write the tag.".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{ChannelReader, ReaderError, TagFeed};
    use crate::record::{BestValueType, NdefMessage, NdefRecord};

    const REDIRECT: &str = "https://fallback";

    async fn wait_until_armed(feed: &TagFeed) {
        while !feed.is_scanning() {
            tokio::task::yield_now().await;
        }
    }

    fn scanned(best_value: &str) -> ScanState {
        ScanState {
            status: ScanStatus::Read,
            error: None,
            result: Some(ScanResult {
                raw_records: Vec::new(),
                best_value: best_value.to_string(),
                best_value_type: BestValueType::Text,
                timestamp: chrono::Utc::now(),
            }),
            scanning: false,
        }
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(ScanStatus::default().to_string(), "Ready to scan");
        assert_eq!(ScanStatus::Waiting.to_string(), "Hold the device near the tag");
        assert_eq!(WriteStatus::default().to_string(), "Ready to write");
        assert_eq!(WriteStatus::Written.to_string(), "Write complete");
    }

    #[test]
    fn test_destination_without_result_is_redirect() {
        let state = ScanState::default();
        assert_eq!(state.destination(REDIRECT), REDIRECT);
        assert!(state.has_destination(REDIRECT));
        assert!(!state.has_destination(""));
    }

    #[test]
    fn test_destination_with_empty_value_is_redirect() {
        assert_eq!(scanned("").destination(REDIRECT), REDIRECT);
    }

    #[test]
    fn test_destination_with_text_value() {
        assert_eq!(
            scanned("plain-text").destination(REDIRECT),
            "https://fallback?tag=plain-text"
        );
        assert_eq!(
            scanned("https://example.com").destination(REDIRECT),
            "https://example.com"
        );
    }

    #[test]
    fn test_open_manual_url() {
        assert_eq!(
            open_manual_url("  https://example.com ").unwrap(),
            "https://example.com"
        );
        assert!(matches!(
            open_manual_url("nope"),
            Err(Error::InvalidUrlInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_scan_success() {
        let (reader, feed) = ChannelReader::new();
        let mut service = NfcService::new(reader);

        tokio::spawn(async move {
            wait_until_armed(&feed).await;
            feed.present(NdefMessage::new(vec![NdefRecord::url("https://example.com")]));
        });

        let previous = ScanState {
            error: Some("old error".to_string()),
            ..ScanState::default()
        };
        let state = start_scan(&mut service, previous).await;

        assert_eq!(state.status, ScanStatus::Read);
        assert!(state.error.is_none());
        assert!(!state.scanning);
        assert_eq!(state.destination(REDIRECT), "https://example.com");
    }

    #[tokio::test]
    async fn test_start_scan_failure_resets_status() {
        let (reader, feed) = ChannelReader::new();
        let mut service = NfcService::new(reader);

        tokio::spawn(async move {
            wait_until_armed(&feed).await;
            feed.reading_error();
        });

        let state = start_scan(&mut service, scanned("stale")).await;
        assert_eq!(state.status, ScanStatus::Ready);
        assert_eq!(state.error.as_deref(), Some("Could not read the NFC tag."));
        assert!(state.result.is_none());
        assert!(!state.scanning);
    }

    #[tokio::test]
    async fn test_start_scan_insecure() {
        let (reader, _feed) = ChannelReader::new();
        let mut service = NfcService::new(reader.with_secure_context(false));

        let state = start_scan(&mut service, ScanState::default()).await;
        assert_eq!(state.status, ScanStatus::Unsupported);
        assert_eq!(state.error.as_deref(), Some(INSECURE_SCAN_MESSAGE));
    }

    #[tokio::test]
    async fn test_start_scan_unsupported() {
        let (reader, _feed) = ChannelReader::new();
        let mut service = NfcService::new(reader.with_support(false));

        let state = start_scan(&mut service, ScanState::default()).await;
        assert_eq!(state.status, ScanStatus::Unsupported);
        assert_eq!(state.error.as_deref(), Some(UNSUPPORTED_MESSAGE));
    }

    #[tokio::test]
    async fn test_write_tag_success() {
        let (reader, feed) = ChannelReader::new();
        let mut service = NfcService::new(reader);

        tokio::spawn(async move {
            if let Some(request) = feed.next_write().await {
                request.complete();
            }
        });

        let state = write_tag(&mut service, WriteState::default(), "https://example.com").await;
        assert_eq!(state.status, WriteStatus::Written);
        assert_eq!(state.success.as_deref(), Some(WRITE_SUCCESS_MESSAGE));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_write_tag_invalid_url_keeps_status() {
        let (reader, _feed) = ChannelReader::new();
        let mut service = NfcService::new(reader);

        let state = write_tag(&mut service, WriteState::default(), "example").await;
        assert_eq!(state.status, WriteStatus::Ready);
        assert_eq!(state.error.as_deref(), Some(INVALID_URL_MESSAGE));
    }

    #[tokio::test]
    async fn test_write_tag_insecure_message_differs_from_scan() {
        let (reader, _feed) = ChannelReader::new();
        let mut service = NfcService::new(reader.with_secure_context(false));

        let state = write_tag(&mut service, WriteState::default(), "https://example.com").await;
        assert_eq!(state.status, WriteStatus::Unsupported);
        assert_eq!(state.error.as_deref(), Some(INSECURE_WRITE_MESSAGE));
    }

    #[tokio::test]
    async fn test_write_tag_failure() {
        let (reader, feed) = ChannelReader::new();
        let mut service = NfcService::new(reader);

        tokio::spawn(async move {
            if let Some(request) = feed.next_write().await {
                request.fail(ReaderError::WriteFailed("locked".to_string()));
            }
        });

        let state = write_tag(&mut service, WriteState::default(), "https://example.com").await;
        assert_eq!(state.status, WriteStatus::Ready);
        assert_eq!(state.error.as_deref(), Some("Could not write the tag."));
    }

    #[tokio::test]
    async fn test_scan_is_observable_while_pending() {
        let (reader, feed) = ChannelReader::new();
        let mut service = NfcService::new(reader);

        let armed = begin_scan(&service, scanned("stale"));
        assert_eq!(armed.status, ScanStatus::Waiting);
        assert_eq!(armed.status.to_string(), "Hold the device near the tag");
        assert!(armed.scanning);
        assert!(armed.result.is_none());
        assert!(!feed.is_scanning());

        tokio::spawn(async move {
            wait_until_armed(&feed).await;
            feed.present(NdefMessage::new(vec![NdefRecord::url("https://example.com")]));
        });

        let state = finish_scan(&mut service, armed).await;
        assert_eq!(state.status, ScanStatus::Read);
        assert!(!state.scanning);
    }

    #[tokio::test]
    async fn test_finish_scan_without_begin_is_unchanged() {
        let (reader, _feed) = ChannelReader::new();
        let mut service = NfcService::new(reader.with_support(false));

        let refused = begin_scan(&service, ScanState::default());
        assert!(!refused.scanning);
        let state = finish_scan(&mut service, refused.clone()).await;
        assert_eq!(state, refused);
    }

    #[tokio::test]
    async fn test_write_is_observable_while_pending() {
        let (reader, feed) = ChannelReader::new();
        let mut service = NfcService::new(reader);

        let armed = begin_write(&service, WriteState::default(), "https://example.com");
        assert_eq!(armed.status, WriteStatus::Waiting);

        tokio::spawn(async move {
            if let Some(request) = feed.next_write().await {
                request.complete();
            }
        });

        let state = finish_write(&mut service, armed, "https://example.com").await;
        assert_eq!(state.status, WriteStatus::Written);
    }

    #[tokio::test]
    async fn test_finish_write_skips_rejected_url() {
        let (reader, feed) = ChannelReader::new();
        let mut service = NfcService::new(reader);

        let rejected = begin_write(&service, WriteState::default(), "example");
        let state = finish_write(&mut service, rejected, "example").await;
        assert_eq!(state.status, WriteStatus::Ready);
        assert_eq!(state.error.as_deref(), Some(INVALID_URL_MESSAGE));
        drop(service);
        assert!(feed.next_write().await.is_none());
    }
}
