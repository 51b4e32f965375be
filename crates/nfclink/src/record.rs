//! Core NDEF record types for nfclink.
//!
//! This module defines the records delivered by a tag read, the decoded
//! view of those records, and the result of a completed scan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record type of a URL record.
pub const RECORD_TYPE_URL: &str = "url";

/// Record type of a text record.
pub const RECORD_TYPE_TEXT: &str = "text";

/// The payload carried by a record as delivered by the reader.
///
/// In JSON a payload is either a string or an array of byte values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// A payload the reader already decoded to a string.
    Text(String),
    /// A raw byte buffer.
    Bytes(Vec<u8>),
}

impl Payload {
    /// Check if the payload carries no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Bytes(bytes) => bytes.is_empty(),
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// A single NDEF record as read from, or written to, a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NdefRecord {
    /// The record type (`url`, `text`, `mime`, ...).
    pub record_type: String,

    /// The media type, for `mime` records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// The record payload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
}

impl NdefRecord {
    /// Create a record of the given type.
    #[must_use]
    pub fn new(record_type: impl Into<String>, data: Option<Payload>) -> Self {
        Self {
            record_type: record_type.into(),
            media_type: None,
            data,
        }
    }

    /// Create a URL record whose payload is the URL string.
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::new(RECORD_TYPE_URL, Some(Payload::Text(url.into())))
    }

    /// Create a text record from an encoded text-record payload.
    #[must_use]
    pub fn text(payload: Vec<u8>) -> Self {
        Self::new(RECORD_TYPE_TEXT, Some(Payload::Bytes(payload)))
    }

    /// Set the media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Check if this is a URL record.
    #[must_use]
    pub fn is_url(&self) -> bool {
        self.record_type == RECORD_TYPE_URL
    }

    /// Check if this is a text record.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.record_type == RECORD_TYPE_TEXT
    }
}

/// The records delivered by one tag read, in the tag's physical order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NdefMessage {
    /// The records on the tag.
    #[serde(default)]
    pub records: Vec<NdefRecord>,
}

impl NdefMessage {
    /// Create a message from records.
    #[must_use]
    pub fn new(records: Vec<NdefRecord>) -> Self {
        Self { records }
    }
}

/// A record with its payload decoded to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// The record type.
    pub record_type: String,

    /// The media type, if the record had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// The decoded payload.
    pub data: String,
}

/// Classification of the value picked from a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BestValueType {
    /// Taken from the first `url` record.
    Url,
    /// Taken from the first `text` record.
    Text,
    /// Fallback to the first record of any type.
    Unknown,
}

impl std::fmt::Display for BestValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url => write!(f, "url"),
            Self::Text => write!(f, "text"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// The outcome of a successful scan.
///
/// Built once when a read completes and never changed afterwards; the next
/// scan replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Every record on the tag, decoded, in tag order.
    pub raw_records: Vec<RawRecord>,

    /// The selected value.
    pub best_value: String,

    /// How the value was selected.
    pub best_value_type: BestValueType,

    /// When the tag was read, as milliseconds since the Unix epoch.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl ScanResult {
    /// Check if the scan produced a non-empty value.
    #[must_use]
    pub fn has_value(&self) -> bool {
        !self.best_value.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_value_type_display() {
        assert_eq!(BestValueType::Url.to_string(), "url");
        assert_eq!(BestValueType::Text.to_string(), "text");
        assert_eq!(BestValueType::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_url_record() {
        let record = NdefRecord::url("https://example.com");
        assert!(record.is_url());
        assert!(!record.is_text());
        assert_eq!(
            record.data,
            Some(Payload::Text("https://example.com".to_string()))
        );
    }

    #[test]
    fn test_with_media_type() {
        let record = NdefRecord::new("mime", None).with_media_type("application/json");
        assert_eq!(record.media_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_payload_is_empty() {
        assert!(Payload::Text(String::new()).is_empty());
        assert!(Payload::Bytes(Vec::new()).is_empty());
        assert!(!Payload::from("x").is_empty());
        assert!(!Payload::from(vec![1]).is_empty());
    }

    #[test]
    fn test_payload_deserialize_untagged() {
        let text: Payload = serde_json::from_str(r#""hello""#).unwrap();
        assert_eq!(text, Payload::Text("hello".to_string()));

        let bytes: Payload = serde_json::from_str("[2, 101, 110]").unwrap();
        assert_eq!(bytes, Payload::Bytes(vec![2, 101, 110]));
    }

    #[test]
    fn test_message_deserialize() {
        let json = r#"{"records": [
            {"record_type": "url", "data": "https://example.com"},
            {"record_type": "mime", "media_type": "text/plain"}
        ]}"#;
        let message: NdefMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.records.len(), 2);
        assert!(message.records[0].is_url());
        assert!(message.records[1].data.is_none());
    }

    #[test]
    fn test_scan_result_timestamp_is_millis() {
        let result = ScanResult {
            raw_records: Vec::new(),
            best_value: String::new(),
            best_value_type: BestValueType::Unknown,
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_123_i64);
        assert_eq!(json["best_value_type"], "unknown");
        assert!(!result.has_value());
    }
}
