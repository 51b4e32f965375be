//! Record interpretation.
//!
//! Decodes the payload of every record on a tag and picks the single value
//! the rest of the application works with. Selection is first-match-wins:
//! the first `url` record, else the first `text` record, else whatever the
//! first record decodes to.

use thiserror::Error;
use tracing::{debug, trace};

use crate::record::{BestValueType, NdefRecord, Payload, RawRecord};

/// Bits 0-5 of the text-record status byte hold the language code length.
const LANGUAGE_LENGTH_MASK: u8 = 0x3f;

/// Bit 7 of the text-record status byte selects UTF-16.
const UTF16_FLAG: u8 = 0x80;

/// Errors decoding or encoding record payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The status byte claims more language code bytes than the buffer holds.
    #[error(
        "text record declares a {declared}-byte language code but only {available} bytes follow the status byte"
    )]
    LanguageCodeOverflow {
        /// Language code length from the status byte.
        declared: usize,
        /// Bytes remaining after the status byte.
        available: usize,
    },

    /// The payload is not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// UTF-16 text must be made of whole code units.
    #[error("UTF-16 text has an odd number of bytes ({0})")]
    OddUtf16Length(usize),

    /// The payload is not valid UTF-16.
    #[error("payload is not valid UTF-16")]
    InvalidUtf16,

    /// The language code does not fit in the status byte.
    #[error("language code is {0} bytes long, at most 63 are allowed")]
    LanguageCodeTooLong(usize),
}

/// Result type for record decoding.
pub type Result<T> = std::result::Result<T, RecordError>;

/// Text encoding of a text record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8 (status bit 7 clear).
    #[default]
    Utf8,
    /// UTF-16 little-endian, no byte-order mark (status bit 7 set).
    Utf16,
}

/// Every record decoded, plus the selected value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    /// Decoded records in their original order.
    pub raw_records: Vec<RawRecord>,
    /// The selected value.
    pub best_value: String,
    /// How the value was selected.
    pub best_value_type: BestValueType,
}

/// Decode all records and select the best value.
///
/// # Errors
///
/// Returns an error if any record fails to decode. No partial result is
/// produced.
pub fn interpret(records: &[NdefRecord]) -> Result<Interpretation> {
    let raw_records = records
        .iter()
        .map(|record| {
            Ok(RawRecord {
                record_type: record.record_type.clone(),
                media_type: record.media_type.clone(),
                data: decode_record(record)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // Records and raw_records share indices, and a record's decoded text is
    // already the value the selection rules ask for.
    let (best_value, best_value_type) = if let Some(index) =
        records.iter().position(NdefRecord::is_url)
    {
        (raw_records[index].data.clone(), BestValueType::Url)
    } else if let Some(index) = records.iter().position(NdefRecord::is_text) {
        (raw_records[index].data.clone(), BestValueType::Text)
    } else {
        let fallback = raw_records
            .first()
            .map(|raw| raw.data.clone())
            .unwrap_or_default();
        (fallback, BestValueType::Unknown)
    };

    debug!(
        records = raw_records.len(),
        best_value_type = %best_value_type,
        "Interpreted tag records"
    );

    Ok(Interpretation {
        raw_records,
        best_value,
        best_value_type,
    })
}

/// Decode one record's payload to text.
///
/// Text records go through [`decode_text_record`]; every other type,
/// `url` included, is plain UTF-8.
///
/// # Errors
///
/// Returns an error if the payload is malformed.
pub fn decode_record(record: &NdefRecord) -> Result<String> {
    trace!(record_type = %record.record_type, "Decoding record");
    if record.is_text() {
        decode_text_record(record.data.as_ref())
    } else {
        decode_data(record.data.as_ref())
    }
}

/// Decode a text-record payload.
///
/// The first byte is the status byte: bits 0-5 give the length of the
/// language code that follows it, bit 7 selects UTF-16 over UTF-8. The text
/// runs from the end of the language code to the end of the buffer.
///
/// # Errors
///
/// Returns an error if the language code runs past the buffer or the text is
/// not valid in the selected encoding.
pub fn decode_text_record(data: Option<&Payload>) -> Result<String> {
    let bytes = match data {
        None => return Ok(String::new()),
        Some(Payload::Text(text)) => return Ok(text.clone()),
        Some(Payload::Bytes(bytes)) => bytes,
    };

    let Some((&status, rest)) = bytes.split_first() else {
        return Ok(String::new());
    };

    let language_length = usize::from(status & LANGUAGE_LENGTH_MASK);
    if language_length > rest.len() {
        return Err(RecordError::LanguageCodeOverflow {
            declared: language_length,
            available: rest.len(),
        });
    }

    let text = &rest[language_length..];
    if status & UTF16_FLAG == 0 {
        Ok(String::from_utf8(text.to_vec())?)
    } else {
        decode_utf16(text)
    }
}

/// Decode a payload as UTF-8 with no header.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8.
pub fn decode_data(data: Option<&Payload>) -> Result<String> {
    match data {
        None => Ok(String::new()),
        Some(Payload::Text(text)) => Ok(text.clone()),
        Some(Payload::Bytes(bytes)) => Ok(String::from_utf8(bytes.clone())?),
    }
}

/// Build a text-record payload.
///
/// # Errors
///
/// Returns an error if the language code is longer than 63 bytes.
pub fn encode_text_record(text: &str, language: &str, encoding: TextEncoding) -> Result<Vec<u8>> {
    let language = language.as_bytes();
    let language_length = u8::try_from(language.len())
        .ok()
        .filter(|length| *length <= LANGUAGE_LENGTH_MASK)
        .ok_or(RecordError::LanguageCodeTooLong(language.len()))?;

    let mut payload = Vec::with_capacity(1 + language.len() + text.len() * 2);
    match encoding {
        TextEncoding::Utf8 => {
            payload.push(language_length);
            payload.extend_from_slice(language);
            payload.extend_from_slice(text.as_bytes());
        }
        TextEncoding::Utf16 => {
            payload.push(UTF16_FLAG | language_length);
            payload.extend_from_slice(language);
            payload.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        }
    }
    Ok(payload)
}

fn decode_utf16(bytes: &[u8]) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(RecordError::OddUtf16Length(bytes.len()));
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    String::from_utf16(&units).map_err(|_| RecordError::InvalidUtf16)
}
