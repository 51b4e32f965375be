//! `nfclink` - Scan and write NFC tags
//!
//! This library decodes the NDEF records on a tag into a single usable value
//! (a URL or a piece of text), works out where that value should lead, and
//! writes URL records back to tags. The NFC hardware sits behind the
//! [`NfcReader`] trait.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod destination;
pub mod error;
pub mod flow;
pub mod interpret;
pub mod logging;
pub mod reader;
pub mod record;
pub mod service;

pub use config::Config;
pub use destination::{build_destination_url, is_valid_url};
pub use error::{Error, Result};
pub use flow::{ScanState, WriteState};
pub use interpret::{interpret, Interpretation, RecordError};
pub use logging::init_logging;
pub use reader::{ChannelReader, NfcReader, ReaderError, ReplayReader, TagFeed};
pub use record::{BestValueType, NdefMessage, NdefRecord, Payload, RawRecord, ScanResult};
pub use service::NfcService;
