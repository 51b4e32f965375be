//! Event-driven reader fed by the host.
//!
//! The host owns a [`TagFeed`] and pushes tag events into it as its own NFC
//! stack reports them. A reading is only accepted while a scan is armed, and
//! the scan disarms itself however it ends, so an event that arrives after a
//! scan settled is dropped instead of leaking into the next one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, trace, warn};

use super::{NfcReader, ReaderError, Result};
use crate::record::{NdefMessage, NdefRecord};

/// An event raised by the host's NFC stack.
#[derive(Debug)]
enum TagEvent {
    Reading(NdefMessage),
    ReadingError,
    PermissionDenied,
}

/// A pending write handed to the host.
#[derive(Debug)]
pub struct WriteRequest {
    message: NdefMessage,
    reply: oneshot::Sender<Result<()>>,
}

impl WriteRequest {
    /// The records to write.
    #[must_use]
    pub fn message(&self) -> &NdefMessage {
        &self.message
    }

    /// Report the write as done.
    pub fn complete(self) {
        let _ = self.reply.send(Ok(()));
    }

    /// Report the write as failed.
    pub fn fail(self, error: ReaderError) {
        let _ = self.reply.send(Err(error));
    }
}

/// Host-side handle for delivering tag events.
#[derive(Debug, Clone)]
pub struct TagFeed {
    events: mpsc::UnboundedSender<TagEvent>,
    writes: Arc<Mutex<mpsc::UnboundedReceiver<WriteRequest>>>,
    armed: Arc<AtomicBool>,
}

impl TagFeed {
    /// Deliver a tag reading.
    ///
    /// Returns `false` if no scan was waiting and the reading was dropped.
    pub fn present(&self, message: NdefMessage) -> bool {
        self.deliver(TagEvent::Reading(message))
    }

    /// Report that a tag was detected but could not be read.
    pub fn reading_error(&self) -> bool {
        self.deliver(TagEvent::ReadingError)
    }

    /// Report that the user refused or dismissed the permission prompt.
    pub fn deny_permission(&self) -> bool {
        self.deliver(TagEvent::PermissionDenied)
    }

    /// Check if a scan is currently waiting for a tag.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Wait for the next write the reader asks for.
    ///
    /// Returns `None` once the reader is dropped.
    pub async fn next_write(&self) -> Option<WriteRequest> {
        self.writes.lock().await.recv().await
    }

    fn deliver(&self, event: TagEvent) -> bool {
        if !self.is_scanning() {
            debug!(?event, "No scan in progress, dropping tag event");
            return false;
        }
        self.events.send(event).is_ok()
    }
}

/// Clears the armed flag when a scan ends, on every path out.
#[derive(Debug)]
struct ArmedScan(Arc<AtomicBool>);

impl ArmedScan {
    fn arm(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for ArmedScan {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A reader driven by events pushed through a [`TagFeed`].
#[derive(Debug)]
pub struct ChannelReader {
    events: mpsc::UnboundedReceiver<TagEvent>,
    writes: mpsc::UnboundedSender<WriteRequest>,
    armed: Arc<AtomicBool>,
    supported: bool,
    secure_context: bool,
}

impl ChannelReader {
    /// Create a reader and the feed that drives it.
    #[must_use]
    pub fn new() -> (Self, TagFeed) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let armed = Arc::new(AtomicBool::new(false));

        let reader = Self {
            events: event_rx,
            writes: write_tx,
            armed: Arc::clone(&armed),
            supported: true,
            secure_context: true,
        };
        let feed = TagFeed {
            events: event_tx,
            writes: Arc::new(Mutex::new(write_rx)),
            armed,
        };
        (reader, feed)
    }

    /// Set whether the host reports NFC support.
    #[must_use]
    pub fn with_support(mut self, supported: bool) -> Self {
        self.supported = supported;
        self
    }

    /// Set whether the host reports a secure context.
    #[must_use]
    pub fn with_secure_context(mut self, secure_context: bool) -> Self {
        self.secure_context = secure_context;
        self
    }

    fn discard_stale_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            trace!(?event, "Discarding event left over from an earlier scan");
        }
    }
}

#[async_trait::async_trait]
impl NfcReader for ChannelReader {
    fn name(&self) -> &'static str {
        "channel"
    }

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn is_secure_context(&self) -> bool {
        self.secure_context
    }

    async fn scan_once(&mut self) -> Result<NdefMessage> {
        if !self.supported {
            return Err(ReaderError::Unsupported);
        }

        self.discard_stale_events();
        let _armed = ArmedScan::arm(&self.armed);
        debug!("Waiting for a tag");

        match self.events.recv().await {
            Some(TagEvent::Reading(message)) => {
                debug!(records = message.records.len(), "Tag read");
                Ok(message)
            }
            Some(TagEvent::ReadingError) => {
                warn!("Host reported a reading error");
                Err(ReaderError::ReadFailed(
                    "the tag could not be read".to_string(),
                ))
            }
            Some(TagEvent::PermissionDenied) => Err(ReaderError::PermissionDenied),
            None => Err(ReaderError::Disconnected),
        }
    }

    async fn write_records(&mut self, records: Vec<NdefRecord>) -> Result<()> {
        if !self.supported {
            return Err(ReaderError::Unsupported);
        }

        let (reply, ack) = oneshot::channel();
        self.writes
            .send(WriteRequest {
                message: NdefMessage::new(records),
                reply,
            })
            .map_err(|_| ReaderError::Disconnected)?;

        debug!("Waiting for the host to write the tag");
        ack.await.map_err(|_| ReaderError::Disconnected)?
    }
}
