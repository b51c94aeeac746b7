// gcsw Command Sources
// Transports that turn network messages into queued device words

pub mod mqtt;
pub mod stream;

use std::sync::mpsc::Sender;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::queue::WordSender;
use crate::word::{decode_batch, decode_entries, DecodeError, Device, DeviceWord};
use crate::{KeyboardWord, PointerWord};

pub use mqtt::{MqttSettings, MqttSource};
pub use stream::{read_frame, write_frame, StreamFrame, StreamSettings, StreamSource, MAX_FRAME_LEN};

/// Result type for command source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors that can occur in a command source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Failed to subscribe: {0}")]
    Subscribe(String),

    #[error("Transport disconnected: {0}")]
    Disconnected(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Word queue closed")]
    QueueClosed,
}

/// A transport producing ordered device words.
///
/// `start` returns only once the transport is connected, so connection
/// failures surface at startup. Failures after that are sent on `faults`.
pub trait CommandSource: Send {
    /// Short transport name for logging
    fn name(&self) -> &'static str;

    /// Connect and spawn the reader; words are pushed into `sinks`
    fn start(&mut self, sinks: WordSinks, faults: Sender<SourceError>) -> SourceResult<()>;

    /// Disconnect and close the word queues
    fn stop(&mut self) -> SourceResult<()>;
}

/// Producer ends of both device queues
#[derive(Debug)]
pub struct WordSinks {
    pub pointer: WordSender<PointerWord>,
    pub keyboard: WordSender<KeyboardWord>,
}

impl WordSinks {
    pub fn new(pointer: WordSender<PointerWord>, keyboard: WordSender<KeyboardWord>) -> Self {
        Self { pointer, keyboard }
    }
}

/// Sinks shared between a source, its reader thread and `stop`.
///
/// Closing drops the senders, which is what ends the sequencer loops. The
/// lock only guards taking a sender out, never a send, so `close` does not
/// wait behind a full queue. A send already blocked when the sinks close
/// delivers that one word; the rest of its batch is dropped.
#[derive(Debug, Clone)]
pub struct SharedSinks {
    inner: Arc<Mutex<Option<WordSinks>>>,
}

impl SharedSinks {
    pub fn new(sinks: WordSinks) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(sinks))),
        }
    }

    /// Decode one message payload for `device` and enqueue its words in order.
    ///
    /// Decode errors are logged and the batch skipped; only closed sinks are
    /// reported as an error. Returns the number of words enqueued.
    pub fn dispatch(&self, device: Device, payload: &[u8]) -> SourceResult<usize> {
        match device {
            Device::Mouse => self.enqueue(decode_batch(payload), |sinks| sinks.pointer.clone()),
            Device::Keyboard => {
                self.enqueue(decode_batch(payload), |sinks| sinks.keyboard.clone())
            }
        }
    }

    /// Same as [`SharedSinks::dispatch`] for entries that are already parsed
    pub fn dispatch_entries(
        &self,
        device: Device,
        entries: Vec<serde_json::Value>,
    ) -> SourceResult<usize> {
        match device {
            Device::Mouse => {
                self.enqueue(Ok(decode_entries(entries)), |sinks| sinks.pointer.clone())
            }
            Device::Keyboard => {
                self.enqueue(Ok(decode_entries(entries)), |sinks| sinks.keyboard.clone())
            }
        }
    }

    /// Drop the queue senders. Idempotent.
    pub fn close(&self) {
        self.inner.lock().take();
    }

    fn sender<W, F>(&self, pick: &F) -> SourceResult<WordSender<W>>
    where
        F: Fn(&WordSinks) -> WordSender<W>,
    {
        self.inner.lock().as_ref().map(pick).ok_or(SourceError::QueueClosed)
    }

    fn enqueue<W, F>(&self, batch: Result<Vec<W>, DecodeError>, pick: F) -> SourceResult<usize>
    where
        W: DeviceWord,
        F: Fn(&WordSinks) -> WordSender<W>,
    {
        let words = match batch {
            Ok(words) => words,
            Err(e) => {
                log::warn!("[!] {} batch skipped: {}", W::DEVICE, e);
                return Ok(0);
            }
        };
        let count = words.len();
        for word in words {
            // Fetched per word so a close between sends ends the batch
            let sender = self.sender(&pick)?;
            sender.send(word).map_err(|_| SourceError::QueueClosed)?;
        }
        Ok(count)
    }
}
