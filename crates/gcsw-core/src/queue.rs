// gcsw Word Queue
// Bounded FIFO between a command source and one sequencer

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};

/// Default queue depth per device
pub const DEFAULT_CAPACITY: usize = 32;

/// Returned when sending into a queue whose consumer is gone
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("word queue closed")]
pub struct QueueClosed;

/// Result of a non-blocking look at the queue
#[derive(Debug, PartialEq, Eq)]
pub enum Polled<W> {
    /// The next word, removed from the queue
    Word(W),
    /// Nothing queued right now
    Empty,
    /// Every sender is gone and nothing is left to drain
    Closed,
}

/// Create a bounded word queue.
///
/// A capacity of 0 is raised to 1 so senders keep FIFO buffering semantics.
pub fn word_queue<W>(capacity: usize) -> (WordSender<W>, WordReceiver<W>) {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    (WordSender { inner: tx }, WordReceiver { inner: rx })
}

/// Producer half. The queue closes once every clone is dropped.
#[derive(Debug)]
pub struct WordSender<W> {
    inner: SyncSender<W>,
}

impl<W> Clone for WordSender<W> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<W> WordSender<W> {
    /// Enqueue a word, blocking while the queue is full
    pub fn send(&self, word: W) -> Result<(), QueueClosed> {
        self.inner.send(word).map_err(|_| QueueClosed)
    }
}

/// Consumer half, owned by exactly one sequencer.
#[derive(Debug)]
pub struct WordReceiver<W> {
    inner: Receiver<W>,
}

impl<W> WordReceiver<W> {
    /// Block for the next word; `None` once closed and drained
    pub fn recv(&self) -> Option<W> {
        self.inner.recv().ok()
    }

    /// Take the next word without blocking
    pub fn poll(&self) -> Polled<W> {
        match self.inner.try_recv() {
            Ok(word) => Polled::Word(word),
            Err(TryRecvError::Empty) => Polled::Empty,
            Err(TryRecvError::Disconnected) => Polled::Closed,
        }
    }
}
