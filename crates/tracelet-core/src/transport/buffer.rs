//! Size-triggered batching transport
//!
//! Appends entries to a private in-memory queue and hands the drained
//! batch to a configured callback - either when the queue reaches
//! `max_size` (synchronously, on the triggering write) or on a manual
//! `flush`. Between flushes the queue length stays in `[0, max_size-1]`.
//! The queue is owned exclusively by this transport.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::LogEntry;
use crate::error::Result;

use super::Transport;

/// Receives each drained batch
pub type FlushCallback = Arc<dyn Fn(Vec<LogEntry>) + Send + Sync>;

pub struct BufferTransport {
    max_size: usize,
    queue: Mutex<Vec<LogEntry>>,
    on_flush: FlushCallback,
}

impl BufferTransport {
    /// `max_size` of 0 is treated as 1 (every write flushes immediately)
    pub fn new(max_size: usize, on_flush: FlushCallback) -> Self {
        Self {
            max_size: max_size.max(1),
            queue: Mutex::new(Vec::new()),
            on_flush,
        }
    }

    /// Collector without a callback, useful as a capture sink in tests
    pub fn collector(max_size: usize) -> Self {
        Self::new(max_size, Arc::new(|_batch| {}))
    }

    /// Read-only copy of the queued entries
    pub fn entries(&self) -> Vec<LogEntry> {
        self.queue.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Discard queued entries without invoking the callback
    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    fn drain(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.queue.lock())
    }
}

#[async_trait]
impl Transport for BufferTransport {
    fn name(&self) -> &str {
        "buffer"
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        let batch = {
            let mut queue = self.queue.lock();
            queue.push(entry.clone());
            if queue.len() >= self.max_size {
                Some(std::mem::take(&mut *queue))
            } else {
                None
            }
        };
        // Callback runs outside the lock; a callback that logs back
        // into this transport must not deadlock.
        if let Some(batch) = batch {
            (self.on_flush)(batch);
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let batch = self.drain();
        if !batch.is_empty() {
            (self.on_flush)(batch);
        }
        Ok(())
    }
}
