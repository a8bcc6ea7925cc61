//! Transport layer
//!
//! A transport is a pluggable sink for finished log entries: a small
//! capability of `write` plus an optional async `flush`. Transports are
//! stateless with respect to entries except `BufferTransport`, which
//! privately owns its queue. The contract is "never panic out of
//! `write`"; a transport that must fail returns `Err`, and the logger
//! core catches and reports it so one broken sink cannot silence or
//! crash the others. Entries are never reordered by a transport.

mod buffer;
mod console;
mod json;
mod tracing_bridge;

pub use buffer::{BufferTransport, FlushCallback};
pub use console::{ConsoleConfig, ConsoleTransport};
pub use json::{JsonConfig, JsonTransport};
pub use tracing_bridge::TracingTransport;

use async_trait::async_trait;

use crate::domain::LogEntry;
use crate::error::Result;

/// A pluggable sink for finished log entries
#[async_trait]
pub trait Transport: Send + Sync {
    /// Stable name used in diagnostics when a write fails
    fn name(&self) -> &str;

    /// Deliver one entry. Must not panic; failures are returned.
    fn write(&self, entry: &LogEntry) -> Result<()>;

    /// Drain any buffered output. Default: nothing to do.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
