//! Bridge into the `tracing` ecosystem
//!
//! Re-emits each entry as a `tracing` event at the mapped level so
//! entries show up in whatever subscriber the host installed (fmt
//! output, flamegraphs, OpenTelemetry exporters). With no subscriber
//! installed the events vanish silently - graceful degradation, never
//! an error.

use async_trait::async_trait;

use crate::domain::{LogEntry, LogLevel};
use crate::error::Result;

use super::Transport;

#[derive(Debug, Default)]
pub struct TracingTransport;

impl TracingTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for TracingTransport {
    fn name(&self) -> &str {
        "tracing"
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        let namespace = entry.namespace.as_str();
        let trace_id = entry.trace_id.as_deref().unwrap_or("-");
        let span_id = entry.span_id.as_deref().unwrap_or("-");
        let duration_ms = entry.duration_ms.unwrap_or(0.0);
        let data = entry
            .data
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();

        // tracing levels are const per event, hence one arm per level;
        // fatal maps to error, the highest tracing offers.
        macro_rules! forward {
            ($level:ident) => {
                tracing::$level!(
                    namespace = %namespace,
                    trace_id = %trace_id,
                    span_id = %span_id,
                    duration_ms,
                    data = %data,
                    "{}",
                    entry.message
                )
            };
        }
        match entry.level {
            LogLevel::Trace => forward!(trace),
            LogLevel::Debug => forward!(debug),
            LogLevel::Info => forward!(info),
            LogLevel::Warn => forward!(warn),
            LogLevel::Error | LogLevel::Fatal => forward!(error),
        }
        Ok(())
    }
}
