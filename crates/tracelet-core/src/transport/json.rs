//! Machine-first JSON transport
//!
//! Serializes each entry to a single JSON string (JSON Lines), for log
//! aggregation rather than human reading. error/fatal entries go to
//! stderr, everything else to stdout.

use std::io::Write;

use async_trait::async_trait;

use crate::domain::LogEntry;
use crate::error::Result;

use super::Transport;

#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Pretty-print instead of one line per entry
    pub pretty: bool,
}

#[derive(Debug, Default)]
pub struct JsonTransport {
    config: JsonConfig,
}

impl JsonTransport {
    pub fn new(config: JsonConfig) -> Self {
        Self { config }
    }

    fn render(&self, entry: &LogEntry) -> Result<String> {
        let text = if self.config.pretty {
            serde_json::to_string_pretty(entry)?
        } else {
            serde_json::to_string(entry)?
        };
        Ok(text)
    }
}

#[async_trait]
impl Transport for JsonTransport {
    fn name(&self) -> &str {
        "json"
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        let text = self.render(entry)?;
        if entry.level.is_error_sink() {
            writeln!(std::io::stderr().lock(), "{text}")?;
        } else {
            writeln!(std::io::stdout().lock(), "{text}")?;
        }
        Ok(())
    }
}
