//! Human-first console transport
//!
//! One color-coded header line per entry; entries carrying data, an
//! error, or non-empty context get an indented group of sub-lines under
//! the header (or a compact single line, per config). trace/debug/info/
//! warn go to stdout, error/fatal to stderr.

use std::io::Write;

use async_trait::async_trait;

use crate::domain::{LogEntry, LogLevel, SerializedError};
use crate::error::Result;

use super::Transport;

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

fn level_color(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "\x1b[90m",
        LogLevel::Debug => "\x1b[36m",
        LogLevel::Info => "\x1b[32m",
        LogLevel::Warn => "\x1b[33m",
        LogLevel::Error => "\x1b[31m",
        LogLevel::Fatal => "\x1b[1;31m",
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// ANSI colors on the header line
    pub colors: bool,
    /// Render context/data/error as an indented group under the header;
    /// `false` appends them compactly to the single line
    pub expanded: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            colors: true,
            expanded: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct ConsoleTransport {
    config: ConsoleConfig,
}

impl ConsoleTransport {
    pub fn new(config: ConsoleConfig) -> Self {
        Self { config }
    }

    /// Render an entry to its output text (without writing it)
    fn render(&self, entry: &LogEntry) -> String {
        let mut out = String::new();
        self.render_header(entry, &mut out);

        let has_details = entry.data.is_some()
            || entry.error.is_some()
            || entry.context.as_ref().is_some_and(|c| !c.is_empty());

        if has_details {
            if self.config.expanded {
                if let Some(ctx) = &entry.context {
                    if !ctx.is_empty() {
                        out.push_str(&format!(
                            "\n  context: {}",
                            serde_json::to_string(ctx).unwrap_or_default()
                        ));
                    }
                }
                if let Some(data) = &entry.data {
                    out.push_str(&format!(
                        "\n  data: {}",
                        serde_json::to_string(data).unwrap_or_default()
                    ));
                }
                if let Some(error) = &entry.error {
                    render_error_group(error, &mut out);
                }
            } else {
                if let Some(data) = &entry.data {
                    out.push_str(&format!(
                        " data={}",
                        serde_json::to_string(data).unwrap_or_default()
                    ));
                }
                if let Some(error) = &entry.error {
                    out.push_str(&format!(" error={error}"));
                }
            }
        }
        out
    }

    fn render_header(&self, entry: &LogEntry, out: &mut String) {
        let ts = entry.timestamp.format("%H:%M:%S%.3f");
        let level = entry.level.as_str().to_uppercase();
        if self.config.colors {
            out.push_str(&format!(
                "{DIM}{ts}{RESET} {}{level:<5}{RESET} [{}] {}",
                level_color(entry.level),
                entry.namespace,
                entry.message
            ));
        } else {
            out.push_str(&format!("{ts} {level:<5} [{}] {}", entry.namespace, entry.message));
        }
        if let Some(ms) = entry.duration_ms {
            out.push_str(&format!(" ({ms:.1}ms)"));
        }
    }
}

fn render_error_group(error: &SerializedError, out: &mut String) {
    out.push_str(&format!("\n  error: {}: {}", error.name, error.message));
    let mut cause = error.cause.as_deref();
    while let Some(c) = cause {
        out.push_str(&format!("\n    caused by: {}: {}", c.name, c.message));
        cause = c.cause.as_deref();
    }
    if let Some(stack) = &error.stack {
        for line in stack.lines().take(8) {
            out.push_str(&format!("\n    {line}"));
        }
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        let text = self.render(entry);
        if entry.level.is_error_sink() {
            let stderr = std::io::stderr();
            let mut lock = stderr.lock();
            writeln!(lock, "{text}")?;
        } else {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            writeln!(lock, "{text}")?;
        }
        Ok(())
    }
}
