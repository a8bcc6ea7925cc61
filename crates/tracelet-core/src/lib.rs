//! # Tracelet Core
//!
//! Structured logging and client-side tracing: log entries, pluggable
//! transports, a context/span store, and the logger façade.
//!
//! ## Modules
//!
//! - `domain` - `LogEntry`, `LogLevel`, `LogContext`, `SerializedError`
//! - `transport` - the `Transport` capability and its four sinks
//!   (console, JSON lines, batching buffer, tracing bridge)
//! - `context` - `ContextStore` with span push/pop and session identity
//! - `logger` - `Logger`, `LoggerBuilder`, `LoggerSpan`
//! - `panic_hook` - fatal-level panic logging
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use tracelet_core::{ContextStore, Logger, LogLevel};
//! use tracelet_core::transport::JsonTransport;
//!
//! let store = ContextStore::new();
//! let logger = Logger::builder("app")
//!     .min_level(LogLevel::Debug)
//!     .store(store)
//!     .transport(Arc::new(JsonTransport::default()))
//!     .build();
//!
//! let trace_id = logger.start_trace("page-load");
//! let span = logger.span("fetch-curriculum", None);
//! logger.info("curriculum loaded", serde_json::json!({"units": 12}));
//! span.end(None);
//! ```

pub mod context;
pub mod domain;
pub mod error;
pub mod logger;
pub mod panic_hook;
pub mod transport;

// Re-export commonly used types
pub use context::{Attributes, ContextStore, FinishedSpan, SpanHandle, SpanRecord};
pub use domain::{LogContext, LogEntry, LogLevel, LogPayload, SerializedError};
pub use error::{Result, TelemetryError};
pub use logger::{Logger, LoggerBuilder, LoggerSpan, LEVEL_ENV_VAR};
pub use panic_hook::install_panic_hook;
pub use transport::Transport;
