//! Entry and error model
//!
//! Pure data shapes shared by the logger core and every transport:
//! - `LogLevel` - severity with numeric ranks
//! - `LogEntry` - one finished record per write call
//! - `LogContext` - ambient, inherited metadata
//! - `SerializedError` / `LogPayload` - the transport-safe error boundary

mod context;
mod entry;
mod error_info;
mod level;

pub use context::LogContext;
pub use entry::LogEntry;
pub use error_info::{LogPayload, SerializedError};
pub use level::LogLevel;
