//! Transport-safe error serialization
//!
//! Native errors carry source chains and backtraces that are not
//! portable data. `SerializedError` is the one projection transports
//! ever see: a finite, JSON-safe mirror of the error and its `source()`
//! chain, built at the single point where an error enters the logger.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-safe projection of a native error and its cause chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerializedError {
    /// Short type name at the top level; `"Error"` for type-erased causes
    pub name: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<SerializedError>>,
}

impl SerializedError {
    /// Serialize an error and walk its `source()` chain into `cause` links.
    ///
    /// The chain is finite by construction, so the result has no cycles.
    /// A backtrace is attached only when capture is enabled for the
    /// process (RUST_BACKTRACE / RUST_LIB_BACKTRACE).
    pub fn from_error<E>(err: &E) -> Self
    where
        E: Error + ?Sized,
    {
        let backtrace = Backtrace::capture();
        let stack = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };

        SerializedError {
            name: short_type_name::<E>(),
            message: err.to_string(),
            stack,
            cause: err.source().map(|s| Box::new(Self::from_source(s))),
        }
    }

    // Sources are type-erased, so no concrete name is recoverable here.
    fn from_source(err: &(dyn Error + 'static)) -> Self {
        SerializedError {
            name: "Error".to_string(),
            message: err.to_string(),
            stack: None,
            cause: err.source().map(|s| Box::new(Self::from_source(s))),
        }
    }

    /// Depth of the cause chain, the error itself included
    pub fn depth(&self) -> usize {
        1 + self.cause.as_ref().map_or(0, |c| c.depth())
    }
}

impl std::fmt::Display for SerializedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " (caused by: {cause})")?;
        }
        Ok(())
    }
}

fn short_type_name<E: ?Sized>() -> String {
    let full = std::any::type_name::<E>();
    full.rsplit("::").next().unwrap_or(full).to_string()
}

/// The optional second argument of the level methods: nothing,
/// structured data, or an error to serialize.
#[derive(Debug, Clone)]
pub enum LogPayload {
    None,
    Data(Value),
    Error(SerializedError),
}

impl From<()> for LogPayload {
    fn from(_: ()) -> Self {
        LogPayload::None
    }
}

impl From<Value> for LogPayload {
    fn from(value: Value) -> Self {
        LogPayload::Data(value)
    }
}

impl From<SerializedError> for LogPayload {
    fn from(err: SerializedError) -> Self {
        LogPayload::Error(err)
    }
}

impl<E: Error + ?Sized> From<&E> for LogPayload {
    fn from(err: &E) -> Self {
        LogPayload::Error(SerializedError::from_error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("{message}")]
    struct ChainedError {
        message: String,
        #[source]
        source: Option<Box<ChainedError>>,
    }

    fn chain(depth: usize) -> ChainedError {
        let mut err = ChainedError {
            message: format!("level {depth}"),
            source: None,
        };
        for i in (1..depth).rev() {
            err = ChainedError {
                message: format!("level {i}"),
                source: Some(Box::new(err)),
            };
        }
        err
    }

    #[test]
    fn test_cause_chain_depth_three() {
        let serialized = SerializedError::from_error(&chain(3));

        assert_eq!(serialized.depth(), 3);
        assert_eq!(serialized.name, "ChainedError");
        assert_eq!(serialized.message, "level 1");

        let c1 = serialized.cause.as_ref().unwrap();
        assert_eq!(c1.name, "Error");
        assert_eq!(c1.message, "level 2");

        let c2 = c1.cause.as_ref().unwrap();
        assert_eq!(c2.message, "level 3");
        assert!(c2.cause.is_none());
    }

    #[test]
    fn test_json_stringify_safe() {
        let serialized = SerializedError::from_error(&chain(3));
        let json = serde_json::to_value(&serialized).unwrap();
        assert_eq!(json["cause"]["cause"]["message"], json!("level 3"));

        // Round-trips cleanly
        let back: SerializedError = serde_json::from_value(json).unwrap();
        assert_eq!(back.depth(), 3);
    }

    #[test]
    fn test_io_error_no_cause() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing lesson file");
        let serialized = SerializedError::from_error(&err);
        assert_eq!(serialized.name, "Error"); // std::io::Error ends in "Error"
        assert_eq!(serialized.message, "missing lesson file");
        assert!(serialized.cause.is_none());
    }

    #[test]
    fn test_payload_conversions() {
        assert!(matches!(LogPayload::from(()), LogPayload::None));
        assert!(matches!(
            LogPayload::from(json!({"k": 1})),
            LogPayload::Data(_)
        ));
        let err = chain(1);
        assert!(matches!(LogPayload::from(&err), LogPayload::Error(_)));
    }
}
