//! Structured log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{LogContext, LogLevel, SerializedError};

/// One finished log record (emitted as JSON Lines by the JSON transport).
///
/// Immutable once constructed; the logger builds exactly one instance
/// per write call and transports never mutate or reorder entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log level
    #[serde(rename = "lvl")]
    pub level: LogLevel,

    /// Timestamp taken at write time (ISO 8601)
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,

    /// Hierarchical emitter label (e.g. `app:http`)
    #[serde(rename = "ns")]
    pub namespace: String,

    /// Message
    #[serde(rename = "msg")]
    pub message: String,

    /// Structured payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Ambient context snapshot merged with the logger's static context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<LogContext>,

    /// Serialized error, when the call carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SerializedError>,

    /// Wall-clock duration for timed work, milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
}

impl LogEntry {
    /// Create a new entry; the timestamp is taken now.
    pub fn new(level: LogLevel, namespace: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            namespace: namespace.into(),
            message: message.into(),
            data: None,
            context: None,
            error: None,
            duration_ms: None,
            trace_id: None,
            span_id: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_error(mut self, error: SerializedError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_serialization() {
        let entry = LogEntry::new(LogLevel::Info, "app:srs", "card reviewed")
            .with_data(json!({"card_id": 42}))
            .with_duration_ms(12.5);

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"lvl\":\"info\""));
        assert!(json.contains("\"ns\":\"app:srs\""));
        assert!(json.contains("\"msg\":\"card reviewed\""));
        assert!(json.contains("\"card_id\":42"));

        let back: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.level, LogLevel::Info);
        assert_eq!(back.duration_ms, Some(12.5));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let entry = LogEntry::new(LogLevel::Debug, "app", "tick");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("data"));
        assert!(!json.contains("error"));
        assert!(!json.contains("trace_id"));
    }
}
