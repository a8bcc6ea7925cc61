//! Redaction, truncation, and size formatting
//!
//! Secrets must never reach a transport: header names on the deny-list
//! are replaced with a fixed marker, case-insensitively, before any
//! logging happens. Body previews are size-capped with an exact
//! overflow count so oversized payloads cannot flood a sink.

use serde_json::{Map, Value};

/// Replacement for sensitive header values
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Header names whose values are never logged (matched lowercase)
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
];

/// Body previews are cut at this many characters
pub const MAX_BODY_PREVIEW_CHARS: usize = 1000;

pub fn is_sensitive_header(name: &str) -> bool {
    let lower = name.to_lowercase();
    SENSITIVE_HEADERS.contains(&lower.as_str())
}

/// Project headers into a loggable JSON map, redacting deny-listed names
pub fn redact_headers(headers: &[(String, String)]) -> Value {
    let mut map = Map::new();
    for (name, value) in headers {
        let logged = if is_sensitive_header(name) {
            REDACTION_MARKER.to_string()
        } else {
            value.clone()
        };
        map.insert(name.clone(), Value::String(logged));
    }
    Value::Object(map)
}

/// Cap `body` at `max_chars` characters, appending an exact overflow
/// count when cut.
pub fn truncate_body(body: &str, max_chars: usize) -> String {
    let total = body.chars().count();
    if total <= max_chars {
        return body.to_string();
    }
    let mut out: String = body.chars().take(max_chars).collect();
    out.push_str(&format!("...[truncated {} chars]", total - max_chars));
    out
}

/// Human-readable byte size (B / KB / MB)
pub fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
