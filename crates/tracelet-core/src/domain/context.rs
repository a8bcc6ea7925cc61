//! Ambient log context

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ambient, inherited metadata attached to log entries.
///
/// The reserved fields cover identity and trace correlation; anything
/// else rides along in `extra` (flattened on the wire). Merging is
/// shallow: the other side's keys win, neither input is mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Arbitrary additional fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.session_id.is_none()
            && self.user_id.is_none()
            && self.trace_id.is_none()
            && self.span_id.is_none()
            && self.parent_span_id.is_none()
            && self.component.is_none()
            && self.action.is_none()
            && self.extra.is_empty()
    }

    /// Shallow merge: `other`'s set fields win over `self`'s.
    pub fn merged(&self, other: &LogContext) -> LogContext {
        let mut extra = self.extra.clone();
        for (k, v) in &other.extra {
            extra.insert(k.clone(), v.clone());
        }
        LogContext {
            session_id: other.session_id.clone().or_else(|| self.session_id.clone()),
            user_id: other.user_id.clone().or_else(|| self.user_id.clone()),
            trace_id: other.trace_id.clone().or_else(|| self.trace_id.clone()),
            span_id: other.span_id.clone().or_else(|| self.span_id.clone()),
            parent_span_id: other
                .parent_span_id
                .clone()
                .or_else(|| self.parent_span_id.clone()),
            component: other.component.clone().or_else(|| self.component.clone()),
            action: other.action.clone().or_else(|| self.action.clone()),
            extra,
        }
    }
}
