//! Context/span store
//!
//! Tracks session identity, user identity, and the active spans of one
//! logging domain. The store is an explicit `Arc` value the caller
//! constructs and hands to `LoggerBuilder` - there is no process-wide
//! singleton, so independent subsystems can hold independent stores.
//!
//! # Cursor semantics
//!
//! `start_span` pushes the new span id onto the ambient cursor;
//! `end_span` restores the cursor to the ended span's **own** parent id,
//! never to whatever the cursor happens to hold at call time. Under
//! correctly nested usage this is exact LIFO. The cursor is still a
//! single value per store: two independent async operations that
//! interleave on one store can observe each other's cursor between a
//! span's start and its end. `end_span` itself is always sound.
//!
//! # Resource model
//!
//! A span that is never ended stays in the active map forever; no sweep
//! exists. `active_span_count` makes the leak class observable.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::LogContext;
use crate::error::Result;

use super::session;

/// Span attribute map
pub type Attributes = serde_json::Map<String, Value>;

/// A span while it lives in the active map
#[derive(Debug, Clone)]
pub struct SpanRecord {
    pub id: String,
    pub name: String,
    pub trace_id: String,
    pub parent_id: Option<String>,
    /// Monotonic start, for durations
    pub started_at: Instant,
    /// Wall-clock start, for display
    pub start_time: DateTime<Utc>,
    pub attributes: Attributes,
}

/// A span after `end_span` removed it from the active map
#[derive(Debug, Clone)]
pub struct FinishedSpan {
    pub id: String,
    pub name: String,
    pub trace_id: String,
    pub parent_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub duration_ms: f64,
    pub attributes: Attributes,
}

#[derive(Debug, Default)]
struct StoreState {
    user_id: Option<String>,
    current_trace_id: Option<String>,
    current_span_id: Option<String>,
    active: HashMap<String, SpanRecord>,
    marks: HashMap<String, Instant>,
}

/// Session, user, trace, and span state for one logging domain
pub struct ContextStore {
    session_id: String,
    state: Mutex<StoreState>,
}

impl ContextStore {
    /// Create a store with an ephemeral session id
    pub fn new() -> Arc<Self> {
        Self::with_session_id(session::generate_session_id())
    }

    /// Create a store with a caller-supplied session id
    pub fn with_session_id(session_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            session_id: session_id.into(),
            state: Mutex::new(StoreState::default()),
        })
    }

    /// Create a store whose session id is persisted at `path`,
    /// created once and reused across restarts.
    pub fn with_session_file(path: &Path) -> Result<Arc<Self>> {
        Ok(Self::with_session_id(session::load_or_create(path)?))
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Snapshot of the ambient context (session, user, current trace/span)
    pub fn snapshot(&self) -> LogContext {
        let state = self.state.lock();
        LogContext {
            session_id: Some(self.session_id.clone()),
            user_id: state.user_id.clone(),
            trace_id: state.current_trace_id.clone(),
            span_id: state.current_span_id.clone(),
            ..Default::default()
        }
    }

    pub fn set_user(&self, user_id: impl Into<String>) {
        self.state.lock().user_id = Some(user_id.into());
    }

    pub fn clear_user(&self) {
        self.state.lock().user_id = None;
    }

    pub fn user_id(&self) -> Option<String> {
        self.state.lock().user_id.clone()
    }

    /// Assign a fresh trace id and clear the span cursor - a new trace
    /// starts with no parent span. Returns the id.
    pub fn start_trace(&self) -> String {
        let trace_id = Uuid::new_v4().to_string();
        let mut state = self.state.lock();
        state.current_trace_id = Some(trace_id.clone());
        state.current_span_id = None;
        trace_id
    }

    /// Open a span nested under the current cursor (push semantics).
    ///
    /// Lazily starts a trace if none is active, so every span has a
    /// trace id. The returned handle is the capability to end the span.
    pub fn start_span(
        self: &Arc<Self>,
        name: impl Into<String>,
        attrs: Option<Value>,
    ) -> SpanHandle {
        let name = name.into();
        let id = Uuid::new_v4().to_string();
        let started_at = Instant::now();
        let start_time = Utc::now();

        let mut state = self.state.lock();
        let trace_id = match &state.current_trace_id {
            Some(t) => t.clone(),
            None => {
                let t = Uuid::new_v4().to_string();
                state.current_trace_id = Some(t.clone());
                t
            }
        };
        let parent_id = state.current_span_id.clone();

        state.active.insert(
            id.clone(),
            SpanRecord {
                id: id.clone(),
                name: name.clone(),
                trace_id: trace_id.clone(),
                parent_id: parent_id.clone(),
                started_at,
                start_time,
                attributes: coerce_attrs(attrs),
            },
        );
        state.current_span_id = Some(id.clone());
        drop(state);

        SpanHandle {
            store: Arc::clone(self),
            id,
            name,
            trace_id,
            parent_id,
            started_at,
        }
    }

    /// End a span: merge `attrs`, remove it from the active map, and
    /// restore the cursor to the ended span's own parent (pop
    /// semantics). Unknown ids are a no-op - no cursor mutation.
    pub fn end_span(&self, id: &str, attrs: Option<Value>) -> Option<FinishedSpan> {
        let mut state = self.state.lock();
        let mut record = state.active.remove(id)?;
        for (k, v) in coerce_attrs(attrs) {
            record.attributes.insert(k, v);
        }
        state.current_span_id = record.parent_id.clone();
        drop(state);

        Some(FinishedSpan {
            duration_ms: record.started_at.elapsed().as_secs_f64() * 1000.0,
            id: record.id,
            name: record.name,
            trace_id: record.trace_id,
            parent_id: record.parent_id,
            start_time: record.start_time,
            attributes: record.attributes,
        })
    }

    pub fn span(&self, id: &str) -> Option<SpanRecord> {
        self.state.lock().active.get(id).cloned()
    }

    pub fn current_span(&self) -> Option<SpanRecord> {
        let state = self.state.lock();
        let id = state.current_span_id.as_ref()?;
        state.active.get(id).cloned()
    }

    pub fn current_trace_id(&self) -> Option<String> {
        self.state.lock().current_trace_id.clone()
    }

    pub fn current_span_id(&self) -> Option<String> {
        self.state.lock().current_span_id.clone()
    }

    /// Spans started but never ended accumulate here
    pub fn active_span_count(&self) -> usize {
        self.state.lock().active.len()
    }

    /// Record a named monotonic mark for `measure`
    pub fn mark(&self, name: impl Into<String>) {
        self.state.lock().marks.insert(name.into(), Instant::now());
    }

    pub fn mark_at(&self, name: &str) -> Option<Instant> {
        self.state.lock().marks.get(name).copied()
    }
}

impl std::fmt::Debug for ContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextStore")
            .field("session_id", &self.session_id)
            .field("active_spans", &self.active_span_count())
            .finish()
    }
}

/// Capability to end one span. Consumed by `end`, so a span can be
/// ended at most once through its handle; the snapshot fields stay
/// readable because ending mutates the store, not this value.
#[derive(Debug)]
pub struct SpanHandle {
    store: Arc<ContextStore>,
    id: String,
    name: String,
    trace_id: String,
    parent_id: Option<String>,
    started_at: Instant,
}

impl SpanHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64() * 1000.0
    }

    /// End the span, merging `attrs` into its attributes.
    ///
    /// Returns `None` if the span was already ended through the store.
    pub fn end(self, attrs: Option<Value>) -> Option<FinishedSpan> {
        self.store.end_span(&self.id, attrs)
    }
}

fn coerce_attrs(attrs: Option<Value>) -> Attributes {
    match attrs {
        None => Attributes::new(),
        Some(Value::Object(map)) => map,
        Some(other) => {
            let mut map = Attributes::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_carries_session_and_user() {
        let store = ContextStore::with_session_id("sess-1");
        store.set_user("user-9");

        let ctx = store.snapshot();
        assert_eq!(ctx.session_id.as_deref(), Some("sess-1"));
        assert_eq!(ctx.user_id.as_deref(), Some("user-9"));
        assert!(ctx.trace_id.is_none());

        store.clear_user();
        assert!(store.snapshot().user_id.is_none());
    }

    #[test]
    fn test_start_trace_clears_span_cursor() {
        let store = ContextStore::new();
        let s = store.start_span("warmup", None);
        assert_eq!(store.current_span_id().as_deref(), Some(s.id()));

        let trace_id = store.start_trace();
        assert_eq!(store.current_trace_id(), Some(trace_id));
        assert!(store.current_span_id().is_none());
    }

    #[test]
    fn test_first_span_lazily_allocates_trace() {
        let store = ContextStore::new();
        assert!(store.current_trace_id().is_none());

        let span = store.start_span("fetch", None);
        assert!(store.current_trace_id().is_some());
        assert_eq!(store.current_trace_id().as_deref(), Some(span.trace_id()));
    }

    #[test]
    fn test_lifo_nesting_restores_own_parent() {
        let store = ContextStore::new();
        store.start_trace();

        let s1 = store.start_span("s1", None);
        let s2 = store.start_span("s2", None);
        let s3 = store.start_span("s3", None);

        assert_eq!(s2.parent_id(), Some(s1.id()));
        assert_eq!(s3.parent_id(), Some(s2.id()));
        assert_eq!(store.current_span_id().as_deref(), Some(s3.id()));

        let s1_id = s1.id().to_string();
        let s2_id = s2.id().to_string();

        s3.end(None).unwrap();
        assert_eq!(store.current_span_id(), Some(s2_id.clone()));

        s2.end(None).unwrap();
        assert_eq!(store.current_span_id(), Some(s1_id));

        s1.end(None).unwrap();
        assert!(store.current_span_id().is_none());
        assert_eq!(store.active_span_count(), 0);
    }

    #[test]
    fn test_trace_then_nested_spans_scenario() {
        let store = ContextStore::new();
        store.start_trace();

        let fetch = store.start_span("fetch", None);
        let parse = store.start_span("parse", None);
        assert_eq!(parse.parent_id(), Some(fetch.id()));

        let fetch_id = fetch.id().to_string();
        parse.end(None).unwrap();
        assert_eq!(store.current_span_id(), Some(fetch_id));

        fetch.end(None).unwrap();
        assert!(store.current_span_id().is_none());
    }

    #[test]
    fn test_end_unknown_id_is_noop() {
        let store = ContextStore::new();
        let s = store.start_span("work", None);
        let cursor_before = store.current_span_id();

        assert!(store.end_span("no-such-span", None).is_none());
        assert_eq!(store.current_span_id(), cursor_before);

        // Ending through the store first makes the handle's end a no-op too
        let id = s.id().to_string();
        store.end_span(&id, None).unwrap();
        assert!(s.end(None).is_none());
    }

    #[test]
    fn test_end_merges_attributes() {
        let store = ContextStore::new();
        let s = store.start_span("load", Some(json!({"path": "/words"})));
        let finished = s.end(Some(json!({"status": 200}))).unwrap();

        assert_eq!(finished.attributes["path"], json!("/words"));
        assert_eq!(finished.attributes["status"], json!(200));
        assert!(finished.duration_ms >= 0.0);
    }

    #[test]
    fn test_span_ids_unique() {
        let store = ContextStore::new();
        let a = store.start_span("a", None);
        let a_id = a.id().to_string();
        a.end(None).unwrap();

        let b = store.start_span("b", None);
        assert_ne!(a_id, b.id());
    }

    #[test]
    fn test_marks() {
        let store = ContextStore::new();
        assert!(store.mark_at("start").is_none());
        store.mark("start");
        assert!(store.mark_at("start").is_some());
    }
}
