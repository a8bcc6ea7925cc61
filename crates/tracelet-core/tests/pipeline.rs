//! End-to-end pipeline tests: logger + store + multiple transports.

use std::sync::Arc;

use serde_json::json;

use tracelet_core::transport::{BufferTransport, Transport};
use tracelet_core::{ContextStore, LogLevel, Logger};

fn capture_pair() -> (Logger, Arc<BufferTransport>, Arc<BufferTransport>) {
    let a = Arc::new(BufferTransport::collector(10_000));
    let b = Arc::new(BufferTransport::collector(10_000));
    let logger = Logger::builder("app")
        .min_level(LogLevel::Trace)
        .transport(a.clone())
        .transport(b.clone())
        .build();
    (logger, a, b)
}

#[test]
fn trace_and_nested_spans_walk_the_cursor() {
    let store = ContextStore::with_session_id("sess-e2e");
    let sink = Arc::new(BufferTransport::collector(10_000));
    let logger = Logger::builder("app")
        .min_level(LogLevel::Trace)
        .store(store.clone())
        .transport(sink.clone())
        .build();

    let trace_id = logger.start_trace("load");

    let fetch = logger.span("fetch", None);
    let fetch_id = fetch.id().to_string();
    assert_eq!(fetch.trace_id(), trace_id);
    assert!(fetch.parent_id().is_none());

    let parse = logger.span("parse", None);
    assert_eq!(parse.parent_id(), Some(fetch_id.as_str()));

    logger.debug("parsing morphology", json!({"tokens": 42}));

    parse.end(None).unwrap();
    assert_eq!(store.current_span_id(), Some(fetch_id.clone()));

    fetch.end(None).unwrap();
    assert!(store.current_span_id().is_none());
    assert_eq!(store.active_span_count(), 0);

    // The debug entry inside both spans carries the innermost span id
    let entries = sink.entries();
    let inner = entries
        .iter()
        .find(|e| e.message == "parsing morphology")
        .unwrap();
    assert_eq!(inner.trace_id.as_deref(), Some(trace_id.as_str()));
    assert_ne!(inner.span_id.as_deref(), Some(fetch_id.as_str()));
    let ctx = inner.context.as_ref().unwrap();
    assert_eq!(ctx.session_id.as_deref(), Some("sess-e2e"));
}

#[test]
fn fan_out_reaches_every_transport_in_order() {
    let (logger, a, b) = capture_pair();

    logger.info("first", ());
    logger.warn("second", ());
    logger.error("third", ());

    for sink in [&a, &b] {
        let messages: Vec<String> = sink.entries().iter().map(|e| e.message.clone()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }
}

#[test]
fn child_loggers_share_the_ambient_store() {
    let (logger, a, _b) = capture_pair();
    let child = logger.scope("srs");

    let span = logger.span("review", None);
    child.info("card shown", ());
    span.end(None);

    let entries = a.entries();
    let from_child = entries.iter().find(|e| e.message == "card shown").unwrap();
    assert_eq!(from_child.namespace, "app:srs");
    assert_eq!(from_child.span_id.as_deref(), Some(span_id(&entries)));
}

// The "span started" entry records its own id in data
fn span_id(entries: &[tracelet_core::LogEntry]) -> &str {
    entries
        .iter()
        .find(|e| e.message.starts_with("span started"))
        .and_then(|e| e.data.as_ref())
        .and_then(|d| d.get("span_id"))
        .and_then(|v| v.as_str())
        .unwrap()
}

#[tokio::test]
async fn flush_drains_batching_transports() {
    use parking_lot::Mutex;

    let flushed: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = flushed.clone();
    let buffer = Arc::new(BufferTransport::new(
        5,
        Arc::new(move |batch| sink.lock().push(batch.len())),
    ));
    let logger = Logger::builder("app")
        .min_level(LogLevel::Trace)
        .transport(buffer.clone() as Arc<dyn Transport>)
        .build();

    for n in 0..7 {
        logger.info(format!("entry {n}"), ());
    }
    // Five flushed automatically, two still queued
    assert_eq!(*flushed.lock(), vec![5]);
    assert_eq!(buffer.len(), 2);

    logger.flush().await;
    assert_eq!(*flushed.lock(), vec![5, 2]);
    assert!(buffer.is_empty());
}
