//! Logger core
//!
//! The façade callers hold: filters by level, merges ambient context
//! from the store, serializes errors, and fans entries out to every
//! registered transport. Loggers are cheap to clone; `child`/`scope`
//! derive namespaced loggers that share transports, level, and store.
//!
//! Transport failures are caught per-transport and reported with a
//! direct stderr print - one broken sink can neither crash callers nor
//! silence its siblings.

mod table;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};

use crate::context::{ContextStore, FinishedSpan, SpanHandle};
use crate::domain::{LogContext, LogEntry, LogLevel, LogPayload, SerializedError};
use crate::transport::{ConsoleTransport, Transport};

/// Environment variable overriding the default minimum level
pub const LEVEL_ENV_VAR: &str = "TRACELET_LOG";

struct Shared {
    transports: Vec<Arc<dyn Transport>>,
    store: Arc<ContextStore>,
}

/// Structured logger with level filtering, ambient context, and
/// multi-transport fan-out
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    namespace: String,
    context: LogContext,
    min_level: LogLevel,
    enabled: bool,
}

impl Logger {
    /// Builder with the given root namespace
    pub fn builder(namespace: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(namespace)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// The store this logger reads ambient context from
    pub fn store(&self) -> &Arc<ContextStore> {
        &self.shared.store
    }

    /// Whether a call at `level` would reach the transports
    pub fn should_log(&self, level: LogLevel) -> bool {
        self.enabled && level.rank() >= self.min_level.rank()
    }

    // ------------------------------------------------------------------
    // Level methods
    // ------------------------------------------------------------------

    pub fn trace(&self, message: impl Into<String>, payload: impl Into<LogPayload>) {
        self.log(LogLevel::Trace, message, payload);
    }

    pub fn debug(&self, message: impl Into<String>, payload: impl Into<LogPayload>) {
        self.log(LogLevel::Debug, message, payload);
    }

    pub fn info(&self, message: impl Into<String>, payload: impl Into<LogPayload>) {
        self.log(LogLevel::Info, message, payload);
    }

    pub fn warn(&self, message: impl Into<String>, payload: impl Into<LogPayload>) {
        self.log(LogLevel::Warn, message, payload);
    }

    pub fn error(&self, message: impl Into<String>, payload: impl Into<LogPayload>) {
        self.log(LogLevel::Error, message, payload);
    }

    pub fn fatal(&self, message: impl Into<String>, payload: impl Into<LogPayload>) {
        self.log(LogLevel::Fatal, message, payload);
    }

    /// Generic entry point used by the level methods. The payload can
    /// be `()`, a `serde_json::Value`, or `&err` for any
    /// `std::error::Error`.
    pub fn log(&self, level: LogLevel, message: impl Into<String>, payload: impl Into<LogPayload>) {
        let (data, error) = match payload.into() {
            LogPayload::None => (None, None),
            LogPayload::Data(v) => (Some(v), None),
            LogPayload::Error(e) => (None, Some(e)),
        };
        self.emit(level, message.into(), data, error, None);
    }

    // ------------------------------------------------------------------
    // Derivation
    // ------------------------------------------------------------------

    /// New logger with `namespace` joined under this one and `context`
    /// merged over this one's (child keys win). The parent is untouched.
    pub fn child(&self, namespace: &str, context: Option<LogContext>) -> Logger {
        Logger {
            shared: Arc::clone(&self.shared),
            namespace: format!("{}:{}", self.namespace, namespace),
            context: match context {
                Some(c) => self.context.merged(&c),
                None => self.context.clone(),
            },
            min_level: self.min_level,
            enabled: self.enabled,
        }
    }

    /// `child` without extra context
    pub fn scope(&self, namespace: &str) -> Logger {
        self.child(namespace, None)
    }

    // ------------------------------------------------------------------
    // Timing and spans
    // ------------------------------------------------------------------

    /// Run `f`, logging a debug completion entry with the wall-clock
    /// duration on success or an error entry on failure. The closure's
    /// result is returned unchanged either way.
    pub fn time<T, E, F>(&self, label: &str, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: std::error::Error,
    {
        let started = Instant::now();
        let result = f();
        self.log_timed(label, started, result.as_ref().err());
        result
    }

    /// Async counterpart of `time`; suspends only inside the wrapped work.
    pub async fn time_async<T, E, F, Fut>(&self, label: &str, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: std::error::Error,
    {
        let started = Instant::now();
        let result = f().await;
        self.log_timed(label, started, result.as_ref().err());
        result
    }

    fn log_timed<E: std::error::Error>(&self, label: &str, started: Instant, err: Option<&E>) {
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        match err {
            None => self.emit(
                LogLevel::Debug,
                format!("{label} completed"),
                None,
                None,
                Some(duration_ms),
            ),
            Some(e) => self.emit(
                LogLevel::Error,
                format!("{label} failed"),
                None,
                Some(SerializedError::from_error(e)),
                Some(duration_ms),
            ),
        }
    }

    /// Open a span via the store and log a debug "span started" entry.
    /// Ending the returned span also logs "span ended" with the elapsed
    /// duration, composing the store's own end.
    pub fn span(&self, name: &str, attrs: Option<Value>) -> LoggerSpan {
        let handle = self.shared.store.start_span(name, attrs);
        self.emit(
            LogLevel::Debug,
            format!("span started: {name}"),
            Some(json!({
                "span_id": handle.id(),
                "parent_id": handle.parent_id(),
            })),
            None,
            None,
        );
        LoggerSpan {
            handle,
            logger: self.clone(),
        }
    }

    /// Allocate a new trace id in the store and log it. Returns the id.
    pub fn start_trace(&self, name: &str) -> String {
        let trace_id = self.shared.store.start_trace();
        self.emit(
            LogLevel::Info,
            format!("trace started: {name}"),
            Some(json!({"trace": name, "trace_id": trace_id})),
            None,
            None,
        );
        trace_id
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    pub fn set_user(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        self.shared.store.set_user(user_id.clone());
        self.emit(
            LogLevel::Info,
            "user set".to_string(),
            Some(json!({"user_id": user_id})),
            None,
            None,
        );
    }

    pub fn clear_user(&self) {
        self.shared.store.clear_user();
        self.emit(LogLevel::Info, "user cleared".to_string(), None, None, None);
    }

    // ------------------------------------------------------------------
    // Developer ergonomics
    // ------------------------------------------------------------------

    /// Log rows of JSON objects as an aligned text table; gated by the
    /// debug threshold.
    pub fn table(&self, rows: &[Value], columns: Option<&[&str]>) {
        if !self.should_log(LogLevel::Debug) {
            return;
        }
        let rendered = table::render_table(rows, columns);
        self.emit(
            LogLevel::Debug,
            format!("table ({} rows)", rows.len()),
            Some(json!({"table": rendered})),
            None,
            None,
        );
    }

    /// Record a named monotonic mark for later `measure` calls
    pub fn mark(&self, name: &str) {
        self.shared.store.mark(name);
    }

    /// Log the elapsed time between two marks (or a mark and now) at
    /// debug level. Missing marks make this a silent no-op.
    pub fn measure(&self, name: &str, start_mark: &str, end_mark: Option<&str>) {
        if !self.should_log(LogLevel::Debug) {
            return;
        }
        let Some(start) = self.shared.store.mark_at(start_mark) else {
            return;
        };
        let end = match end_mark {
            Some(m) => match self.shared.store.mark_at(m) {
                Some(i) => i,
                None => return,
            },
            None => Instant::now(),
        };
        let duration_ms = end
            .checked_duration_since(start)
            .unwrap_or_default()
            .as_secs_f64()
            * 1000.0;
        self.emit(
            LogLevel::Debug,
            format!("measure: {name}"),
            Some(json!({"start_mark": start_mark, "end_mark": end_mark})),
            None,
            Some(duration_ms),
        );
    }

    /// Await `flush` on every transport; failures are reported, never
    /// propagated. Call before teardown.
    pub async fn flush(&self) {
        for transport in &self.shared.transports {
            if let Err(e) = transport.flush().await {
                eprintln!("[tracelet] transport '{}' flush failed: {e}", transport.name());
            }
        }
    }

    // ------------------------------------------------------------------
    // Write path
    // ------------------------------------------------------------------

    fn emit(
        &self,
        level: LogLevel,
        message: String,
        data: Option<Value>,
        error: Option<SerializedError>,
        duration_ms: Option<f64>,
    ) {
        if !self.should_log(level) {
            return;
        }

        // Ambient context is additive; the logger's static context
        // loses to nothing.
        let ambient = self.shared.store.snapshot();
        let context = ambient.merged(&self.context);

        let mut entry = LogEntry::new(level, &self.namespace, message);
        entry.trace_id = context.trace_id.clone();
        entry.span_id = context.span_id.clone();
        entry.data = data;
        entry.error = error;
        entry.duration_ms = duration_ms;
        if !context.is_empty() {
            entry.context = Some(context);
        }

        for transport in &self.shared.transports {
            if let Err(e) = transport.write(&entry) {
                eprintln!("[tracelet] transport '{}' write failed: {e}", transport.name());
            }
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("namespace", &self.namespace)
            .field("min_level", &self.min_level)
            .field("enabled", &self.enabled)
            .field("transports", &self.shared.transports.len())
            .finish()
    }
}

/// A store span paired with the logger that opened it. Ending it ends
/// the store span and logs the elapsed duration.
#[derive(Debug)]
pub struct LoggerSpan {
    handle: SpanHandle,
    logger: Logger,
}

impl LoggerSpan {
    pub fn id(&self) -> &str {
        self.handle.id()
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn trace_id(&self) -> &str {
        self.handle.trace_id()
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.handle.parent_id()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.handle.elapsed_ms()
    }

    /// End the span. Returns `None` if it was already ended through the
    /// store directly.
    pub fn end(self, attrs: Option<Value>) -> Option<FinishedSpan> {
        let LoggerSpan { handle, logger } = self;
        let name = handle.name().to_string();
        let finished = handle.end(attrs)?;
        logger.emit(
            LogLevel::Debug,
            format!("span ended: {name}"),
            Some(json!({
                "span_id": finished.id.clone(),
                "attributes": finished.attributes.clone(),
            })),
            None,
            Some(finished.duration_ms),
        );
        Some(finished)
    }
}

/// Resolves every logger option concretely at construction - defaults,
/// environment override, transports, and store.
pub struct LoggerBuilder {
    namespace: String,
    min_level: Option<LogLevel>,
    enabled: bool,
    context: LogContext,
    transports: Vec<Arc<dyn Transport>>,
    store: Option<Arc<ContextStore>>,
}

impl LoggerBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            min_level: None,
            enabled: true,
            context: LogContext::default(),
            transports: Vec::new(),
            store: None,
        }
    }

    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    /// Register a transport; order of registration is fan-out order
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transports.push(transport);
        self
    }

    pub fn store(mut self, store: Arc<ContextStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Precedence for the level: explicit > `TRACELET_LOG` > info.
    /// Without registered transports the console transport is used.
    pub fn build(self) -> Logger {
        let min_level = self
            .min_level
            .or_else(|| std::env::var(LEVEL_ENV_VAR).ok().and_then(|v| LogLevel::parse(&v)))
            .unwrap_or(LogLevel::Info);

        let transports = if self.transports.is_empty() {
            vec![Arc::new(ConsoleTransport::default()) as Arc<dyn Transport>]
        } else {
            self.transports
        };

        Logger {
            shared: Arc::new(Shared {
                transports,
                store: self.store.unwrap_or_else(ContextStore::new),
            }),
            namespace: self.namespace,
            context: self.context,
            min_level,
            enabled: self.enabled,
        }
    }
}
