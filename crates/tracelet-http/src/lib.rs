//! # Tracelet HTTP
//!
//! Request/response instrumentation over `reqwest`: every call through
//! `InstrumentedClient` gets a span, outbound `X-Trace-ID` /
//! `X-Span-ID` propagation headers, redacted and size-capped payload
//! logging, and a classified error entry (`server_error`,
//! `no_response`, or `request_setup`) on failure.

mod client;
pub mod redact;

pub use client::{
    FailureKind, HttpConfig, HttpError, HttpResponse, InstrumentedClient, RequestSpec,
    HEADER_SPAN_ID, HEADER_TRACE_ID,
};
pub use redact::{REDACTION_MARKER, SENSITIVE_HEADERS};
