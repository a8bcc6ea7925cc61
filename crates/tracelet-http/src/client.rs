//! Instrumented HTTP client
//!
//! Wraps a `reqwest::Client` so every call gets a span, outbound trace
//! propagation headers, redacted/truncated request and response logging,
//! and a classified error entry on failure. Per-request state (start
//! instant, span) lives on the call's stack, so concurrent in-flight
//! requests never cross-contaminate each other's timing or spans.

use std::time::{Duration, Instant};

use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

use tracelet_core::Logger;

use crate::redact::{human_size, redact_headers, truncate_body, MAX_BODY_PREVIEW_CHARS};

/// Outbound trace propagation headers. One-directional: nothing is
/// parsed on the way back in.
pub const HEADER_TRACE_ID: &str = "X-Trace-ID";
pub const HEADER_SPAN_ID: &str = "X-Span-ID";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Why a call produced no usable response
#[derive(Error, Debug)]
pub enum HttpError {
    /// The request was never sent (bad method, unparsable URL, builder failure)
    #[error("request setup failed: {0}")]
    Setup(String),

    /// The request went out but nothing usable came back (network,
    /// timeout, connection reset mid-body)
    #[error("no response received: {0}")]
    NoResponse(#[source] reqwest::Error),
}

/// Classification tag attached to failure log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ServerError,
    NoResponse,
    RequestSetup,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServerError => "server_error",
            Self::NoResponse => "no_response",
            Self::RequestSetup => "request_setup",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Character cap for logged body previews
    pub max_body_preview_chars: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: "tracelet/0.1".to_string(),
            max_body_preview_chars: MAX_BODY_PREVIEW_CHARS,
        }
    }
}

/// One outbound request, built up before `send`
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: String,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_uppercase(),
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A received response, body already read
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// HTTP client with request/response tracing
pub struct InstrumentedClient {
    client: reqwest::Client,
    logger: Logger,
    config: HttpConfig,
}

impl InstrumentedClient {
    pub fn new(logger: Logger) -> Self {
        Self::with_config(logger, HttpConfig::default())
    }

    pub fn with_config(logger: Logger, config: HttpConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            logger,
            config,
        }
    }

    /// Use an already-built client (custom TLS, proxies, test setups)
    pub fn from_client(client: reqwest::Client, logger: Logger, config: HttpConfig) -> Self {
        Self {
            client,
            logger,
            config,
        }
    }

    pub async fn get(&self, url: impl Into<String>) -> Result<HttpResponse, HttpError> {
        self.send(RequestSpec::new("GET", url)).await
    }

    pub async fn post_json(
        &self,
        url: impl Into<String>,
        body: Value,
    ) -> Result<HttpResponse, HttpError> {
        self.send(RequestSpec::new("POST", url).json_body(body)).await
    }

    /// Send a request with full instrumentation.
    ///
    /// Non-2xx responses are returned as `Ok` (the caller still gets
    /// the response) but logged as a single `server_error`-classified
    /// entry. Every failed call produces exactly one classified entry.
    pub async fn send(&self, spec: RequestSpec) -> Result<HttpResponse, HttpError> {
        let method = match Method::from_bytes(spec.method.as_bytes()) {
            Ok(m) => m,
            Err(e) => return Err(self.setup_failure(&spec, &e.to_string())),
        };
        let url = match Url::parse(&spec.url) {
            Ok(u) => u,
            Err(e) => return Err(self.setup_failure(&spec, &e.to_string())),
        };

        let started = Instant::now();
        let span = self.logger.span(
            &format!("HTTP {} {}", spec.method, spec.url),
            Some(json!({"method": spec.method, "url": spec.url})),
        );

        let body_preview = spec
            .body
            .as_ref()
            .map(|b| truncate_body(&b.to_string(), self.config.max_body_preview_chars));
        self.logger.debug(
            format!("→ {} {}", spec.method, spec.url),
            json!({
                "method": spec.method,
                "url": spec.url,
                "params": Value::Object(
                    spec.query
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect(),
                ),
                "headers": redact_headers(&spec.headers),
                "body": body_preview,
            }),
        );

        let mut builder = self
            .client
            .request(method, url)
            .header(HEADER_TRACE_ID, span.trace_id())
            .header(HEADER_SPAN_ID, span.id());
        if !spec.query.is_empty() {
            builder = builder.query(&spec.query);
        }
        for (name, value) in &spec.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &spec.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                span.end(Some(json!({"error": true})));
                self.log_no_response(&spec, started, &e);
                return Err(HttpError::NoResponse(e));
            }
        };

        let status = response.status();
        let content_length = response.content_length();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                span.end(Some(json!({"error": true})));
                self.log_no_response(&spec, started, &e);
                return Err(HttpError::NoResponse(e));
            }
        };

        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        let size = human_size(content_length.unwrap_or(body.len() as u64));
        let preview = truncate_body(&body, self.config.max_body_preview_chars);

        if status.is_success() {
            span.end(Some(json!({"status": status.as_u16()})));
            self.logger.info(
                format!("← ✓ {} {} {}", status.as_u16(), spec.method, spec.url),
                json!({
                    "method": spec.method,
                    "url": spec.url,
                    "status": status.as_u16(),
                    "duration_ms": duration_ms,
                    "size": size,
                    "body": preview,
                }),
            );
        } else {
            span.end(Some(json!({"status": status.as_u16(), "error": true})));
            self.log_server_error(&spec, status, duration_ms, &size, &preview);
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }

    fn setup_failure(&self, spec: &RequestSpec, reason: &str) -> HttpError {
        // Never sent, so no span was opened for it
        self.logger.error(
            format!("✗ {} {} request setup failed", spec.method, spec.url),
            json!({
                "classification": FailureKind::RequestSetup.as_str(),
                "method": spec.method,
                "url": spec.url,
                "error": reason,
            }),
        );
        HttpError::Setup(reason.to_string())
    }

    fn log_no_response(&self, spec: &RequestSpec, started: Instant, err: &reqwest::Error) {
        self.logger.error(
            format!("✗ {} {} no response", spec.method, spec.url),
            json!({
                "classification": FailureKind::NoResponse.as_str(),
                "method": spec.method,
                "url": spec.url,
                "error": err.to_string(),
                "timed_out": err.is_timeout(),
                "duration_ms": started.elapsed().as_secs_f64() * 1000.0,
            }),
        );
    }

    fn log_server_error(
        &self,
        spec: &RequestSpec,
        status: StatusCode,
        duration_ms: f64,
        size: &str,
        preview: &str,
    ) {
        self.logger.error(
            format!("← ⚠ {} {} {}", status.as_u16(), spec.method, spec.url),
            json!({
                "classification": FailureKind::ServerError.as_str(),
                "method": spec.method,
                "url": spec.url,
                "status": status.as_u16(),
                "duration_ms": duration_ms,
                "size": size,
                "body": preview,
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracelet_core::transport::BufferTransport;
    use tracelet_core::LogLevel;

    fn capture_client() -> (InstrumentedClient, Arc<BufferTransport>) {
        let sink = Arc::new(BufferTransport::collector(10_000));
        let logger = Logger::builder("http")
            .min_level(LogLevel::Trace)
            .transport(sink.clone())
            .build();
        (InstrumentedClient::new(logger), sink)
    }

    #[test]
    fn test_request_spec_builder() {
        let spec = RequestSpec::new("post", "https://api.test/words")
            .query("lang", "fr")
            .header("Accept", "application/json")
            .json_body(json!({"word": "chien"}));

        assert_eq!(spec.method, "POST");
        assert_eq!(spec.query, vec![("lang".to_string(), "fr".to_string())]);
        assert_eq!(spec.body, Some(json!({"word": "chien"})));
    }

    #[test]
    fn test_failure_kind_tags() {
        assert_eq!(FailureKind::ServerError.as_str(), "server_error");
        assert_eq!(FailureKind::NoResponse.as_str(), "no_response");
        assert_eq!(FailureKind::RequestSetup.as_str(), "request_setup");
    }

    #[tokio::test]
    async fn test_invalid_url_classified_as_setup() {
        let (client, sink) = capture_client();
        let result = client.get("not a url").await;

        assert!(matches!(result, Err(HttpError::Setup(_))));
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].data.as_ref().unwrap()["classification"],
            json!("request_setup")
        );
        // Request never went on the wire: no span was opened
        assert_eq!(client.logger.store().active_span_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_method_classified_as_setup() {
        let (client, sink) = capture_client();
        let result = client
            .send(RequestSpec::new("BAD METHOD", "https://api.test/"))
            .await;
        assert!(matches!(result, Err(HttpError::Setup(_))));
        assert_eq!(sink.entries().len(), 1);
    }

    #[test]
    fn test_response_json_helper() {
        let response = HttpResponse {
            status: 200,
            headers: vec![],
            body: "{\"ok\":true}".to_string(),
        };
        assert!(response.is_success());
        let parsed: Value = response.json().unwrap();
        assert_eq!(parsed["ok"], json!(true));

        let error_response = HttpResponse {
            status: 502,
            headers: vec![],
            body: String::new(),
        };
        assert!(!error_response.is_success());
    }
}
