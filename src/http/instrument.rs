//! Request instrumentation middleware.
//!
//! # Data Flow
//! ```text
//! request
//!     → extract X-REQUEST-ID, build TraceContext (label = request path)
//!     → validate trace header ── invalid → PARAM_INVALID envelope (handler skipped)
//!     → insert TraceContext, run handler (verbose: tee the request body)
//!     → tee the response body to the client
//!     → on body completion: decode envelope, resolve severity, emit record
//! ```
//!
//! # Design Decisions
//! - Duration stops when the handler returns, not when the body drains
//! - The record is emitted when the response body finishes or is dropped
//! - A body that is not an envelope still produces a record (SUCCESS, remarked)
//! - Captures keep at most `capture_limit` bytes; longer bodies are remarked

use axum::body::Body;
use axum::extract::{MatchedPath, Request, State};
use axum::http::header::{HOST, USER_AGENT};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::context::TraceContext;
use crate::http::capture::{CaptureBody, Captured};
use crate::http::envelope::Envelope;
use crate::http::X_REQUEST_ID;
use crate::logger::{Attr, Logger, Message, Monitor};
use crate::observability::metrics;
use crate::outcome::{Code, CodeRegistry};
use crate::validate::{Field, Validate, Validator};

pub const DEFAULT_TRACE_LABEL: &str = "trace id";

/// Bytes of each body kept for the record.
pub const DEFAULT_CAPTURE_LIMIT: usize = 1024 * 1024;

/// How much of the exchange is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentMode {
    /// Request metadata and response status.
    #[default]
    Normal,
    /// Normal plus query, request body and the decoded response envelope.
    Verbose,
}

/// Inbound trace header as a validated structure.
struct TraceHeader<'a> {
    value: &'a str,
    label: &'a str,
}

impl Validate for TraceHeader<'_> {
    fn fields(&self) -> Vec<Field> {
        vec![Field::new(
            "x_request_id",
            Cow::Owned(self.label.to_string()),
            self.value,
            "required,min=16,max=100",
        )]
    }
}

#[derive(Clone)]
struct Shared {
    logger: Arc<Logger>,
    registry: Arc<CodeRegistry>,
    validator: Validator,
    trace_label: String,
    capture_limit: usize,
}

/// Middleware state. Cheap to clone; one per mounted route.
#[derive(Clone)]
pub struct Instrumentation {
    shared: Arc<Shared>,
    mode: InstrumentMode,
}

impl Instrumentation {
    pub fn new(logger: Arc<Logger>, registry: Arc<CodeRegistry>, validator: Validator) -> Self {
        Self {
            shared: Arc::new(Shared {
                logger,
                registry,
                validator,
                trace_label: DEFAULT_TRACE_LABEL.to_string(),
                capture_limit: DEFAULT_CAPTURE_LIMIT,
            }),
            mode: InstrumentMode::Normal,
        }
    }

    /// Display name of the trace header in validation messages.
    pub fn with_trace_label(self, label: impl Into<String>) -> Self {
        let mut shared = (*self.shared).clone();
        shared.trace_label = label.into();
        Self {
            shared: Arc::new(shared),
            mode: self.mode,
        }
    }

    /// Upper bound on the bytes of each body kept for the record.
    pub fn with_capture_limit(self, limit: usize) -> Self {
        let mut shared = (*self.shared).clone();
        shared.capture_limit = limit;
        Self {
            shared: Arc::new(shared),
            mode: self.mode,
        }
    }

    /// Same state, different mode.
    pub fn mode(&self, mode: InstrumentMode) -> Self {
        Self {
            shared: self.shared.clone(),
            mode,
        }
    }

    pub fn current_mode(&self) -> InstrumentMode {
        self.mode
    }
}

/// Middleware function; mount with `axum::middleware::from_fn_with_state`.
pub async fn instrument(State(inst): State<Instrumentation>, mut req: Request, next: Next) -> Response {
    let started = Instant::now();

    let trace = first_trace_header(req.headers());
    let path = req.uri().path().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let ctx = TraceContext::new(trace.clone(), path.clone());
    let method = req.method().to_string();
    let inp = request_metadata(&req, &route);
    let verbose = inst.mode == InstrumentMode::Verbose;

    let header = TraceHeader {
        value: &trace,
        label: &inst.shared.trace_label,
    };
    let (response, request_body) = match inst.shared.validator.validate(&header) {
        Err(err) => {
            tracing::debug!(trace = %trace, path = %path, reason = %err, "Rejected request trace header");
            let envelope = Envelope::failure(&ctx, Code::PARAM_INVALID, err.message());
            // the handler never reads the body, so only the query is known
            let request_body = verbose.then(|| RequestBody {
                query: query_params(&req),
                body: Arc::new(OnceCell::new()),
            });
            (envelope.into_response(), request_body)
        }
        Ok(()) => {
            let request_body = verbose.then(|| tee_request(&mut req, inst.shared.capture_limit));
            req.extensions_mut().insert(ctx.clone());
            (next.run(req).await, request_body)
        }
    };
    let elapsed = started.elapsed();

    let (parts, body) = response.into_parts();
    let pending = PendingRecord {
        shared: inst.shared.clone(),
        mode: inst.mode,
        ctx,
        method,
        status: parts.status,
        elapsed,
        inp,
        request_body,
    };
    let limit = inst.shared.capture_limit;
    let body = CaptureBody::wrap_limited(body, limit, move |captured| pending.emit(captured));
    Response::from_parts(parts, body)
}

fn first_trace_header(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default()
}

/// `inp` metadata; `path` is the route pattern when one matched.
fn request_metadata(req: &Request, route: &str) -> Map<String, Value> {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let host = match header(HOST) {
        h if h.is_empty() => req.uri().host().unwrap_or_default().to_string(),
        h => h,
    };

    let mut inp = Map::new();
    inp.insert("host".into(), Value::String(host));
    inp.insert("path".into(), Value::String(route.to_string()));
    inp.insert("user-agent".into(), Value::String(header(USER_AGENT)));
    inp.insert("method".into(), Value::String(req.method().to_string()));
    inp
}

/// Captured request pieces for verbose records.
struct RequestBody {
    query: Map<String, Value>,
    body: Arc<OnceCell<Captured>>,
}

fn query_params(req: &Request) -> Map<String, Value> {
    req.uri()
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
                .collect()
        })
        .unwrap_or_default()
}

fn tee_request(req: &mut Request, limit: usize) -> RequestBody {
    let query = query_params(req);

    let cell = Arc::new(OnceCell::new());
    let sink = cell.clone();
    let body = std::mem::replace(req.body_mut(), Body::empty());
    *req.body_mut() = CaptureBody::wrap_limited(body, limit, move |captured| {
        let _ = sink.set(captured);
    });

    RequestBody { query, body: cell }
}

/// Everything needed to emit the record once the response body is done.
struct PendingRecord {
    shared: Arc<Shared>,
    mode: InstrumentMode,
    ctx: TraceContext,
    method: String,
    status: StatusCode,
    elapsed: Duration,
    inp: Map<String, Value>,
    request_body: Option<RequestBody>,
}

impl PendingRecord {
    fn emit(self, captured: Captured) {
        let limit = self.shared.capture_limit;
        let mut remarks = Vec::new();
        let envelope = match Envelope::decode(&captured.bytes) {
            Some(envelope) => envelope,
            None if captured.truncated => {
                remarks.push(format!("response body truncated at {limit} bytes"));
                Envelope::default()
            }
            None => {
                remarks.push(format!(
                    "response body is not an envelope ({} bytes)",
                    captured.bytes.len()
                ));
                Envelope::default()
            }
        };
        let severity = self.shared.registry.lookup(envelope.code).severity;

        let mut inp = self.inp;
        if let Some(request) = self.request_body {
            let body = match request.body.get() {
                Some(body) => {
                    if body.truncated {
                        remarks.push(format!("request body truncated at {limit} bytes"));
                    }
                    body_value(&body.bytes)
                }
                None => Value::Null,
            };
            let mut param = Map::new();
            param.insert("query".into(), Value::Object(request.query));
            param.insert("body".into(), body);
            inp.insert("param".into(), Value::Object(param));
        }

        let mut oup = Map::new();
        oup.insert("status_code".into(), Value::from(self.status.as_u16()));
        if self.mode == InstrumentMode::Verbose {
            oup.insert(
                "response".into(),
                serde_json::to_value(&envelope).unwrap_or(Value::Null),
            );
        }

        let attr = Attr {
            monitor: Monitor {
                is_final: true,
                level: severity,
                code: envelope.code,
                process_duration: self.elapsed.as_millis() as i64,
                process_delay: 0,
            },
            inp,
            oup,
        };

        metrics::record_request(&self.method, envelope.code, self.elapsed);

        let message = Message::new(envelope.message)
            .label(self.ctx.label().to_string())
            .remark(remarks.join("; "))
            .attr(attr);
        self.shared.logger.log(severity, &self.ctx, message);
    }
}

/// JSON bodies are kept structured, anything else as text.
fn body_value(bytes: &Bytes) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{LoggerOption, MemorySink};
    use crate::outcome::Severity;
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    const TRACE: &str = "abcdefghijklmnopqrst";

    fn instrumentation(sink: Arc<MemorySink>) -> Instrumentation {
        let option = LoggerOption {
            application: "boxkit".into(),
            env: "test".into(),
            label: "http".into(),
            ..Default::default()
        };
        Instrumentation::new(
            Arc::new(Logger::with_sink(sink, &option)),
            Arc::new(CodeRegistry::default()),
            Validator::default(),
        )
    }

    fn app(inst: Instrumentation) -> Router {
        Router::new()
            .route("/text", get(|| async { "not json" }))
            .route(
                "/fail",
                get(|ctx: TraceContext| async move {
                    Envelope::failure(&ctx, Code::CALL_ERROR, "downstream broke")
                }),
            )
            .route_layer(axum::middleware::from_fn_with_state(inst, instrument))
    }

    async fn call(app: Router, uri: &str, trace: Option<&str>) -> Bytes {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(trace) = trace {
            builder = builder.header("x-request-id", trace);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn test_short_trace_is_rejected() {
        let sink = Arc::new(MemorySink::new());
        let body = call(app(instrumentation(sink.clone())), "/text", Some("short")).await;

        let envelope = Envelope::decode(&body).unwrap();
        assert_eq!(envelope.code, Code::PARAM_INVALID);
        assert_eq!(envelope.trace, "short");
        assert_eq!(envelope.message, "trace id length must be ≥ 16");
        assert_eq!(sink.records()[0].0, Severity::Error);
    }

    #[tokio::test]
    async fn test_custom_trace_label() {
        let sink = Arc::new(MemorySink::new());
        let inst = instrumentation(sink).with_trace_label("追踪编码");
        let body = call(app(inst), "/text", None).await;
        let envelope = Envelope::decode(&body).unwrap();
        assert_eq!(envelope.message, "追踪编码 is required");
    }

    #[tokio::test]
    async fn test_non_envelope_body_is_remarked() {
        let sink = Arc::new(MemorySink::new());
        let body = call(app(instrumentation(sink.clone())), "/text", Some(TRACE)).await;
        assert_eq!(&body[..], b"not json");

        let (severity, record) = sink.records().remove(0);
        assert_eq!(severity, Severity::Info);
        assert_eq!(record.code(), Code::SUCCESS);
        assert!(record.remark.contains("not an envelope"));
        assert_eq!(record.label, "/text");
    }

    #[tokio::test]
    async fn test_severity_follows_registry() {
        let sink = Arc::new(MemorySink::new());
        call(app(instrumentation(sink.clone())), "/fail", Some(TRACE)).await;

        let (severity, record) = sink.records().remove(0);
        assert_eq!(severity, Severity::Error);
        assert_eq!(record.attr.monitor.level, Severity::Error);
        assert_eq!(record.code(), Code::CALL_ERROR);
        assert_eq!(record.text, "downstream broke");
        assert!(record.attr.monitor.is_final);
        assert!(!record.attr.oup.contains_key("response"));
    }

    #[tokio::test]
    async fn test_rejected_verbose_request_keeps_query() {
        let sink = Arc::new(MemorySink::new());
        let inst = instrumentation(sink.clone()).mode(InstrumentMode::Verbose);
        call(app(inst), "/text?kind=cat&page=2", None).await;

        let (_, record) = sink.records().remove(0);
        assert_eq!(record.code(), Code::PARAM_INVALID);
        let param = &record.attr.inp["param"];
        assert_eq!(param["query"]["kind"], "cat");
        assert_eq!(param["query"]["page"], "2");
        assert_eq!(param["body"], Value::Null);
        assert_eq!(record.attr.oup["response"]["code"], Code::PARAM_INVALID.0);
    }

    #[tokio::test]
    async fn test_oversized_response_is_truncated_in_record() {
        let sink = Arc::new(MemorySink::new());
        let inst = instrumentation(sink.clone())
            .with_capture_limit(4)
            .mode(InstrumentMode::Verbose);
        let body = call(app(inst), "/text", Some(TRACE)).await;
        assert_eq!(&body[..], b"not json");

        let (severity, record) = sink.records().remove(0);
        assert_eq!(severity, Severity::Info);
        assert_eq!(record.code(), Code::SUCCESS);
        assert_eq!(record.remark, "response body truncated at 4 bytes");
    }

    #[test]
    fn test_body_value() {
        assert_eq!(body_value(&Bytes::from_static(b"{\"a\":1}")), serde_json::json!({"a": 1}));
        assert_eq!(body_value(&Bytes::from_static(b"a=1")), Value::String("a=1".into()));
        assert_eq!(body_value(&Bytes::new()), Value::Null);
    }
}
