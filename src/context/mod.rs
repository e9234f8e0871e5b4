//! Request-scoped trace context.
//!
//! # Data Flow
//! ```text
//! X-REQUEST-ID header
//!     → http::instrument (extract + validate at the pipeline edge)
//!     → TraceContext inserted into request extensions
//!     → handlers take `TraceContext` as an extractor argument
//!     → facades (logger, request, cache) receive `&TraceContext`
//! ```
//!
//! # Design Decisions
//! - Built once per request and never mutated
//! - Always present below the pipeline edge; no "maybe absent" trace ids
//! - Work outside a request uses `TraceContext::detached`

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use serde::Serialize;
use std::fmt;

/// Trace id plus the label (originating path or task name) it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TraceContext {
    trace: String,
    label: String,
}

impl TraceContext {
    pub fn new(trace: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            trace: trace.into(),
            label: label.into(),
        }
    }

    /// Context for work that did not come from a request (startup, jobs).
    ///
    /// The generated id is 32 hex characters, so it passes header validation
    /// when propagated to another service.
    pub fn detached(label: impl Into<String>) -> Self {
        Self::new(uuid::Uuid::new_v4().simple().to_string(), label)
    }

    pub fn trace(&self) -> &str {
        &self.trace
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Same trace id under a different label.
    pub fn with_label(&self, label: impl Into<String>) -> Self {
        Self::new(self.trace.clone(), label)
    }
}

impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.trace)
    }
}

impl<S> FromRequestParts<S> for TraceContext
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<TraceContext>() {
            Some(ctx) => Ok(ctx.clone()),
            None => {
                tracing::error!(path = %parts.uri.path(), "Handler mounted without instrumentation");
                Err(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
