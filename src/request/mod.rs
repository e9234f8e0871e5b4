//! Outbound HTTP client facade.
//!
//! # Data Flow
//! ```text
//! RequestParam (validated: link must be a URL)
//!     → client.rs (X-REQUEST-ID from TraceContext, timeout, proxy, headers)
//!     → status mapping (200/201 ok, 404 CHECK, 429 LIMIT_ERROR, other STATUS_ERROR)
//!     → HttpResult { text, status_code }
//! ```
//!
//! # Design Decisions
//! - The caller's trace id is always propagated downstream
//! - Proxy strings of six characters or fewer are treated as unset
//! - A shared client serves plain requests; proxy or skip-verify builds a one-off client

pub mod client;

pub use client::ReqwestClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::TraceContext;
use crate::factory::BackendFactory;
use crate::outcome::BoxResult;
use crate::validate::{Field, Validate};

/// Seconds allowed for a request whose param leaves the timeout at zero.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Outbound HTTP calls carrying the caller's trace.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, ctx: &TraceContext, param: RequestParam) -> BoxResult<HttpResult>;

    /// POST `param.payload` as JSON.
    async fn post(&self, ctx: &TraceContext, param: RequestParam) -> BoxResult<HttpResult>;
}

/// Body and status of a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResult {
    pub text: String,
    pub status_code: u16,
}

/// Per-call parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestParam {
    pub link: String,
    pub payload: String,
    /// Zero means the client default.
    pub timeout_secs: u64,
    pub proxy: String,
    pub skip_verify: bool,
    /// Send Host, Referer and a browser User-Agent derived from the link.
    pub enable_header: bool,
}

impl RequestParam {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            ..Default::default()
        }
    }

    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = proxy.into();
        self
    }

    pub fn skip_verify(mut self, skip: bool) -> Self {
        self.skip_verify = skip;
        self
    }

    pub fn enable_header(mut self, enable: bool) -> Self {
        self.enable_header = enable;
        self
    }

    /// The proxy to use, if it is long enough to be one.
    pub fn effective_proxy(&self) -> Option<&str> {
        (self.proxy.chars().count() > 6).then_some(self.proxy.as_str())
    }
}

impl Validate for RequestParam {
    fn fields(&self) -> Vec<Field> {
        vec![Field::new("link", "link", &self.link, "required,url")]
    }
}

/// Options of the HTTP client facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOption {
    /// User-Agent for requests without `enable_header`.
    pub user_agent: String,
    pub default_timeout_secs: u64,
}

impl Default for RequestOption {
    fn default() -> Self {
        Self {
            user_agent: concat!("boxkit/", env!("CARGO_PKG_VERSION")).to_string(),
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Validate for RequestOption {
    fn fields(&self) -> Vec<Field> {
        vec![Field::new(
            "default_timeout_secs",
            "default timeout",
            self.default_timeout_secs,
            "gte=1,lte=600",
        )]
    }
}

/// Constructor table for the HTTP client facade.
pub fn factory() -> BackendFactory<dyn HttpClient, RequestOption> {
    let mut factory = BackendFactory::<dyn HttpClient, RequestOption>::new("request");
    factory.register(ReqwestClient::DISCRIMINATOR, |_, option: &RequestOption| {
        Ok(std::sync::Arc::new(ReqwestClient::new(option)?) as std::sync::Arc<dyn HttpClient>)
    });
    factory
}
