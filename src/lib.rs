//! Pluggable service facades around a request instrumentation pipeline.
//!
//! Each facade (validation, logger, cache, config binding, HTTP client,
//! HTTP server) is an interface plus a table of named backends, installed
//! once per application through a [`factory::BackendSlot`]. Every request
//! carries a [`context::TraceContext`] from the `X-REQUEST-ID` header through
//! handlers, outbound calls and the final structured log record.

pub mod cache;
pub mod config;
pub mod context;
pub mod factory;
pub mod http;
pub mod lifecycle;
pub mod logger;
pub mod observability;
pub mod outcome;
pub mod request;
pub mod validate;

pub use config::BoxConfig;
pub use context::TraceContext;
pub use http::{Envelope, HttpServer};
pub use lifecycle::{Facades, Shutdown};
pub use outcome::{BoxError, BoxResult, Code};
