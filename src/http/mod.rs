//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (TraceLayer, CORS, panic recovery, timeout)
//!     → instrument.rs (per route: trace header, capture, final record)
//!     → handler (TraceContext extractor, returns an Envelope)
//!     → capture.rs (tee body to the client and the record)
//! ```

pub mod capture;
pub mod envelope;
pub mod instrument;
pub mod server;

pub use capture::{CaptureBody, Captured};
pub use envelope::Envelope;
pub use instrument::{instrument, InstrumentMode, Instrumentation, DEFAULT_CAPTURE_LIMIT, DEFAULT_TRACE_LABEL};
pub use server::{HttpServer, RouteMethod, RoutePayload, ServerOption};

/// Trace id header, inbound and outbound.
pub const X_REQUEST_ID: &str = "x-request-id";
