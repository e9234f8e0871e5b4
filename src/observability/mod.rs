//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (tracing subscriber, JSON or console)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! The logger facade writes request records through `tracing`,
//! so facade records and internal diagnostics share one output.
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Trace id is a field on every request record
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
