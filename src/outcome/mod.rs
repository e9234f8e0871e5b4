//! Outcome classification subsystem.
//!
//! # Data Flow
//! ```text
//! handler / facade result
//!     → Code (numeric outcome)
//!     → registry.rs (code → severity + label)
//!     → logger (record level) / BoxError (typed failure)
//! ```
//!
//! # Design Decisions
//! - The registry is read-only once built; lookups never fail
//! - Unknown codes resolve to the default entry (SUCCESS)
//! - Codes are application outcomes, not process exit codes

pub mod error;
pub mod registry;

pub use error::{BoxError, BoxResult};
pub use registry::{Code, CodeEntry, CodeRegistry, CodeRegistryBuilder, Severity};
