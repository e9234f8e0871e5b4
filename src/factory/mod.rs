//! Pluggable backend initialization.
//!
//! # Data Flow
//! ```text
//! facade option struct (Validate)
//!     → slot.rs: already initialized? return the published handle
//!     → validate::Validator (reject bad options, slot untouched)
//!     → one-time guard (concurrent callers block here)
//!     → registry.rs: discriminator → constructor (unknown → default)
//!     → Arc<T> published on the slot for the process lifetime
//! ```
//!
//! # Design Decisions
//! - One generic implementation shared by every facade
//! - Slots are owned by the application and passed by reference
//! - A failed construction is sticky: no retry, no re-init
//! - Unknown discriminators degrade to the default backend

pub mod registry;
pub mod slot;

pub use registry::{BackendFactory, Constructor};
pub use slot::BackendSlot;
