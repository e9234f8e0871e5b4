//! Validation subsystem.
//!
//! # Data Flow
//! ```text
//! struct implementing Validate
//!     → field.rs (declared fields: name, label, value, tags)
//!     → rules.rs (parse "required,min=16" and check each constraint)
//!     → translate.rs (failure → localized message using the label)
//!     → engine.rs (ValidationError: all failures, last message surfaced)
//! ```
//!
//! # Design Decisions
//! - Constraint tags are plain strings so option structs stay declarative
//! - A field stops at its first failing constraint
//! - Messages never contain structural field names, only display labels

pub mod engine;
pub mod field;
pub mod rules;
pub mod translate;

pub use engine::{ValidationError, ValidationFailure, Validator, ValidatorOption};
pub use field::{Field, FieldValue, Validate};
pub use translate::Locale;
