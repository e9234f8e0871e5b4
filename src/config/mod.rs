//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! Application config (TOML):
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (every section through the validation engine)
//!     → BoxConfig (validated, immutable)
//!
//! Bound config documents (binding.rs):
//!     <root>/<application>.<env>.<format>
//!     → typed value behind ArcSwap
//!     → watcher.rs detects change → reload → atomic swap
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A failed reload keeps the previous value

pub mod binding;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use binding::{ConfigBinding, ConfigFormat, ConfigOption};
pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{BackendsConfig, BoxConfig, InstrumentConfig, ObservabilityConfig};
pub use validation::{validate_config, SectionError};
