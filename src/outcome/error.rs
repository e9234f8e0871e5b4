//! Typed facade error.

use std::sync::Arc;
use thiserror::Error;

use crate::outcome::registry::{Code, CodeRegistry, Severity};

type Cause = Arc<dyn std::error::Error + Send + Sync>;

/// Error returned by every facade: an outcome code, its severity and a
/// human-readable label.
#[derive(Debug, Clone, Error)]
#[error("{label}")]
pub struct BoxError {
    pub code: Code,
    pub severity: Severity,
    pub label: String,
    #[source]
    cause: Option<Cause>,
}

/// Result type for facade operations.
pub type BoxResult<T> = Result<T, BoxError>;

impl BoxError {
    /// Build an error for `code`. An empty label takes the registry label.
    pub fn new(code: Code, label: impl Into<String>) -> Self {
        let entry = CodeRegistry::builtin().lookup(code);
        let mut label = label.into();
        if label.is_empty() {
            label = entry.label.clone();
        }
        Self {
            code,
            severity: entry.severity,
            label,
            cause: None,
        }
    }

    /// Error carrying only the registry label for `code`.
    pub fn from_code(code: Code) -> Self {
        Self::new(code, String::new())
    }

    /// Attach the underlying cause.
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn param_invalid(label: impl Into<String>) -> Self {
        Self::new(Code::PARAM_INVALID, label)
    }

    pub fn is_param_invalid(&self) -> bool {
        self.code == Code::PARAM_INVALID
    }
}
