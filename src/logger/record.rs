//! Structured log record types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::outcome::{Code, Severity};

/// Monitoring fields carried by every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Monitor {
    /// Marks the closing record of a unit of work (one per request).
    #[serde(rename = "final")]
    pub is_final: bool,
    /// Data-level severity of the outcome.
    pub level: Severity,
    pub code: Code,
    /// Milliseconds spent processing.
    pub process_duration: i64,
    /// Milliseconds the work waited before processing started.
    pub process_delay: i64,
}

/// Monitor data plus input and output payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attr {
    pub monitor: Monitor,
    pub inp: Map<String, Value>,
    pub oup: Map<String, Value>,
}

/// What a caller hands to the logger.
#[derive(Debug, Clone, Default)]
pub struct Message {
    pub text: String,
    /// Overrides the logger label when non-empty.
    pub label: String,
    pub remark: String,
    pub traceback: String,
    pub attr: Attr,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    pub fn traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = traceback.into();
        self
    }

    pub fn attr(mut self, attr: Attr) -> Self {
        self.attr = attr;
        self
    }
}

/// A fully resolved record, built once per emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub trace: String,
    pub env: String,
    pub application: String,
    pub label: String,
    pub text: String,
    pub remark: String,
    pub traceback: String,
    pub attr: Attr,
}

impl LogRecord {
    pub fn code(&self) -> Code {
        self.attr.monitor.code
    }

    pub fn level(&self) -> Severity {
        self.attr.monitor.level
    }
}
