//! Outcome code registry.
//!
//! Maps every [`Code`] to a severity and a default label. The built-in table
//! is populated once and shared; applications that need extra codes build
//! their own registry with [`CodeRegistry::builder`] before handing it out.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Numeric outcome of a request or operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(pub u32);

impl Code {
    pub const SUCCESS: Code = Code(10000);
    pub const CHECK: Code = Code(10001);
    pub const LIMIT_ERROR: Code = Code(10002);
    pub const TIMEOUT: Code = Code(10003);
    pub const SUPPLEMENT_WARN: Code = Code(10004);
    pub const STATUS_ERROR: Code = Code(10005);
    pub const CODEC_ERROR: Code = Code(10006);
    pub const RUNTIME_PARAM_ERROR: Code = Code(10007);
    /// Input failed parameter validation.
    pub const PARAM_INVALID: Code = Code(10008);
    pub const DATA_INVALID: Code = Code(10009);
    pub const RUNTIME_WARN: Code = Code(10010);
    pub const RUNTIME_ERROR_WARN: Code = Code(10011);
    pub const CALL_TIMEOUT: Code = Code(20001);
    pub const CALL_ERROR: Code = Code(20002);
    /// A component stopped working and cannot recover.
    pub const INTERRUPT: Code = Code(30001);

    /// Severity of this code in the built-in table.
    pub fn severity(self) -> Severity {
        CodeRegistry::builtin().lookup(self).severity
    }
}

impl Default for Code {
    fn default() -> Self {
        Code::SUCCESS
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Code {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

/// Log severity attached to an outcome.
///
/// The ordering is only used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntry {
    pub code: Code,
    pub severity: Severity,
    pub label: String,
}

const BUILTIN: &[(Code, Severity, &str)] = &[
    (Code::SUCCESS, Severity::Info, "operation succeeded"),
    (Code::CHECK, Severity::Warn, "please check"),
    (Code::LIMIT_ERROR, Severity::Error, "limit exceeded"),
    (Code::TIMEOUT, Severity::Error, "timed out"),
    (Code::SUPPLEMENT_WARN, Severity::Warn, "supplementary data"),
    (Code::STATUS_ERROR, Severity::Error, "unexpected status code"),
    (Code::CODEC_ERROR, Severity::Error, "encoding or decoding failed"),
    (Code::RUNTIME_PARAM_ERROR, Severity::Error, "runtime parameter error"),
    (Code::PARAM_INVALID, Severity::Error, "parameter failed validation"),
    (Code::DATA_INVALID, Severity::Error, "result data failed validation"),
    (Code::RUNTIME_WARN, Severity::Warn, "runtime exception"),
    (Code::RUNTIME_ERROR_WARN, Severity::Warn, "runtime error"),
    (Code::CALL_TIMEOUT, Severity::Error, "call timed out"),
    (Code::CALL_ERROR, Severity::Error, "call failed"),
    (Code::INTERRUPT, Severity::Fatal, "component interrupted"),
];

static BUILTIN_REGISTRY: Lazy<CodeRegistry> = Lazy::new(|| CodeRegistry::builder().build());

/// Read-only map from outcome code to severity and label.
#[derive(Debug, Clone)]
pub struct CodeRegistry {
    entries: HashMap<Code, CodeEntry>,
    default: CodeEntry,
}

impl CodeRegistry {
    /// The process-wide built-in table.
    pub fn builtin() -> &'static CodeRegistry {
        &BUILTIN_REGISTRY
    }

    /// Start from the built-in table.
    pub fn builder() -> CodeRegistryBuilder {
        let mut builder = CodeRegistryBuilder {
            entries: HashMap::new(),
            default: Code::SUCCESS,
        };
        for (code, severity, label) in BUILTIN {
            builder = builder.entry(*code, *severity, *label);
        }
        builder
    }

    /// Resolve a code. Unknown codes yield the default entry.
    pub fn lookup(&self, code: Code) -> &CodeEntry {
        self.entries.get(&code).unwrap_or(&self.default)
    }

    pub fn default_entry(&self) -> &CodeEntry {
        &self.default
    }

    pub fn contains(&self, code: Code) -> bool {
        self.entries.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CodeRegistry {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

/// Collects entries before the registry is frozen.
#[derive(Debug)]
pub struct CodeRegistryBuilder {
    entries: HashMap<Code, CodeEntry>,
    default: Code,
}

impl CodeRegistryBuilder {
    /// Register or replace a code.
    pub fn entry(mut self, code: Code, severity: Severity, label: impl Into<String>) -> Self {
        self.entries.insert(
            code,
            CodeEntry {
                code,
                severity,
                label: label.into(),
            },
        );
        self
    }

    /// Choose the entry returned for unknown codes.
    ///
    /// Falls back to SUCCESS at build time if the code was never registered.
    pub fn default_code(mut self, code: Code) -> Self {
        self.default = code;
        self
    }

    pub fn build(self) -> CodeRegistry {
        let default = self
            .entries
            .get(&self.default)
            .or_else(|| self.entries.get(&Code::SUCCESS))
            .cloned()
            .unwrap_or(CodeEntry {
                code: Code::SUCCESS,
                severity: Severity::Info,
                label: "operation succeeded".to_string(),
            });
        CodeRegistry {
            entries: self.entries,
            default,
        }
    }
}
