//! Application configuration schema.
//!
//! One section per facade plus the ambient settings. Every section has
//! defaults, so a missing file section means the defaults apply.

use serde::{Deserialize, Serialize};

use crate::cache::CacheOption;
use crate::config::binding::ConfigOption;
use crate::http::instrument::{InstrumentMode, DEFAULT_CAPTURE_LIMIT, DEFAULT_TRACE_LABEL};
use crate::http::server::ServerOption;
use crate::logger::LoggerOption;
use crate::observability::logging::LogFormat;
use crate::request::RequestOption;
use crate::validate::{Field, Validate, ValidatorOption};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BoxConfig {
    /// Backend discriminator per facade.
    pub backends: BackendsConfig,

    pub validation: ValidatorOption,

    pub logger: LoggerOption,

    pub cache: CacheOption,

    pub request: RequestOption,

    pub server: ServerOption,

    pub instrument: InstrumentConfig,

    /// Externally bound document; absent means no binding.
    pub binding: Option<ConfigOption>,

    pub observability: ObservabilityConfig,
}

impl Default for BoxConfig {
    fn default() -> Self {
        Self {
            backends: BackendsConfig::default(),
            validation: ValidatorOption::default(),
            logger: LoggerOption {
                application: env!("CARGO_PKG_NAME").to_string(),
                env: "dev".to_string(),
                label: "app".to_string(),
                ..Default::default()
            },
            cache: CacheOption::default(),
            request: RequestOption::default(),
            server: ServerOption::default(),
            instrument: InstrumentConfig::default(),
            binding: None,
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Which backend each facade constructs. Unknown names fall back to the
/// facade default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendsConfig {
    pub validation: String,
    pub logger: String,
    pub cache: String,
    pub request: String,
    pub server: String,
    pub binding: String,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            validation: "validator".to_string(),
            logger: "tracing".to_string(),
            cache: "memory".to_string(),
            request: "reqwest".to_string(),
            server: "axum".to_string(),
            binding: "file".to_string(),
        }
    }
}

impl Validate for BackendsConfig {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("validation", "validation backend", &self.validation, "required"),
            Field::new("logger", "logger backend", &self.logger, "required"),
            Field::new("cache", "cache backend", &self.cache, "required"),
            Field::new("request", "request backend", &self.request, "required"),
            Field::new("server", "server backend", &self.server, "required"),
            Field::new("binding", "binding backend", &self.binding, "required"),
        ]
    }
}

/// Request instrumentation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Display name of the trace header in validation messages.
    pub trace_label: String,

    /// Mode for routes that do not pick one.
    pub mode: InstrumentMode,

    /// Bytes of each request/response body kept for the record.
    pub capture_limit_bytes: usize,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            trace_label: DEFAULT_TRACE_LABEL.to_string(),
            mode: InstrumentMode::Normal,
            capture_limit_bytes: DEFAULT_CAPTURE_LIMIT,
        }
    }
}

impl Validate for InstrumentConfig {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("trace_label", "trace label", &self.trace_label, "required,max=64"),
            Field::new("capture_limit_bytes", "capture limit", self.capture_limit_bytes, "gte=1"),
        ]
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

impl Validate for ObservabilityConfig {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("log_level", "log level", &self.log_level, "required,oneof=trace debug info warn error"),
            Field::new("log_format", "log format", self.log_format.as_str(), "oneof=json console"),
        ]
    }
}
