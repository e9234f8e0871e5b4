//! Structured logger facade.
//!
//! # Data Flow
//! ```text
//! caller (TraceContext + Message)
//!     → Logger::build (defaults: code SUCCESS, level info, logger label)
//!     → LogRecord (trace, env, application, label, remark, traceback, attr)
//!     → sink.rs (tracing output, or memory for tests)
//! ```
//!
//! # Design Decisions
//! - The trace id always comes from an explicit `TraceContext`
//! - Sinks cannot fail the caller
//! - Fatal records are logged, never turned into a process exit

pub mod record;
pub mod sink;

pub use record::{Attr, LogRecord, Message, Monitor};
pub use sink::{LogSink, MemorySink, TracingSink};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::context::TraceContext;
use crate::factory::BackendFactory;
use crate::observability::logging::{self, LogFormat};
use crate::outcome::Severity;
use crate::validate::{Field, Validate};

/// Options of the logger facade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerOption {
    /// Application name, matching its remote configuration name.
    pub application: String,
    pub env: String,
    /// Default label for records that do not set one.
    pub label: String,
    pub encoder: LogFormat,
    /// Level used when the logger installs the global subscriber.
    pub level: String,
}

impl Validate for LoggerOption {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("application", "application name", &self.application, "required"),
            Field::new("env", "environment", &self.env, "required"),
            Field::new("label", "label", &self.label, "required"),
            Field::new("encoder", "output format", self.encoder.as_str(), "oneof=json console"),
            Field::new("level", "log level", &self.level, "omitempty,oneof=trace debug info warn error"),
        ]
    }
}

/// Leveled logging bound to an application identity.
pub struct Logger {
    sink: Arc<dyn LogSink>,
    env: String,
    application: String,
    label: String,
}

impl Logger {
    pub const DISCRIMINATOR: &'static str = "tracing";

    /// Logger writing to an explicit sink.
    pub fn with_sink(sink: Arc<dyn LogSink>, option: &LoggerOption) -> Self {
        Self {
            sink,
            env: option.env.clone(),
            application: option.application.clone(),
            label: option.label.clone(),
        }
    }

    /// Constructor table for the logger facade.
    ///
    /// The `tracing` backend installs the global subscriber with the
    /// option's encoder unless one is already installed.
    pub fn factory() -> BackendFactory<Logger, LoggerOption> {
        let mut factory = BackendFactory::new("logger");
        factory.register(Self::DISCRIMINATOR, |_, option: &LoggerOption| {
            let level = if option.level.is_empty() { "info" } else { option.level.as_str() };
            logging::init(level, option.encoder);
            Ok(Arc::new(Logger::with_sink(Arc::new(TracingSink), option)))
        });
        factory
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    /// Resolve a message into a record.
    pub fn build(&self, ctx: &TraceContext, message: Message) -> LogRecord {
        let label = if message.label.is_empty() {
            self.label.clone()
        } else {
            message.label
        };
        LogRecord {
            trace: ctx.trace().to_string(),
            env: self.env.clone(),
            application: self.application.clone(),
            label,
            text: message.text,
            remark: message.remark,
            traceback: message.traceback,
            attr: message.attr,
        }
    }

    pub fn log(&self, severity: Severity, ctx: &TraceContext, message: Message) {
        let record = self.build(ctx, message);
        self.sink.write(severity, &record);
    }

    pub fn debug(&self, ctx: &TraceContext, message: Message) {
        self.log(Severity::Debug, ctx, message);
    }

    pub fn info(&self, ctx: &TraceContext, message: Message) {
        self.log(Severity::Info, ctx, message);
    }

    pub fn warn(&self, ctx: &TraceContext, message: Message) {
        self.log(Severity::Warn, ctx, message);
    }

    pub fn error(&self, ctx: &TraceContext, message: Message) {
        self.log(Severity::Error, ctx, message);
    }

    pub fn fatal(&self, ctx: &TraceContext, message: Message) {
        self.log(Severity::Fatal, ctx, message);
    }
}
