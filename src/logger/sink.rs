//! Log sinks: where resolved records go.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::logger::record::LogRecord;
use crate::outcome::Severity;

/// Destination for log records. Writing must never fail the caller.
pub trait LogSink: Send + Sync {
    fn write(&self, severity: Severity, record: &LogRecord);
}

/// Sink that forwards records to `tracing` under the `boxkit::record` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

macro_rules! emit_record {
    ($level:ident, $record:ident, $attr:ident $(, $extra:ident = $value:expr)?) => {
        tracing::$level!(
            target: "boxkit::record",
            trace = %$record.trace,
            env = %$record.env,
            application = %$record.application,
            label = %$record.label,
            remark = %$record.remark,
            traceback = %$record.traceback,
            attr = %$attr,
            $($extra = $value,)?
            "{}",
            $record.text
        )
    };
}

impl LogSink for TracingSink {
    fn write(&self, severity: Severity, record: &LogRecord) {
        let attr = serde_json::to_string(&record.attr).unwrap_or_default();
        match severity {
            Severity::Debug => emit_record!(debug, record, attr),
            Severity::Info => emit_record!(info, record, attr),
            Severity::Warn => emit_record!(warn, record, attr),
            Severity::Error => emit_record!(error, record, attr),
            // fatal never terminates the process
            Severity::Fatal => emit_record!(error, record, attr, fatal = true),
        }
    }
}

/// Keeps records in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(Severity, LogRecord)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Severity, LogRecord)> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // a writer that panicked mid-push leaves the vector intact
    fn lock(&self) -> MutexGuard<'_, Vec<(Severity, LogRecord)>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogSink for MemorySink {
    fn write(&self, severity: Severity, record: &LogRecord) {
        self.lock().push((severity, record.clone()));
    }
}
