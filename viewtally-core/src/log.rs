//! Structured event log injected into every pipeline component.
//!
//! Components hold an `Arc<dyn EventLog>` and report checkpoints through it
//! with a message and a JSON object of context fields. [`TracingLog`] forwards
//! records to `tracing`, where the CLI's subscriber writes them as JSON lines.
//! [`RecordingLog`] keeps records in memory so tests can inspect them.
//!
//! Logging never fails from the caller's point of view.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

/// Sink for structured pipeline events.
pub trait EventLog: Send + Sync {
    /// Record a message with its context object.
    fn record(&self, severity: Severity, message: &str, context: Value);

    fn debug(&self, message: &str, context: Value) {
        self.record(Severity::Debug, message, context);
    }

    fn info(&self, message: &str, context: Value) {
        self.record(Severity::Info, message, context);
    }

    fn warning(&self, message: &str, context: Value) {
        self.record(Severity::Warning, message, context);
    }

    fn error(&self, message: &str, context: Value) {
        self.record(Severity::Error, message, context);
    }

    fn critical(&self, message: &str, context: Value) {
        self.record(Severity::Critical, message, context);
    }
}

/// Shared handle type used by components.
pub type SharedLog = Arc<dyn EventLog>;

// ---------------------------------------------------------------------------
// TracingLog
// ---------------------------------------------------------------------------

/// Forwards records to `tracing`, tagged with the emitting component.
///
/// `tracing` has no critical level, so critical records are emitted as
/// `ERROR` events carrying `severity = "critical"`.
#[derive(Debug, Clone)]
pub struct TracingLog {
    component: &'static str,
}

impl TracingLog {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn shared(component: &'static str) -> SharedLog {
        Arc::new(Self::new(component))
    }
}

impl EventLog for TracingLog {
    fn record(&self, severity: Severity, message: &str, context: Value) {
        let component = self.component;
        let context = context_string(&context);
        let level = severity;
        let severity = level.as_str();
        match level {
            Severity::Debug => {
                tracing::debug!(component, severity, context = %context, "{message}")
            }
            Severity::Info => {
                tracing::info!(component, severity, context = %context, "{message}")
            }
            Severity::Warning => {
                tracing::warn!(component, severity, context = %context, "{message}")
            }
            Severity::Error | Severity::Critical => {
                tracing::error!(component, severity, context = %context, "{message}")
            }
        }
    }
}

fn context_string(context: &Value) -> String {
    match context {
        Value::Null => "{}".to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// RecordingLog
// ---------------------------------------------------------------------------

/// A single captured record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub severity: Severity,
    pub message: String,
    pub context: Value,
}

/// In-memory log that keeps every record, for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingLog {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Messages recorded at exactly `severity`, in emission order.
    pub fn messages_at(&self, severity: Severity) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|r| r.severity == severity)
            .map(|r| r.message)
            .collect()
    }

    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.messages_at(severity)
            .iter()
            .any(|m| m.contains(needle))
    }
}

impl EventLog for RecordingLog {
    fn record(&self, severity: Severity, message: &str, context: Value) {
        // A poisoned lock drops the record rather than propagating.
        if let Ok(mut records) = self.records.lock() {
            records.push(LogRecord {
                severity,
                message: message.to_string(),
                context,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recording_log_keeps_order_and_context() {
        let log = RecordingLog::new();
        log.info("first", json!({"step": 1}));
        log.critical("second", json!({"step": 2}));

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "first");
        assert_eq!(records[1].severity, Severity::Critical);
        assert_eq!(records[1].context["step"], 2);
    }

    #[test]
    fn test_messages_at_filters_by_severity() {
        let log = RecordingLog::new();
        log.info("a", Value::Null);
        log.error("b", Value::Null);
        log.error("c", Value::Null);
        assert_eq!(log.messages_at(Severity::Error), vec!["b", "c"]);
        assert!(log.contains(Severity::Info, "a"));
        assert!(!log.contains(Severity::Warning, "a"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Error);
        assert!(Severity::Debug < Severity::Info);
        assert_eq!(
            serde_json::to_string(&Severity::Warning).unwrap(),
            "\"warning\""
        );
    }

    #[test]
    fn test_tracing_log_without_subscriber_is_silent() {
        let log = TracingLog::new("test");
        log.critical("nothing listens", json!({"k": "v"}));
    }

    #[test]
    fn test_context_string_null_is_empty_object() {
        assert_eq!(context_string(&Value::Null), "{}");
        assert_eq!(context_string(&json!({"a": 1})), "{\"a\":1}");
    }
}
