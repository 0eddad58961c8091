//! JSON-lines event format for the log file.
//!
//! Each line is one object: `timestamp`, `level`, `target` and `fields`.
//! The `context` field carries a serialized JSON object from the core's
//! event log; it is parsed back so the line holds nested key-value pairs
//! instead of an escaped string.

use serde_json::{Map, Value, json};
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Field whose value is re-parsed as JSON.
const CONTEXT_FIELD: &str = "context";

/// Writes every event as a single JSON object per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLines;

impl<S, N> FormatEvent<S, N> for JsonLines
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = JsonFields::default();
        event.record(&mut fields);

        let mut timestamp = String::new();
        SystemTime.format_time(&mut Writer::new(&mut timestamp))?;

        let metadata = event.metadata();
        let line = json!({
            "timestamp": timestamp,
            "level": metadata.level().to_string(),
            "target": metadata.target(),
            "fields": Value::Object(fields.0),
        });
        writeln!(writer, "{line}")
    }
}

#[derive(Default)]
struct JsonFields(Map<String, Value>);

impl JsonFields {
    fn insert(&mut self, field: &Field, value: Value) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl Visit for JsonFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        let value = if field.name() == CONTEXT_FIELD {
            parse_context(value)
        } else {
            Value::String(value.to_string())
        };
        self.insert(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, json!(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, json!(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, json!(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        // Display-formatted fields (`%value`) and the message arrive here.
        let text = format!("{value:?}");
        if field.name() == CONTEXT_FIELD {
            self.insert(field, parse_context(&text));
        } else {
            self.insert(field, Value::String(text));
        }
    }
}

/// Parse a context string; anything that is not a JSON object stays a string.
fn parse_context(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => value,
        _ => Value::String(text.to_string()),
    }
}
