use crate::formatter::TemplateFormatter;
use crate::record::{Caller, Level, LogEvent};
use chrono::Utc;
use std::collections::BTreeMap;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{DefaultFields, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber::fmt` layer that writes every event through the
/// given [`TemplateFormatter`].
pub fn template_layer<S>(formatter: TemplateFormatter) -> tracing_subscriber::fmt::Layer<S, DefaultFields, TemplateFormatter>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer().event_format(formatter)
}

impl<S, N> FormatEvent<S, N> for TemplateFormatter
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let record = log_event_from(event);
        writer.write_str(&self.render(&record))
    }
}

/// Capture a `tracing` event as a [`LogEvent`], stamped with the current time.
///
/// `tracing` does not know function names, so the caller's function is the
/// event's module path (or its target when there is none). Events without
/// a line number have no caller.
pub fn log_event_from(event: &Event<'_>) -> LogEvent {
    let mut fields = BTreeMap::new();
    let mut message: Option<String> = None;

    let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
    event.record(&mut visitor);

    let meta = event.metadata();
    let caller = meta.line().map(|line| Caller {
        function: meta.module_path().unwrap_or_else(|| meta.target()).to_string(),
        line,
    });

    LogEvent {
        timestamp: Utc::now(),
        level: Level::from(*meta.level()),
        message: message.unwrap_or_default(),
        caller,
        fields,
    }
}

/// Collects event fields into a JSON map, pulling out `message`.
///
/// A `message` recorded as any type ends up as the event message, in its
/// text form.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> FieldVisitor<'a> {
    fn insert(&mut self, field: &Field, value: serde_json::Value) {
        if field.name() == "message" {
            *self.message = Some(match value {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, serde_json::Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, serde_json::Value::from(value));
    }

    // Kept as a number so the formatter skips it.
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, serde_json::Value::String(format!("{:?}", value)));
    }
}
