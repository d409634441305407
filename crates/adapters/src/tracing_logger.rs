//! Logger adapter forwarding events to `tracing`.

use crate::logger::redact_object;
use idconsole_ports::{LogEvent, LogLevel, LoggerPort};
use serde_json::Value;

/// Forwards port events to the installed `tracing` subscriber.
///
/// Fields are redacted and rendered as one JSON string attribute so the
/// subscriber's formatter (text or JSON) decides the final layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl LoggerPort for TracingLogger {
    fn log(&self, event: LogEvent) {
        let fields = event.fields.map(|fields| {
            let mut object: serde_json::Map<String, Value> = fields
                .into_iter()
                .map(|(key, value)| (key.into_string(), value))
                .collect();
            redact_object(&mut object);
            Value::Object(object).to_string()
        });
        let fields = fields.as_deref().unwrap_or("{}");
        let name = event.event.as_ref();
        let message = event.message.as_ref();

        match event.level {
            LogLevel::Debug => tracing::debug!(event = name, fields, "{message}"),
            LogLevel::Info => tracing::info!(event = name, fields, "{message}"),
            LogLevel::Warn => tracing::warn!(event = name, fields, "{message}"),
            LogLevel::Error => tracing::error!(event = name, fields, "{message}"),
        }
    }
}
