//! Logger selection for CLI surfaces.

use idconsole_adapters::{JsonLogger, StderrLogSink, TracingLogger};
use idconsole_config::ConfigLogLevel;
use idconsole_ports::{LogFields, LogLevel, LoggerPort};
use serde_json::Value;
use std::sync::Arc;

/// How port events are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line on stderr.
    #[default]
    Json,
    /// Forward to the installed `tracing` subscriber.
    Tracing,
}

/// Map the configured level onto the port level.
#[must_use]
pub const fn port_log_level(level: ConfigLogLevel) -> LogLevel {
    match level {
        ConfigLogLevel::Debug => LogLevel::Debug,
        ConfigLogLevel::Info => LogLevel::Info,
        ConfigLogLevel::Warn => LogLevel::Warn,
        ConfigLogLevel::Error => LogLevel::Error,
    }
}

/// Build the logger used by the loader and the profile store.
pub fn build_logger(format: LogFormat, level: ConfigLogLevel) -> Arc<dyn LoggerPort> {
    match format {
        LogFormat::Json => {
            let base: LogFields = [("component".into(), Value::from("idconsole"))]
                .into_iter()
                .collect();
            Arc::new(
                JsonLogger::new(Arc::new(StderrLogSink))
                    .with_min_level(port_log_level(level))
                    .with_base_fields(base),
            )
        },
        LogFormat::Tracing => Arc::new(TracingLogger),
    }
}
