//! Formatter contract and the raw formatter
//!
//! A formatter turns a [`LogEvent`] into a generic key/value [`Payload`].
//! Appenders depend only on this capability, so any sink can be paired with
//! any formatter.

use super::{error::Result, log_event::LogEvent};
use chrono::SecondsFormat;
use serde_json::{Map, Value};

/// Generic structured representation of one event
pub type Payload = Map<String, Value>;

/// Appender-level values a formatter may embed in its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppenderContext {
    pub application: String,
    pub host: String,
}

impl AppenderContext {
    pub fn new(application: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            host: host.into(),
        }
    }
}

pub trait Formatter: Send + Sync {
    fn call(&self, event: &LogEvent, context: &AppenderContext) -> Result<Payload>;
}

/// Any `Fn(&LogEvent, &AppenderContext) -> Result<Payload>` can format events
impl<F> Formatter for F
where
    F: Fn(&LogEvent, &AppenderContext) -> Result<Payload> + Send + Sync,
{
    fn call(&self, event: &LogEvent, context: &AppenderContext) -> Result<Payload> {
        self(event, context)
    }
}

/// Mirrors the event as a flat map plus `application` and `host`
///
/// Keys: `host`, `application`, `name`, `message`, `time`, `level`,
/// `level_index`, and when present `exception`, `backtrace`, `payload`
/// (the event metadata).
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFormatter;

impl RawFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Formatter for RawFormatter {
    fn call(&self, event: &LogEvent, context: &AppenderContext) -> Result<Payload> {
        let mut map = Map::new();

        map.insert("host".to_string(), Value::String(context.host.clone()));
        map.insert(
            "application".to_string(),
            Value::String(context.application.clone()),
        );
        map.insert("name".to_string(), Value::String(event.name.clone()));
        map.insert("message".to_string(), Value::String(event.message.clone()));
        map.insert(
            "time".to_string(),
            Value::String(event.time.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        map.insert(
            "level".to_string(),
            Value::String(event.level.as_str().to_string()),
        );
        map.insert(
            "level_index".to_string(),
            Value::Number(event.level.index().into()),
        );

        if let Some(ref exception) = event.exception {
            map.insert("exception".to_string(), serde_json::to_value(exception)?);
        }

        if let Some(ref backtrace) = event.backtrace {
            map.insert(
                "backtrace".to_string(),
                Value::Array(backtrace.iter().cloned().map(Value::String).collect()),
            );
        }

        if !event.metadata.is_empty() {
            map.insert(
                "payload".to_string(),
                Value::Object(event.metadata.to_json_map()),
            );
        }

        Ok(map)
    }
}
