//! Declarative appender settings
//!
//! Lets appenders be described in JSON (or any serde format) instead of
//! code. Only the documented keys are accepted; anything else is a
//! configuration error.
//!
//! ```json
//! { "splunk_http": { "url": "https://splunk:8088", "token": "ABC123", "index": "main" } }
//! ```

use crate::appenders::{ErrorTracker, HttpTransport, SentryAppender, SplunkHttpAppender, SslOptions};
use crate::core::{Appender, AppenderConfig, AppenderError, Filter, LogLevel, RawFormatter, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Formatters selectable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatterKind {
    Raw,
}

/// Keys accepted by the `sentry` appender
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SentrySettings {
    pub level: Option<LogLevel>,
    pub formatter: Option<FormatterKind>,
    /// Regular expression matched against the logger name
    pub filter: Option<String>,
    pub application: Option<String>,
    pub host: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplunkHttpSettings {
    pub url: Option<String>,
    pub token: Option<String>,
    pub source_type: Option<String>,
    pub index: Option<String>,
    #[serde(default = "default_compress")]
    pub compress: bool,
    #[serde(default)]
    pub ssl: SslOptions,
    /// Seconds
    #[serde(default = "default_open_timeout")]
    pub open_timeout: f64,
    /// Seconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout: f64,
    /// Seconds
    #[serde(default = "default_continue_timeout")]
    pub continue_timeout: f64,
    pub level: Option<LogLevel>,
    pub formatter: Option<FormatterKind>,
    pub filter: Option<String>,
    pub application: Option<String>,
    pub host: Option<String>,
}

fn default_compress() -> bool {
    true
}

fn default_open_timeout() -> f64 {
    2.0
}

fn default_read_timeout() -> f64 {
    1.0
}

fn default_continue_timeout() -> f64 {
    1.0
}

/// One appender, keyed by its kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppenderSettings {
    Sentry(SentrySettings),
    SplunkHttp(SplunkHttpSettings),
}

/// External clients appenders may need at construction
#[derive(Clone, Default)]
pub struct Collaborators {
    pub error_tracker: Option<Arc<dyn ErrorTracker>>,
    /// Overrides the built-in HTTP transport
    pub http_transport: Option<Arc<dyn HttpTransport>>,
}

impl AppenderSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AppenderError::config("settings", e.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| AppenderError::config("settings", e.to_string()))
    }

    pub fn build(self, collaborators: &Collaborators) -> Result<Arc<dyn Appender>> {
        match self {
            AppenderSettings::Sentry(settings) => {
                let client = collaborators.error_tracker.clone().ok_or_else(|| {
                    AppenderError::config(
                        "SentryAppender",
                        "an error-tracking client is required for the sentry appender",
                    )
                })?;
                let config = base_config(
                    settings.level,
                    settings.formatter,
                    settings.filter,
                    settings.application,
                    settings.host,
                )?;
                Ok(Arc::new(SentryAppender::new(client, config)))
            }
            AppenderSettings::SplunkHttp(settings) => {
                let url = settings.url.ok_or_else(|| {
                    AppenderError::config("SplunkHttpAppender", "url is required")
                })?;
                let token = settings.token.ok_or_else(|| {
                    AppenderError::config("SplunkHttpAppender", "token is required")
                })?;
                let config = base_config(
                    settings.level,
                    settings.formatter,
                    settings.filter,
                    settings.application,
                    settings.host,
                )?;

                let mut builder = SplunkHttpAppender::builder(url, token)
                    .compress(settings.compress)
                    .ssl(settings.ssl)
                    .open_timeout(seconds("open_timeout", settings.open_timeout)?)
                    .read_timeout(seconds("read_timeout", settings.read_timeout)?)
                    .continue_timeout(seconds("continue_timeout", settings.continue_timeout)?)
                    .config(config);
                if let Some(source_type) = settings.source_type {
                    builder = builder.source_type(source_type);
                }
                if let Some(index) = settings.index {
                    builder = builder.index(index);
                }
                if let Some(ref transport) = collaborators.http_transport {
                    builder = builder.transport(Arc::clone(transport));
                }
                Ok(Arc::new(builder.build()?))
            }
        }
    }
}

fn base_config(
    level: Option<LogLevel>,
    formatter: Option<FormatterKind>,
    filter: Option<String>,
    application: Option<String>,
    host: Option<String>,
) -> Result<AppenderConfig> {
    let mut config = AppenderConfig::new();
    config.level = level;
    config.application = application;
    config.host = host;
    if let Some(FormatterKind::Raw) = formatter {
        config = config.formatter(RawFormatter);
    }
    if let Some(pattern) = filter {
        config = config.filter(Filter::pattern(&pattern)?);
    }
    Ok(config)
}

fn seconds(key: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        AppenderError::config(
            "settings",
            format!("{} must be a non-negative number of seconds, got {}", key, value),
        )
    })
}
