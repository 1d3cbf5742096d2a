//! Splunk appender for the HTTP Event Collector (HEC)
//!
//! Each event is wrapped in a HEC envelope and posted as JSON with an
//! `Authorization: Splunk <token>` header. A configured formatter replaces
//! the envelope and produces the whole request body. Delivery, compression
//! and timeouts belong to the [`HttpTransport`].

use super::http::{HttpOptions, HttpRequest, HttpTransport, SslOptions};
use crate::core::{
    Appender, AppenderBase, AppenderConfig, AppenderError, Filter, Formatter, LogEvent, LogLevel,
    Payload, RawFormatter, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// HEC event envelope
///
/// `source_type` and `index` are omitted from the JSON when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplunkEnvelope {
    pub source: String,
    pub host: String,
    /// Seconds since the Unix epoch, UTC, with sub-second precision
    pub time: f64,
    pub event: Payload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
}

/// Posts events to a Splunk HTTP Event Collector
///
/// # Example
///
/// ```no_run
/// use semantic_appenders::appenders::SplunkHttpAppender;
/// use semantic_appenders::core::Dispatcher;
///
/// let appender = SplunkHttpAppender::builder(
///     "https://splunk.example.com:8088/services/collector/event",
///     "70CA900C-3D7E-42A4-9C79-7975D1C422A8",
/// )
/// .source_type("_json")
/// .index("main")
/// .build()
/// .expect("valid Splunk settings");
///
/// let dispatcher = Dispatcher::new().appender(appender);
/// ```
pub struct SplunkHttpAppender {
    base: AppenderBase,
    source_type: Option<String>,
    index: Option<String>,
    headers: BTreeMap<String, String>,
    options: HttpOptions,
    transport: Arc<dyn HttpTransport>,
    /// Replaces the envelope when set
    body_formatter: Option<Arc<dyn Formatter>>,
}

impl SplunkHttpAppender {
    pub fn builder(url: impl Into<String>, token: impl Into<String>) -> SplunkHttpAppenderBuilder {
        SplunkHttpAppenderBuilder::new(url, token)
    }

    pub fn source_type(&self) -> Option<&str> {
        self.source_type.as_deref()
    }

    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    /// Headers attached to every request
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn options(&self) -> &HttpOptions {
        &self.options
    }

    /// Build the HEC envelope for `event`
    ///
    /// The inner `event` is always the raw payload, whatever formatter is
    /// configured.
    pub fn envelope(&self, event: &LogEvent) -> Result<SplunkEnvelope> {
        let mut payload = RawFormatter.call(event, self.base.context())?;
        payload.remove("time");

        Ok(SplunkEnvelope {
            source: self.base.application().to_string(),
            host: self.base.host().to_string(),
            time: event.time.timestamp_micros() as f64 / 1_000_000.0,
            event: payload,
            source_type: self.source_type.clone(),
            index: self.index.clone(),
        })
    }

    /// JSON body the transport sends for `event`
    pub fn call(&self, event: &LogEvent) -> Result<String> {
        match self.body_formatter {
            Some(ref formatter) => Ok(serde_json::to_string(
                &formatter.call(event, self.base.context())?,
            )?),
            None => Ok(serde_json::to_string(&self.envelope(event)?)?),
        }
    }
}

impl Appender for SplunkHttpAppender {
    fn name(&self) -> &str {
        "splunk_http"
    }

    fn base(&self) -> &AppenderBase {
        &self.base
    }

    fn log(&self, event: &LogEvent) -> Result<bool> {
        if !self.should_log(event) {
            return Ok(false);
        }

        let request = HttpRequest {
            headers: self.headers.clone(),
            body: self.call(event)?,
        };
        self.transport.send(&request)?;
        Ok(true)
    }
}

impl fmt::Debug for SplunkHttpAppender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplunkHttpAppender")
            .field("base", &self.base)
            .field("url", &self.options.url)
            .field("source_type", &self.source_type)
            .field("index", &self.index)
            .field("custom_body", &self.body_formatter.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`SplunkHttpAppender`]
///
/// Level defaults to the process-wide default. Without a formatter the body
/// is the HEC envelope around the [`RawFormatter`] payload.
pub struct SplunkHttpAppenderBuilder {
    url: String,
    token: String,
    source_type: Option<String>,
    index: Option<String>,
    compress: bool,
    ssl: SslOptions,
    open_timeout: Duration,
    read_timeout: Duration,
    continue_timeout: Duration,
    config: AppenderConfig,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl SplunkHttpAppenderBuilder {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            source_type: None,
            index: None,
            compress: true,
            ssl: SslOptions::default(),
            open_timeout: HttpOptions::DEFAULT_OPEN_TIMEOUT,
            read_timeout: HttpOptions::DEFAULT_READ_TIMEOUT,
            continue_timeout: HttpOptions::DEFAULT_CONTINUE_TIMEOUT,
            config: AppenderConfig::new(),
            transport: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn ssl(mut self, ssl: SslOptions) -> Self {
        self.ssl = ssl;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn continue_timeout(mut self, timeout: Duration) -> Self {
        self.continue_timeout = timeout;
        self
    }

    /// Replace the whole shared appender configuration
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: AppenderConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config = self.config.level(level);
        self
    }

    /// Produce the entire request body with `formatter` instead of the envelope
    #[must_use = "builder methods return a new value"]
    pub fn formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.config = self.config.formatter(formatter);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.config = self.config.filter(filter);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn application(mut self, application: impl Into<String>) -> Self {
        self.config = self.config.application(application);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config = self.config.host(host);
        self
    }

    /// Use a custom transport instead of the built-in `ureq` one
    #[must_use = "builder methods return a new value"]
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(mut self) -> Result<SplunkHttpAppender> {
        if self.token.trim().is_empty() {
            return Err(AppenderError::config(
                "SplunkHttpAppender",
                "token is required",
            ));
        }

        let mut options = HttpOptions::new(self.url)?;
        options.compress = self.compress;
        options.ssl = self.ssl;
        options.open_timeout = self.open_timeout;
        options.read_timeout = self.read_timeout;
        options.continue_timeout = self.continue_timeout;

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&options)?,
        };

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Authorization".to_string(), format!("Splunk {}", self.token));

        let body_formatter = self.config.formatter.take();

        Ok(SplunkHttpAppender {
            base: self.config.resolve(None, Arc::new(RawFormatter)),
            source_type: self.source_type,
            index: self.index,
            headers,
            options,
            transport,
            body_formatter,
        })
    }
}

#[cfg(feature = "http")]
fn default_transport(options: &HttpOptions) -> Result<Arc<dyn HttpTransport>> {
    Ok(Arc::new(super::http::UreqTransport::new(options.clone())?))
}

#[cfg(not(feature = "http"))]
fn default_transport(_options: &HttpOptions) -> Result<Arc<dyn HttpTransport>> {
    Err(AppenderError::config(
        "SplunkHttpAppender",
        "no HTTP transport available; enable the `http` feature or supply one",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExceptionInfo, LogContext};
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl HttpTransport for RecordingTransport {
        fn send(&self, request: &HttpRequest) -> Result<()> {
            self.requests.lock().push(request.clone());
            Ok(())
        }
    }

    struct FailingTransport;

    impl HttpTransport for FailingTransport {
        fn send(&self, _request: &HttpRequest) -> Result<()> {
            Err(AppenderError::delivery("splunk_http", "503 Service Unavailable"))
        }
    }

    fn builder(transport: Arc<dyn HttpTransport>) -> SplunkHttpAppenderBuilder {
        SplunkHttpAppender::builder("https://splunk.example.com:8088", "ABC123")
            .application("billing")
            .host("web-01")
            .transport(transport)
    }

    fn new_year_event() -> LogEvent {
        LogEvent::new("Invoice", LogLevel::Info, "generated")
            .with_time(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_authorization_header() {
        let appender = builder(Arc::new(RecordingTransport::default()))
            .build()
            .unwrap();
        assert_eq!(appender.headers()["Authorization"], "Splunk ABC123");
        assert_eq!(appender.headers()["Content-Type"], "application/json");
    }

    #[test]
    fn test_missing_token_rejected() {
        let err = SplunkHttpAppender::builder("https://splunk.example.com", "  ")
            .transport(Arc::new(RecordingTransport::default()))
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_missing_url_rejected() {
        let err = SplunkHttpAppender::builder("", "ABC123")
            .transport(Arc::new(RecordingTransport::default()))
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_envelope_time_is_epoch_seconds() {
        let appender = builder(Arc::new(RecordingTransport::default()))
            .build()
            .unwrap();

        let envelope = appender.envelope(&new_year_event()).unwrap();

        assert_eq!(envelope.time, 1577836800.0);
        assert_eq!(envelope.source, "billing");
        assert_eq!(envelope.host, "web-01");
        assert!(!envelope.event.contains_key("time"));
        assert_eq!(envelope.event["message"], "generated");
    }

    #[test]
    fn test_envelope_time_keeps_sub_seconds() {
        let appender = builder(Arc::new(RecordingTransport::default()))
            .build()
            .unwrap();
        let time = Utc.timestamp_opt(1577836800, 250_000_000).unwrap();

        let envelope = appender
            .envelope(&new_year_event().with_time(time))
            .unwrap();
        assert_eq!(envelope.time, 1577836800.25);
    }

    #[test]
    fn test_optional_keys_absent_when_unset() {
        let appender = builder(Arc::new(RecordingTransport::default()))
            .build()
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&appender.call(&new_year_event()).unwrap()).unwrap();
        let object = json.as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["event", "host", "source", "time"]);
        assert!(object["event"].get("time").is_none());
    }

    #[test]
    fn test_optional_keys_present_when_set() {
        let appender = builder(Arc::new(RecordingTransport::default()))
            .source_type("_json")
            .index("main")
            .build()
            .unwrap();

        let body = appender.call(&new_year_event()).unwrap();
        let envelope: SplunkEnvelope = serde_json::from_str(&body).unwrap();

        assert_eq!(envelope.source_type.as_deref(), Some("_json"));
        assert_eq!(envelope.index.as_deref(), Some("main"));
        assert_eq!(envelope.time, 1577836800.0);
    }

    #[test]
    fn test_log_sends_body_and_headers() {
        let transport = Arc::new(RecordingTransport::default());
        let appender = builder(Arc::clone(&transport) as Arc<dyn HttpTransport>)
            .build()
            .unwrap();

        let event = new_year_event()
            .with_exception(ExceptionInfo::new("Timeout", "gateway timed out"))
            .with_metadata(LogContext::new().with_field("attempt", 3));
        assert!(appender.log(&event).unwrap());

        let requests = transport.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].headers["Authorization"], "Splunk ABC123");

        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["event"]["exception"]["name"], "Timeout");
        assert_eq!(body["event"]["payload"]["attempt"], 3);
    }

    #[test]
    fn test_log_below_level_sends_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let appender = builder(Arc::clone(&transport) as Arc<dyn HttpTransport>)
            .level(LogLevel::Error)
            .build()
            .unwrap();

        assert!(!appender.log(&new_year_event()).unwrap());
        assert!(transport.requests.lock().is_empty());
    }

    #[test]
    fn test_transport_errors_propagate() {
        let appender = builder(Arc::new(FailingTransport)).build().unwrap();
        let err = appender.log(&new_year_event()).unwrap_err();
        assert!(matches!(err, AppenderError::Delivery { .. }));
    }

    #[test]
    fn test_timeouts_keep_their_meaning() {
        let appender = builder(Arc::new(RecordingTransport::default()))
            .open_timeout(Duration::from_secs(5))
            .read_timeout(Duration::from_secs(7))
            .continue_timeout(Duration::from_secs(3))
            .compress(false)
            .build()
            .unwrap();

        let options = appender.options();
        assert_eq!(options.open_timeout, Duration::from_secs(5));
        assert_eq!(options.read_timeout, Duration::from_secs(7));
        assert_eq!(options.continue_timeout, Duration::from_secs(3));
        assert!(!options.compress);
    }

    #[test]
    fn test_custom_formatter_replaces_whole_body() {
        let transport = Arc::new(RecordingTransport::default());
        let formatter = |event: &LogEvent, _: &crate::core::AppenderContext| -> Result<Payload> {
            let mut body = Payload::new();
            body.insert("text".to_string(), serde_json::Value::String(event.message.clone()));
            body.insert("time".to_string(), serde_json::Value::from(1));
            Ok(body)
        };
        let appender = builder(Arc::clone(&transport) as Arc<dyn HttpTransport>)
            .formatter(formatter)
            .build()
            .unwrap();

        assert!(appender.log(&new_year_event()).unwrap());

        let requests = transport.requests.lock();
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body, serde_json::json!({"text": "generated", "time": 1}));
        assert_eq!(requests[0].headers["Authorization"], "Splunk ABC123");

        // The envelope keeps the raw payload regardless of the formatter
        let envelope = appender.envelope(&new_year_event()).unwrap();
        assert_eq!(envelope.event["name"], "Invoice");
        assert_eq!(envelope.event["message"], "generated");
        assert!(!envelope.event.contains_key("time"));
    }
}
