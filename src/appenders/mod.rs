//! Appender implementations

pub mod http;
pub mod sentry;
pub mod splunk_http;

pub use http::{HttpOptions, HttpRequest, HttpTransport, SslOptions};
#[cfg(feature = "http")]
pub use http::UreqTransport;
pub use sentry::{CaptureAttributes, ErrorTracker, SentryAppender, CLIENT_LOGGER_NAME};
pub use splunk_http::{SplunkEnvelope, SplunkHttpAppender, SplunkHttpAppenderBuilder};

pub use crate::core::Appender;
