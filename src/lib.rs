//! # Semantic Appenders
//!
//! The appender layer of a structured logging framework. Each appender
//! decides, per event, whether to forward it and in what shape.
//!
//! ## Features
//!
//! - **Gating**: per-appender level plus a name pattern or predicate filter
//! - **Pluggable formatting**: any [`Formatter`], [`RawFormatter`] by default
//! - **Sentry**: exception and message capture through an [`ErrorTracker`]
//! - **Splunk**: HTTP Event Collector envelopes over a compressed HTTP transport
//! - **Isolation**: a failing appender never breaks logging for the others

pub mod appenders;
pub mod core;
pub mod settings;

pub mod prelude {
    pub use crate::appenders::{
        CaptureAttributes, ErrorTracker, HttpTransport, SentryAppender, SplunkEnvelope,
        SplunkHttpAppender,
    };
    pub use crate::core::{
        dispatch, Appender, AppenderBase, AppenderConfig, AppenderContext, AppenderError,
        DispatchMetrics, Dispatcher, ErrorHandler, ExceptionInfo, FieldValue, Filter, Formatter,
        InternalLogger, LogContext, LogEvent, LogLevel, Payload, RawFormatter, Result,
    };
    pub use crate::settings::{AppenderSettings, Collaborators};
}

pub use appenders::{SentryAppender, SplunkHttpAppender};
pub use core::{
    dispatch, Appender, AppenderBase, AppenderConfig, AppenderContext, AppenderError,
    DispatchMetrics, Dispatcher, ErrorHandler, ExceptionInfo, FieldValue, Filter, Formatter,
    InternalLogger, LogContext, LogEvent, LogLevel, Payload, RawFormatter, Result,
};
