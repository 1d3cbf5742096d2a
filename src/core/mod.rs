//! Core appender types and traits

pub mod appender;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod log_context;
pub mod log_event;
pub mod log_level;
pub mod metrics;

pub use appender::{Appender, AppenderBase};
pub use config::{defaults, set_default_level, set_defaults, AppenderConfig, LoggerDefaults};
pub use dispatcher::{
    dispatch, stderr_error_handler, try_dispatch, DispatchOutcome, Dispatcher, ErrorHandler,
    InternalLogger,
};
pub use error::{AppenderError, Result};
pub use filter::{Filter, Predicate, PredicateError};
pub use formatter::{AppenderContext, Formatter, Payload, RawFormatter};
pub use log_context::{FieldValue, LogContext};
pub use log_event::{ExceptionInfo, LogEvent};
pub use log_level::LogLevel;
pub use metrics::DispatchMetrics;
