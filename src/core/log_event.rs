//! Log event structure
//!
//! A `LogEvent` is produced upstream by the logging framework and handed to
//! every appender by shared reference. Appenders never mutate it.

use super::log_context::LogContext;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;

/// Exception attached to a log event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    /// Type name of the error, e.g. `std::io::Error`
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stack_trace: Vec<String>,
}

impl ExceptionInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack_trace: Vec::new(),
        }
    }

    /// Build from a Rust error, folding its `source()` chain into the message
    pub fn from_error<E: StdError + ?Sized>(name: impl Into<String>, err: &E) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::new(name, message)
    }

    pub fn with_stack_trace(mut self, frames: Vec<String>) -> Self {
        self.stack_trace = frames;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// Originating logger (usually a module or type name)
    pub name: String,
    pub level: LogLevel,
    pub message: String,
    pub time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtrace: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: LogContext,
}

impl LogEvent {
    pub fn new(name: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level,
            message: message.into(),
            time: Utc::now(),
            exception: None,
            backtrace: None,
            metadata: LogContext::new(),
        }
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn with_backtrace(mut self, backtrace: Vec<String>) -> Self {
        self.backtrace = Some(backtrace);
        self
    }

    pub fn with_metadata(mut self, metadata: LogContext) -> Self {
        self.metadata = metadata;
        self
    }
}
