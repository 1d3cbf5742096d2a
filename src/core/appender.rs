//! Appender trait and the shared gating/formatting base

use super::{
    error::Result,
    filter::Filter,
    formatter::{AppenderContext, Formatter, Payload},
    log_event::LogEvent,
    log_level::LogLevel,
};
use std::fmt;
use std::sync::Arc;

/// A sink that receives every event and forwards a subset of them
///
/// `log` returns `Ok(true)` when the event was forwarded and `Ok(false)`
/// when it was dropped by the level/filter gate. Errors are handled by
/// [`dispatch`](super::dispatcher::dispatch), never by the caller.
pub trait Appender: Send + Sync {
    fn name(&self) -> &str;

    fn base(&self) -> &AppenderBase;

    fn log(&self, event: &LogEvent) -> Result<bool>;

    fn should_log(&self, event: &LogEvent) -> bool {
        self.base().should_log(event)
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Immutable level, filter and formatter shared by all appenders
#[derive(Clone)]
pub struct AppenderBase {
    level: LogLevel,
    formatter: Arc<dyn Formatter>,
    filter: Option<Filter>,
    context: AppenderContext,
}

impl AppenderBase {
    pub fn new(
        level: LogLevel,
        formatter: Arc<dyn Formatter>,
        filter: Option<Filter>,
        context: AppenderContext,
    ) -> Self {
        Self {
            level,
            formatter,
            filter,
            context,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn context(&self) -> &AppenderContext {
        &self.context
    }

    pub fn application(&self) -> &str {
        &self.context.application
    }

    pub fn host(&self) -> &str {
        &self.context.host
    }

    /// Level gate, then filter gate
    pub fn should_log(&self, event: &LogEvent) -> bool {
        if event.level < self.level {
            return false;
        }
        match self.filter {
            None => true,
            Some(ref filter) => filter.matches(event),
        }
    }

    pub fn format(&self, event: &LogEvent) -> Result<Payload> {
        self.formatter.call(event, &self.context)
    }
}

impl fmt::Debug for AppenderBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppenderBase")
            .field("level", &self.level)
            .field("filter", &self.filter)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
