//! Sentry appender
//!
//! Forwards error-significant events to an error-tracking service through an
//! [`ErrorTracker`] client. Events carrying an exception go through the
//! client's exception capture; everything else through message capture.

use crate::core::{
    Appender, AppenderBase, AppenderConfig, ExceptionInfo, InternalLogger, LogEvent, LogLevel,
    Payload, RawFormatter, Result,
};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Name under which the client's own diagnostics are logged
///
/// Events with this name are never forwarded back to the client.
pub const CLIENT_LOGGER_NAME: &str = "Sentry";

/// Level and extra context submitted alongside a capture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureAttributes {
    pub level: Option<String>,
    pub extra: Payload,
}

/// Error-tracking client contract
pub trait ErrorTracker: Send + Sync {
    /// Install the logger the client should use for its own diagnostics
    fn configure(&self, logger: InternalLogger);

    fn capture_exception(&self, exception: &ExceptionInfo, attrs: CaptureAttributes)
        -> Result<()>;

    fn capture_message(&self, message: &str, attrs: CaptureAttributes) -> Result<()>;
}

/// Sends error and fatal events to Sentry
///
/// Defaults: level `error`, [`RawFormatter`].
///
/// # Example
///
/// ```no_run
/// use semantic_appenders::appenders::{ErrorTracker, SentryAppender};
/// use semantic_appenders::core::{AppenderConfig, Dispatcher};
/// use std::sync::Arc;
///
/// # fn client() -> Arc<dyn ErrorTracker> { unimplemented!() }
/// let appender = SentryAppender::new(client(), AppenderConfig::new().application("billing"));
/// let dispatcher = Dispatcher::new().appender(appender);
/// ```
pub struct SentryAppender {
    base: AppenderBase,
    client: Arc<dyn ErrorTracker>,
}

impl SentryAppender {
    pub fn new(client: Arc<dyn ErrorTracker>, config: AppenderConfig) -> Self {
        // Route the client's own logging through the framework under a
        // reserved name so `log` can refuse it.
        client.configure(InternalLogger::new(CLIENT_LOGGER_NAME));

        Self {
            base: config.resolve(Some(LogLevel::Error), Arc::new(RawFormatter)),
            client,
        }
    }
}

impl Appender for SentryAppender {
    fn name(&self) -> &str {
        "sentry"
    }

    fn base(&self) -> &AppenderBase {
        &self.base
    }

    fn log(&self, event: &LogEvent) -> Result<bool> {
        if !self.should_log(event) {
            return Ok(false);
        }
        if event.name == CLIENT_LOGGER_NAME {
            return Ok(false);
        }

        let mut context = self.base.format(event)?;
        let level = take_level(&mut context);

        match event.exception {
            Some(ref exception) => {
                context.remove("exception");
                self.client.capture_exception(
                    exception,
                    CaptureAttributes {
                        level,
                        extra: context,
                    },
                )?;
            }
            None => {
                if let Some(ref backtrace) = event.backtrace {
                    context.insert(
                        "backtrace".to_string(),
                        Value::Array(backtrace.iter().cloned().map(Value::String).collect()),
                    );
                } else {
                    context.remove("backtrace");
                }
                self.client.capture_message(
                    &event.message,
                    CaptureAttributes {
                        level,
                        extra: context,
                    },
                )?;
            }
        }

        Ok(true)
    }
}

impl fmt::Debug for SentryAppender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentryAppender")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

fn take_level(context: &mut Payload) -> Option<String> {
    match context.remove("level")? {
        Value::String(level) => Some(level),
        other => Some(other.to_string()),
    }
}
