//! Dispatch boundary and fan-out to appenders
//!
//! [`dispatch`] is the single place where appender failures are converted
//! into diagnostics. Errors and panics from an appender's `log` path are
//! reported to an [`ErrorHandler`] and never reach the logging call site.

use super::{
    appender::Appender,
    error::AppenderError,
    log_event::LogEvent,
    log_level::LogLevel,
    metrics::DispatchMetrics,
};
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Error channel: receives the appender name and the error it raised
pub type ErrorHandler = Arc<dyn Fn(&str, &AppenderError) + Send + Sync>;

/// Default error channel, writing one line per failure to stderr
pub fn stderr_error_handler() -> ErrorHandler {
    Arc::new(|appender: &str, err: &AppenderError| {
        let line = format!("[LOGGER ERROR] Appender '{}' failed: {}", appender, err);
        #[cfg(feature = "console")]
        {
            use colored::Colorize;
            eprintln!("{}", line.color(LogLevel::Error.color_code()));
        }
        #[cfg(not(feature = "console"))]
        eprintln!("{}", line);
    })
}

pub(crate) fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// What happened to one event at one appender
#[derive(Debug)]
pub enum DispatchOutcome {
    Forwarded,
    Skipped,
    Failed(AppenderError),
}

/// Run `appender.log` with error and panic isolation, without reporting
pub fn try_dispatch(appender: &dyn Appender, event: &LogEvent) -> DispatchOutcome {
    match catch_unwind(AssertUnwindSafe(|| appender.log(event))) {
        Ok(Ok(true)) => DispatchOutcome::Forwarded,
        Ok(Ok(false)) => DispatchOutcome::Skipped,
        Ok(Err(e)) => DispatchOutcome::Failed(e),
        Err(panic_info) => DispatchOutcome::Failed(AppenderError::other(format!(
            "panicked: {}",
            panic_message(panic_info.as_ref())
        ))),
    }
}

/// Deliver one event to one appender
///
/// Returns whether the event was forwarded. Failures go to `on_error`.
pub fn dispatch(
    appender: &dyn Appender,
    event: &LogEvent,
    on_error: &(dyn Fn(&str, &AppenderError) + Send + Sync),
) -> bool {
    match try_dispatch(appender, event) {
        DispatchOutcome::Forwarded => true,
        DispatchOutcome::Skipped => false,
        DispatchOutcome::Failed(e) => {
            on_error(appender.name(), &e);
            false
        }
    }
}

/// Fans each event out to every registered appender
///
/// # Example
///
/// ```
/// use semantic_appenders::core::{AppenderError, Dispatcher, LogEvent, LogLevel};
/// use std::sync::Arc;
///
/// let dispatcher = Dispatcher::new().with_error_handler(Arc::new(|name: &str, err: &AppenderError| {
///     eprintln!("{} failed: {}", name, err);
/// }));
///
/// let forwarded = dispatcher.dispatch(&LogEvent::new("Billing", LogLevel::Info, "ok"));
/// assert_eq!(forwarded, 0);
/// ```
pub struct Dispatcher {
    appenders: Vec<Arc<dyn Appender>>,
    on_error: ErrorHandler,
    metrics: Arc<DispatchMetrics>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            appenders: Vec::new(),
            on_error: stderr_error_handler(),
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.on_error = handler;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Arc::new(appender));
        self
    }

    pub fn add_appender(&mut self, appender: Arc<dyn Appender>) {
        self.appenders.push(appender);
    }

    pub fn appenders(&self) -> &[Arc<dyn Appender>] {
        &self.appenders
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Deliver `event` to every appender; returns how many forwarded it
    pub fn dispatch(&self, event: &LogEvent) -> usize {
        let mut forwarded = 0;

        for appender in &self.appenders {
            match try_dispatch(appender.as_ref(), event) {
                DispatchOutcome::Forwarded => {
                    self.metrics.record_forwarded();
                    forwarded += 1;
                }
                DispatchOutcome::Skipped => {
                    self.metrics.record_skipped();
                }
                DispatchOutcome::Failed(e) => {
                    self.metrics.record_failed();
                    (self.on_error)(appender.name(), &e);
                }
            }
        }

        forwarded
    }

    /// Flush every appender; a failing flush does not stop the others
    pub fn flush(&self) {
        for appender in &self.appenders {
            let flush_result = catch_unwind(AssertUnwindSafe(|| appender.flush()));

            let err = match flush_result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(panic_info) => AppenderError::other(format!(
                    "panicked during flush: {}",
                    panic_message(panic_info.as_ref())
                )),
            };
            self.metrics.record_flush_failure();
            (self.on_error)(appender.name(), &err);
        }
    }

    /// Make this dispatcher the process-wide target of [`InternalLogger`]s
    ///
    /// Returns the previously installed dispatcher, if any.
    pub fn install(self: Arc<Self>) -> Option<Arc<Dispatcher>> {
        GLOBAL.write().replace(self)
    }

    /// Remove the process-wide dispatcher
    pub fn uninstall() -> Option<Arc<Dispatcher>> {
        GLOBAL.write().take()
    }

    /// The process-wide dispatcher, if one is installed
    pub fn global() -> Option<Arc<Dispatcher>> {
        GLOBAL.read().clone()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.appenders.iter().map(|a| a.name()).collect();
        f.debug_struct("Dispatcher")
            .field("appenders", &names)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

static GLOBAL: RwLock<Option<Arc<Dispatcher>>> = RwLock::new(None);

/// Named logger handed to third-party clients for their own diagnostics
///
/// Events are emitted under a fixed name into the installed dispatcher, so
/// appenders can recognise (and refuse) them. Without an installed
/// dispatcher the events are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalLogger {
    name: String,
}

impl InternalLogger {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns how many appenders forwarded the event
    pub fn log(&self, level: LogLevel, message: impl Into<String>) -> usize {
        // Clone out of the lock so appenders may log re-entrantly.
        let Some(dispatcher) = Dispatcher::global() else {
            return 0;
        };
        dispatcher.dispatch(&LogEvent::new(self.name.clone(), level, message))
    }

    pub fn debug(&self, message: impl Into<String>) -> usize {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: impl Into<String>) -> usize {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: impl Into<String>) -> usize {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: impl Into<String>) -> usize {
        self.log(LogLevel::Error, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AppenderBase, AppenderContext, RawFormatter, Result};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAppender {
        base: AppenderBase,
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingAppender {
        fn new(level: LogLevel, fail: bool) -> Self {
            Self {
                base: AppenderBase::new(
                    level,
                    Arc::new(RawFormatter),
                    None,
                    AppenderContext::new("app", "host"),
                ),
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl Appender for CountingAppender {
        fn name(&self) -> &str {
            "counting"
        }

        fn base(&self) -> &AppenderBase {
            &self.base
        }

        fn log(&self, event: &LogEvent) -> Result<bool> {
            if !self.should_log(event) {
                return Ok(false);
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppenderError::delivery("counting", "refused"));
            }
            Ok(true)
        }
    }

    struct PanickingAppender(AppenderBase);

    impl Appender for PanickingAppender {
        fn name(&self) -> &str {
            "panicking"
        }

        fn base(&self) -> &AppenderBase {
            &self.0
        }

        fn log(&self, _event: &LogEvent) -> Result<bool> {
            panic!("sink exploded");
        }

        fn flush(&self) -> Result<()> {
            Err(AppenderError::other("flush refused"))
        }
    }

    fn collecting_handler() -> (ErrorHandler, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: ErrorHandler = Arc::new(move |name: &str, err: &AppenderError| {
            sink.lock().push(format!("{}: {}", name, err));
        });
        (handler, seen)
    }

    #[test]
    fn test_dispatch_below_level_has_no_side_effects() {
        let appender = CountingAppender::new(LogLevel::Error, false);
        let (handler, seen) = collecting_handler();

        let forwarded = dispatch(
            &appender,
            &LogEvent::new("A", LogLevel::Warn, "m"),
            handler.as_ref(),
        );

        assert!(!forwarded);
        assert_eq!(appender.calls.load(Ordering::SeqCst), 0);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_dispatch_reports_errors() {
        let appender = CountingAppender::new(LogLevel::Trace, true);
        let (handler, seen) = collecting_handler();

        let forwarded = dispatch(
            &appender,
            &LogEvent::new("A", LogLevel::Info, "m"),
            handler.as_ref(),
        );

        assert!(!forwarded);
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("counting: Delivery to counting failed"));
    }

    #[test]
    fn test_dispatcher_isolates_panics() {
        let (handler, seen) = collecting_handler();
        let healthy = Arc::new(CountingAppender::new(LogLevel::Trace, false));

        let mut dispatcher = Dispatcher::new()
            .with_error_handler(handler)
            .appender(PanickingAppender(AppenderBase::new(
                LogLevel::Trace,
                Arc::new(RawFormatter),
                None,
                AppenderContext::new("app", "host"),
            )));
        dispatcher.add_appender(Arc::clone(&healthy) as Arc<dyn Appender>);

        let forwarded = dispatcher.dispatch(&LogEvent::new("A", LogLevel::Info, "m"));

        assert_eq!(forwarded, 1);
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.metrics().forwarded_count(), 1);
        assert_eq!(dispatcher.metrics().failed_count(), 1);
        assert!(seen.lock()[0].contains("sink exploded"));
    }

    #[test]
    fn test_dispatcher_counts_skipped() {
        let dispatcher = Dispatcher::new().appender(CountingAppender::new(LogLevel::Fatal, false));

        assert_eq!(dispatcher.dispatch(&LogEvent::new("A", LogLevel::Info, "m")), 0);
        assert_eq!(dispatcher.metrics().skipped_count(), 1);
        assert_eq!(dispatcher.metrics().failed_count(), 0);
    }

    #[test]
    fn test_flush_failures_reported() {
        let (handler, seen) = collecting_handler();
        let dispatcher = Dispatcher::new()
            .with_error_handler(handler)
            .appender(PanickingAppender(AppenderBase::new(
                LogLevel::Trace,
                Arc::new(RawFormatter),
                None,
                AppenderContext::new("app", "host"),
            )));

        dispatcher.flush();

        assert_eq!(dispatcher.metrics().flush_failures(), 1);
        assert_eq!(seen.lock()[0], "panicking: flush refused");
    }
}
