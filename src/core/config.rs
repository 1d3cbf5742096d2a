//! Appender configuration and process-wide defaults

use super::{
    appender::AppenderBase,
    filter::Filter,
    formatter::{AppenderContext, Formatter},
    log_level::LogLevel,
};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Application name used when neither the appender nor the defaults set one
pub const DEFAULT_APPLICATION: &str = "Semantic Logger";

/// Process-wide fallbacks for appender settings
///
/// Read once when an appender is constructed; changing the defaults later
/// does not affect appenders that already exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerDefaults {
    pub level: LogLevel,
    pub application: String,
    pub host: String,
}

impl LoggerDefaults {
    fn initial() -> Self {
        Self {
            level: LogLevel::Info,
            application: DEFAULT_APPLICATION.to_string(),
            host: local_host_name(),
        }
    }
}

impl Default for LoggerDefaults {
    fn default() -> Self {
        Self::initial()
    }
}

static DEFAULTS: RwLock<Option<LoggerDefaults>> = RwLock::new(None);

fn local_host_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Snapshot of the current process-wide defaults
pub fn defaults() -> LoggerDefaults {
    if let Some(ref current) = *DEFAULTS.read() {
        return current.clone();
    }
    DEFAULTS.write().get_or_insert_with(LoggerDefaults::initial).clone()
}

/// Replace the process-wide defaults
pub fn set_defaults(defaults: LoggerDefaults) {
    *DEFAULTS.write() = Some(defaults);
}

/// Change only the process-wide default level
pub fn set_default_level(level: LogLevel) {
    let mut guard = DEFAULTS.write();
    guard.get_or_insert_with(LoggerDefaults::initial).level = level;
}

/// Settings shared by every appender
///
/// Every field is optional. Unset fields fall back to the appender's own
/// default and then to the process-wide [`LoggerDefaults`].
///
/// # Example
///
/// ```
/// use semantic_appenders::core::{AppenderConfig, Filter, LogLevel};
///
/// let config = AppenderConfig::new()
///     .level(LogLevel::Warn)
///     .filter(Filter::pattern("^Billing").unwrap())
///     .application("billing");
/// ```
#[derive(Clone, Default)]
pub struct AppenderConfig {
    pub level: Option<LogLevel>,
    pub formatter: Option<Arc<dyn Formatter>>,
    pub filter: Option<Filter>,
    pub application: Option<String>,
    pub host: Option<String>,
}

impl AppenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Resolve into an immutable base
    ///
    /// `default_level` is the appender's own default (e.g. `error` for
    /// Sentry); `None` means "use the process-wide default level".
    pub(crate) fn resolve(
        self,
        default_level: Option<LogLevel>,
        default_formatter: Arc<dyn Formatter>,
    ) -> AppenderBase {
        let defaults = defaults();
        let level = self.level.or(default_level).unwrap_or(defaults.level);
        let context = AppenderContext::new(
            self.application.unwrap_or(defaults.application),
            self.host.unwrap_or(defaults.host),
        );

        AppenderBase::new(
            level,
            self.formatter.unwrap_or(default_formatter),
            self.filter,
            context,
        )
    }
}

impl fmt::Debug for AppenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppenderConfig")
            .field("level", &self.level)
            .field("formatter", &self.formatter.as_ref().map(|_| ".."))
            .field("filter", &self.filter)
            .field("application", &self.application)
            .field("host", &self.host)
            .finish()
    }
}
