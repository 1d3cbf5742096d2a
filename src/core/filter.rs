//! Event filters
//!
//! A filter is either a regular expression matched against the event's
//! logger name, or a predicate over the whole event. Evaluation is
//! fail-closed: a predicate that errors or panics is treated as "no match"
//! and the event is dropped.

use super::{
    dispatcher::panic_message,
    error::{AppenderError, Result},
    log_event::LogEvent,
};
use regex::Regex;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Error type predicates may return
pub type PredicateError = Box<dyn std::error::Error + Send + Sync>;

/// Predicate over a full event
pub type Predicate =
    Arc<dyn Fn(&LogEvent) -> std::result::Result<bool, PredicateError> + Send + Sync>;

#[derive(Clone)]
pub enum Filter {
    /// Include only events whose `name` matches
    Pattern(Regex),
    /// Include only events for which the predicate returns `Ok(true)`
    Predicate(Predicate),
}

impl Filter {
    /// Compile a name pattern
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Filter::Pattern)
            .map_err(|e| AppenderError::config("filter", e.to_string()))
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&LogEvent) -> std::result::Result<bool, PredicateError> + Send + Sync + 'static,
    {
        Filter::Predicate(Arc::new(f))
    }

    /// Evaluate the filter, surfacing predicate failures
    pub fn evaluate(&self, event: &LogEvent) -> Result<bool> {
        match self {
            Filter::Pattern(regex) => Ok(regex.is_match(&event.name)),
            Filter::Predicate(predicate) => {
                match catch_unwind(AssertUnwindSafe(|| predicate(event))) {
                    Ok(Ok(matched)) => Ok(matched),
                    Ok(Err(e)) => Err(AppenderError::filter(e.to_string())),
                    Err(panic_info) => Err(AppenderError::filter(format!(
                        "predicate panicked: {}",
                        panic_message(panic_info.as_ref())
                    ))),
                }
            }
        }
    }

    /// Fail-closed view of [`Filter::evaluate`]
    pub fn matches(&self, event: &LogEvent) -> bool {
        self.evaluate(event).unwrap_or(false)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Filter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<Regex> for Filter {
    fn from(regex: Regex) -> Self {
        Filter::Pattern(regex)
    }
}
