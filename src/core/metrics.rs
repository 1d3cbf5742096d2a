//! Dispatch metrics for observability
//!
//! Counts what happened to each (event, appender) pair handed to the
//! dispatch boundary: forwarded to the sink, skipped by the gate, or failed.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the dispatch boundary
///
/// # Example
///
/// ```
/// use semantic_appenders::core::DispatchMetrics;
///
/// let metrics = DispatchMetrics::new();
///
/// metrics.record_forwarded();
/// metrics.record_failed();
///
/// assert_eq!(metrics.forwarded_count(), 1);
/// assert_eq!(metrics.failed_count(), 1);
/// assert_eq!(metrics.failure_rate(), 50.0);
/// ```
#[derive(Debug)]
pub struct DispatchMetrics {
    /// Events an appender accepted and sent on
    forwarded: AtomicU64,

    /// Events an appender dropped at its level/filter gate
    skipped: AtomicU64,

    /// Events lost to an error or panic inside an appender
    failed: AtomicU64,

    /// Flushes that returned an error or panicked
    flush_failures: AtomicU64,
}

impl DispatchMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            forwarded: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            flush_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn forwarded_count(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn skipped_count(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_failures(&self) -> u64 {
        self.flush_failures.load(Ordering::Relaxed)
    }

    /// Record a forwarded event, returning the previous count
    #[inline]
    pub fn record_forwarded(&self) -> u64 {
        self.forwarded.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_skipped(&self) -> u64 {
        self.skipped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_flush_failure(&self) -> u64 {
        self.flush_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed dispatches as a percentage of attempted sends (0.0 - 100.0)
    ///
    /// Skipped events are not attempts. Returns 0.0 if nothing was attempted.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failed_count() as f64;
        let total = self.forwarded_count() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.forwarded.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.flush_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DispatchMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            forwarded: AtomicU64::new(self.forwarded_count()),
            skipped: AtomicU64::new(self.skipped_count()),
            failed: AtomicU64::new(self.failed_count()),
            flush_failures: AtomicU64::new(self.flush_failures()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = DispatchMetrics::new();
        assert_eq!(metrics.forwarded_count(), 0);
        assert_eq!(metrics.skipped_count(), 0);
        assert_eq!(metrics.failed_count(), 0);
        assert_eq!(metrics.flush_failures(), 0);
    }

    #[test]
    fn test_record_returns_previous_value() {
        let metrics = DispatchMetrics::new();
        assert_eq!(metrics.record_skipped(), 0);
        assert_eq!(metrics.record_skipped(), 1);
        assert_eq!(metrics.skipped_count(), 2);
    }

    #[test]
    fn test_failure_rate_ignores_skipped() {
        let metrics = DispatchMetrics::new();
        assert_eq!(metrics.failure_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_forwarded();
        }
        for _ in 0..500 {
            metrics.record_skipped();
        }
        for _ in 0..10 {
            metrics.record_failed();
        }

        let rate = metrics.failure_rate();
        assert!((rate - 10.0).abs() < f64::EPSILON, "Failure rate was {}", rate);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = DispatchMetrics::new();
        metrics.record_forwarded();
        metrics.record_failed();
        metrics.record_flush_failure();

        metrics.reset();

        assert_eq!(metrics.forwarded_count(), 0);
        assert_eq!(metrics.failed_count(), 0);
        assert_eq!(metrics.flush_failures(), 0);
    }

    #[test]
    fn test_metrics_clone_is_snapshot() {
        let metrics = DispatchMetrics::new();
        metrics.record_forwarded();

        let snapshot = metrics.clone();
        metrics.record_forwarded();

        assert_eq!(metrics.forwarded_count(), 2);
        assert_eq!(snapshot.forwarded_count(), 1);
    }
}
