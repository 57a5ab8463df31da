//! Metrics collection for settlement polling
//!
//! # Metrics
//!
//! - `settlement_polls_total` - Status fetches issued
//! - `settlement_fetch_errors_total` - Fetches that failed in transport
//! - `settlement_timeouts_total` - Polls abandoned at the deadline
//! - `settlement_poll_duration_seconds` - Time to reach a terminal status

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct PollerMetrics {
    /// Status fetches issued
    pub polls_total: IntCounter,

    /// Transport failures
    pub fetch_errors: IntCounter,

    /// Deadlines exceeded
    pub timeouts: IntCounter,

    /// Time to terminal status
    pub poll_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl PollerMetrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let polls_total = IntCounter::new("settlement_polls_total", "Status fetches issued")?;
        registry.register(Box::new(polls_total.clone()))?;

        let fetch_errors = IntCounter::new(
            "settlement_fetch_errors_total",
            "Fetches that failed in transport",
        )?;
        registry.register(Box::new(fetch_errors.clone()))?;

        let timeouts = IntCounter::new(
            "settlement_timeouts_total",
            "Polls abandoned at the deadline",
        )?;
        registry.register(Box::new(timeouts.clone()))?;

        let poll_duration = Histogram::with_opts(
            HistogramOpts::new(
                "settlement_poll_duration_seconds",
                "Time to reach a terminal status",
            )
            .buckets(vec![1.0, 5.0, 10.0, 15.0, 20.0, 30.0, 45.0, 60.0]),
        )?;
        registry.register(Box::new(poll_duration.clone()))?;

        Ok(Self {
            polls_total,
            fetch_errors,
            timeouts,
            poll_duration,
            registry,
        })
    }

    /// Record a status fetch
    pub fn record_poll(&self) {
        self.polls_total.inc();
    }

    /// Record a transport failure
    pub fn record_fetch_error(&self) {
        self.fetch_errors.inc();
    }

    /// Record a timeout
    pub fn record_timeout(&self) {
        self.timeouts.inc();
    }

    /// Record time to terminal status
    pub fn record_settled(&self, duration_seconds: f64) {
        self.poll_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for PollerMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollerMetrics")
            .field("polls_total", &self.polls_total.get())
            .field("timeouts", &self.timeouts.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = PollerMetrics::new().unwrap();
        assert_eq!(metrics.polls_total.get(), 0);
        assert_eq!(metrics.timeouts.get(), 0);
    }

    #[test]
    fn test_independent_instances() {
        let first = PollerMetrics::new().unwrap();
        let second = PollerMetrics::new().unwrap();
        first.record_poll();
        assert_eq!(first.polls_total.get(), 1);
        assert_eq!(second.polls_total.get(), 0);
    }

    #[test]
    fn test_record_settled() {
        let metrics = PollerMetrics::new().unwrap();
        metrics.record_settled(15.0);
        assert_eq!(metrics.poll_duration.get_sample_count(), 1);
    }
}
