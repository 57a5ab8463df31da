//! Metrics collection for reconciled stores
//!
//! # Metrics
//!
//! - `reconciler_slots_reserved_total` - Slots handed out by `reserve()`
//! - `reconciler_commits_total` - Certified mutations folded into base
//! - `reconciler_uncertified_records_total` - Uncertified values recorded
//! - `reconciler_slots_cancelled_total` - Slots retired without committing
//! - `reconciler_pending_depth` - Entries waiting to commit
//!
//! Every collector carries a `store` const label with the store's name.

use prometheus::{IntCounter, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Metrics collector for one store
#[derive(Clone)]
pub struct StoreMetrics {
    /// Slots reserved
    pub slots_reserved: IntCounter,

    /// Certified mutations committed
    pub commits: IntCounter,

    /// Uncertified mutations recorded
    pub uncertified_records: IntCounter,

    /// Slots removed by cancel
    pub slots_cancelled: IntCounter,

    /// Current pending depth
    pub pending_depth: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl StoreMetrics {
    /// Create a collector on its own registry
    pub fn new(store: &str) -> prometheus::Result<Self> {
        Self::with_registry(store, Arc::new(Registry::new()))
    }

    /// Create a collector on a shared registry
    pub fn with_registry(store: &str, registry: Arc<Registry>) -> prometheus::Result<Self> {
        let opts = |name: &str, help: &str| Opts::new(name, help).const_label("store", store);

        let slots_reserved = IntCounter::with_opts(opts(
            "reconciler_slots_reserved_total",
            "Slots handed out by reserve()",
        ))?;
        registry.register(Box::new(slots_reserved.clone()))?;

        let commits = IntCounter::with_opts(opts(
            "reconciler_commits_total",
            "Certified mutations folded into base",
        ))?;
        registry.register(Box::new(commits.clone()))?;

        let uncertified_records = IntCounter::with_opts(opts(
            "reconciler_uncertified_records_total",
            "Uncertified values recorded",
        ))?;
        registry.register(Box::new(uncertified_records.clone()))?;

        let slots_cancelled = IntCounter::with_opts(opts(
            "reconciler_slots_cancelled_total",
            "Slots retired without committing",
        ))?;
        registry.register(Box::new(slots_cancelled.clone()))?;

        let pending_depth = IntGauge::with_opts(opts(
            "reconciler_pending_depth",
            "Entries waiting to commit",
        ))?;
        registry.register(Box::new(pending_depth.clone()))?;

        Ok(Self {
            slots_reserved,
            commits,
            uncertified_records,
            slots_cancelled,
            pending_depth,
            registry,
        })
    }

    /// Record a reservation
    pub fn record_reserve(&self, pending: usize) {
        self.slots_reserved.inc();
        self.pending_depth.set(pending as i64);
    }

    /// Record a mutation and the commits it triggered
    pub fn record_mutation(&self, certified: bool, committed: usize, pending: usize) {
        if !certified {
            self.uncertified_records.inc();
        }
        self.commits.inc_by(committed as u64);
        self.pending_depth.set(pending as i64);
    }

    /// Record a cancelled slot
    pub fn record_cancel(&self, committed: usize, pending: usize) {
        self.slots_cancelled.inc();
        self.commits.inc_by(committed as u64);
        self.pending_depth.set(pending as i64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for StoreMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreMetrics")
            .field("commits", &self.commits.get())
            .field("pending_depth", &self.pending_depth.get())
            .finish_non_exhaustive()
    }
}
