//! Transaction settlement poller
//!
//! Polls a status source until a multi-part ledger operation reaches a
//! terminal [`SettlementStatus`] or the deadline passes.
//!
//! ```text
//!        ┌──────────── non-terminal / fetch error ───────────┐
//!        ▼                                                    │
//!   ┌─────────┐   tick (every interval)   ┌───────────────┐   │
//!   │ Pending │ ─────────────────────────►│ fetch status  │───┘
//!   └─────────┘                           └───────┬───────┘
//!        │ deadline                               │ terminal
//!        ▼                                        ▼
//!    Timeout error                        Ok(SettlementStatus)
//! ```
//!
//! The poller never cancels anything on the backend: after a timeout the
//! operation may still complete. Dropping the poll future stops polling.

use crate::config::PollerConfig;
use crate::metrics::PollerMetrics;
use crate::types::SettlementStatus;
use crate::{Error, Result};
use async_trait::async_trait;
use ledger_core::{BlockHeight, Principal};
use std::future::Future;
use tokio::time::{interval, timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Backend that reports the status of a multi-part ledger operation
#[async_trait]
pub trait TransactionStatusSource: Send + Sync {
    /// Status of the operation started by `requester` in `block_height`
    ///
    /// `Err` means the question could not be answered (transport or
    /// backend failure), not that the operation failed.
    async fn transaction_status(
        &self,
        requester: &Principal,
        block_height: BlockHeight,
    ) -> anyhow::Result<SettlementStatus>;
}

/// Repeats status fetches until a terminal status or the deadline
#[derive(Debug, Clone)]
pub struct SettlementPoller {
    config: PollerConfig,
    metrics: Option<PollerMetrics>,
}

impl SettlementPoller {
    /// Create with `config`, rejecting a zero interval or a deadline shorter than it
    pub fn new(config: PollerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            metrics: None,
        })
    }

    /// Create with 5 s interval and 60 s deadline
    pub fn with_defaults() -> Self {
        Self {
            config: PollerConfig::default(),
            metrics: None,
        }
    }

    /// Report to `metrics`
    pub fn with_metrics(mut self, metrics: PollerMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// True if `status` ends polling under this configuration
    pub fn is_terminal(&self, status: &SettlementStatus) -> bool {
        match status {
            SettlementStatus::NotFound => !self.config.retry_not_found,
            other => other.is_terminal(),
        }
    }

    /// Poll `fetch` until it yields a terminal status
    ///
    /// `operation` only labels log lines and the timeout error.
    pub async fn poll<F, Fut>(&self, operation: &str, mut fetch: F) -> Result<SettlementStatus>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<SettlementStatus>>,
    {
        let started = Instant::now();
        let deadline = started + self.config.deadline();
        let mut ticker = interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempts: u32 = 0;

        loop {
            if timeout_at(deadline, ticker.tick()).await.is_err() || Instant::now() >= deadline {
                break;
            }

            attempts += 1;
            if let Some(metrics) = &self.metrics {
                metrics.record_poll();
            }

            match timeout_at(deadline, fetch()).await {
                Err(_) => {
                    warn!(operation, attempt = attempts, "Status fetch still in flight at deadline");
                    break;
                }
                Ok(Err(err)) => {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_fetch_error();
                    }
                    warn!(operation, attempt = attempts, "Status fetch failed, retrying: {:#}", err);
                }
                Ok(Ok(status)) if self.is_terminal(&status) => {
                    let elapsed = started.elapsed();
                    if let Some(metrics) = &self.metrics {
                        metrics.record_settled(elapsed.as_secs_f64());
                    }
                    info!(operation, attempts, ?elapsed, %status, "Operation settled");
                    return Ok(status);
                }
                Ok(Ok(status)) => {
                    debug!(operation, attempt = attempts, %status, "Operation still pending");
                }
            }
        }

        let elapsed = started.elapsed();
        if let Some(metrics) = &self.metrics {
            metrics.record_timeout();
        }
        warn!(operation, attempts, ?elapsed, "Gave up waiting for a terminal status");

        Err(Error::Timeout {
            operation: operation.to_string(),
            attempts,
            elapsed,
        })
    }

    /// Poll `source` for the operation `requester` started in `block_height`
    pub async fn poll_transaction<S>(
        &self,
        source: &S,
        requester: &Principal,
        block_height: BlockHeight,
    ) -> Result<SettlementStatus>
    where
        S: TransactionStatusSource + ?Sized,
    {
        let operation = format!("block {}", block_height);
        self.poll(&operation, move || {
            source.transaction_status(requester, block_height)
        })
        .await
    }
}

impl Default for SettlementPoller {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Poll `fetch` with the default interval and deadline
pub async fn poll_until_settled<F, Fut>(fetch: F) -> Result<SettlementStatus>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<SettlementStatus>>,
{
    SettlementPoller::with_defaults()
        .poll("operation", fetch)
        .await
}
