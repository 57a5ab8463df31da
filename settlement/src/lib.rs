//! Transaction Settlement
//!
//! Waits for multi-part ledger operations (transfer followed by backend
//! processing, e.g. neuron staking or canister creation) to settle.
//!
//! # Architecture
//!
//! - **SettlementStatus**: closed set of backend statuses, split into
//!   terminal and non-terminal members
//! - **SettlementPoller**: fetches the status every interval until a
//!   terminal one arrives or the deadline passes
//! - **TransactionStatusSource**: the backend call the poller drives
//!
//! Business failures (`Error`, `Refunded`, `NotFound`) are returned as
//! statuses; only the deadline produces an `Err`.
//!
//! # Example
//!
//! ```no_run
//! use settlement::{poll_until_settled, SettlementStatus};
//!
//! #[tokio::main]
//! async fn main() -> settlement::Result<()> {
//!     let status = poll_until_settled(|| async { Ok(SettlementStatus::Complete) }).await?;
//!     match status {
//!         SettlementStatus::Complete | SettlementStatus::EntityCreated(_) => println!("settled"),
//!         other => println!("failed: {}", other),
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod poller;
pub mod types;

// Re-exports
pub use config::{Config, PollerConfig};
pub use error::{Error, Result};
pub use metrics::PollerMetrics;
pub use poller::{poll_until_settled, SettlementPoller, TransactionStatusSource};
pub use types::{CreatedEntity, SettlementStatus};
