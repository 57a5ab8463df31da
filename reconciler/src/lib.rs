//! Certified/Uncertified Reconciliation
//!
//! Folds fast uncertified reads and slower certified reads into one
//! continuously readable value.
//!
//! # Architecture
//!
//! - **MutationQueue**: certified `base` plus FIFO pending entries, each with
//!   an optional certified and an optional uncertified mutation
//! - **ReconciledStore**: one queue per piece of client state, with slot
//!   handles and observers
//! - **query_and_update**: drives both reads of one fetch cycle into a slot
//!
//! # Invariants
//!
//! - Certified facts commit in reservation order, never out of order
//! - Committed state is never rolled back by an uncertified value
//! - A later certified value cannot commit ahead of an earlier open slot
//!
//! # Example
//!
//! ```
//! use reconciler::ReconciledStore;
//!
//! let store = ReconciledStore::new("balance", 0u64);
//!
//! let first = store.reserve();
//! first.set(10, false);
//! let second = store.reserve();
//! second.set(20, true);
//! assert_eq!((store.get(), store.base()), (20, 0));
//!
//! first.set(15, true);
//! assert_eq!((store.get(), store.base()), (20, 20));
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod loader;
pub mod metrics;
pub mod queue;
pub mod store;

// Re-exports
pub use loader::query_and_update;
pub use metrics::StoreMetrics;
pub use queue::{Certification, Mutation, MutationKey, MutationQueue, QueueEntry};
pub use store::{ReconciledStore, SlotHandle, Subscription};
