//! Ordered certified/uncertified mutation queue
//!
//! The queue folds a stream of dual-confidence mutations into one state:
//!
//! ```text
//!   base ──► [k1: C? U?] ──► [k2: C? U?] ──► [k3: C? U?]
//!    ▲          │
//!    └──────────┘ drain: head entry with a certified value is folded
//!                 into base and popped, repeated until the head has none
//! ```
//!
//! The visible value is `base` with every pending entry applied in
//! reservation order, certified value preferred over uncertified.
//!
//! # Invariants
//!
//! - `pending` is FIFO by reservation key and is never reordered
//! - `base` changes only through [`MutationQueue`]'s head drain
//! - Each certified mutation is folded into `base` at most once
//! - A certified value behind an uncertified head stays an overlay

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Reservation order of a fetch cycle
pub type MutationKey = u64;

/// State transition recorded by a slot
pub enum Mutation<S> {
    /// Replace the state with a constant
    Set(S),

    /// Transform the state
    Update(Arc<dyn Fn(&S) -> S + Send + Sync>),
}

impl<S: Clone + 'static> Mutation<S> {
    /// Constant replacement
    pub fn set(value: S) -> Self {
        Mutation::Set(value)
    }

    /// Pure transform
    pub fn update<F>(f: F) -> Self
    where
        F: Fn(&S) -> S + Send + Sync + 'static,
    {
        Mutation::Update(Arc::new(f))
    }

    /// Leaves the state as it is
    pub fn identity() -> Self {
        Self::update(S::clone)
    }
}

impl<S: Clone> Mutation<S> {
    /// Apply to `state`
    pub fn apply(&self, state: &S) -> S {
        match self {
            Mutation::Set(value) => value.clone(),
            Mutation::Update(f) => f(state),
        }
    }
}

impl<S: Clone> Clone for Mutation<S> {
    fn clone(&self) -> Self {
        match self {
            Mutation::Set(value) => Mutation::Set(value.clone()),
            Mutation::Update(f) => Mutation::Update(Arc::clone(f)),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Mutation<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::Set(value) => f.debug_tuple("Set").field(value).finish(),
            Mutation::Update(_) => f.write_str("Update(..)"),
        }
    }
}

/// Trust level of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Certification {
    /// Accompanied by a proof verifiable against consensus
    Certified,

    /// Single-node answer, no proof
    Uncertified,
}

impl Certification {
    /// True for [`Certification::Certified`]
    pub fn is_certified(self) -> bool {
        matches!(self, Certification::Certified)
    }
}

impl From<bool> for Certification {
    fn from(certified: bool) -> Self {
        if certified {
            Certification::Certified
        } else {
            Certification::Uncertified
        }
    }
}

/// One fetch cycle's contributions
#[derive(Debug)]
pub struct QueueEntry<S> {
    /// Reservation key
    pub key: MutationKey,

    /// Mutation from the certified read
    pub certified: Option<Mutation<S>>,

    /// Latest mutation from an uncertified read
    pub uncertified: Option<Mutation<S>>,
}

impl<S> QueueEntry<S> {
    fn new(key: MutationKey) -> Self {
        Self {
            key,
            certified: None,
            uncertified: None,
        }
    }
}

/// Result of recording a mutation into a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Stored; `committed` entries were folded into base by the drain
    Recorded {
        /// Entries drained from the head
        committed: usize,
    },

    /// Slot already left the queue; nothing changed
    Stale,
}

/// Result of cancelling a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Entry removed; `committed` entries were drained after it
    Removed {
        /// Entries drained from the head
        committed: usize,
    },

    /// Entry holds a certified value and stays queued; its uncertified overlay was dropped
    KeptCertified,

    /// Slot already left the queue
    Stale,
}

/// Certified base plus ordered pending entries
#[derive(Debug)]
pub struct MutationQueue<S> {
    base: S,
    pending: VecDeque<QueueEntry<S>>,
    next_key: MutationKey,
}

impl<S: Clone> MutationQueue<S> {
    /// Create with `initial` as the committed state
    pub fn new(initial: S) -> Self {
        Self {
            base: initial,
            pending: VecDeque::new(),
            next_key: 0,
        }
    }

    /// Allocate the next key and append an empty entry
    pub fn reserve(&mut self) -> MutationKey {
        let key = self.next_key;
        self.next_key += 1;
        self.pending.push_back(QueueEntry::new(key));
        debug!(key, pending = self.pending.len(), "Reserved mutation slot");
        key
    }

    /// Store `mutation` in the slot's field for `certification`, then drain
    pub fn record(
        &mut self,
        key: MutationKey,
        mutation: Mutation<S>,
        certification: Certification,
    ) -> RecordOutcome {
        let Some(entry) = self.entry_mut(key) else {
            debug!(key, ?certification, "Ignoring mutation for settled slot");
            return RecordOutcome::Stale;
        };

        match certification {
            Certification::Certified => entry.certified = Some(mutation),
            Certification::Uncertified => entry.uncertified = Some(mutation),
        }

        RecordOutcome::Recorded {
            committed: self.drain(),
        }
    }

    /// Retire a slot
    ///
    /// An entry without a certified value is removed so it cannot block the
    /// entries behind it. An entry that already holds a certified value keeps
    /// it and only loses its uncertified overlay.
    pub fn cancel(&mut self, key: MutationKey) -> CancelOutcome {
        let Ok(index) = self.pending.binary_search_by_key(&key, |e| e.key) else {
            return CancelOutcome::Stale;
        };

        let entry = &mut self.pending[index];
        if entry.certified.is_some() {
            entry.uncertified = None;
            debug!(key, "Cancelled slot keeps its certified value");
            return CancelOutcome::KeptCertified;
        }

        self.pending.remove(index);
        debug!(key, pending = self.pending.len(), "Cancelled slot removed");
        CancelOutcome::Removed {
            committed: self.drain(),
        }
    }

    /// Visible state: base with every pending entry applied in order
    pub fn current(&self) -> S {
        self.pending.iter().fold(self.base.clone(), |state, entry| {
            match entry.certified.as_ref().or(entry.uncertified.as_ref()) {
                Some(mutation) => mutation.apply(&state),
                None => state,
            }
        })
    }

    /// Committed certified state
    pub fn base(&self) -> &S {
        &self.base
    }

    /// Entries not yet committed
    pub fn pending(&self) -> impl Iterator<Item = &QueueEntry<S>> {
        self.pending.iter()
    }

    /// Number of entries not yet committed
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending and the visible state equals base
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    /// True if `key` is still queued
    pub fn contains(&self, key: MutationKey) -> bool {
        self.pending.binary_search_by_key(&key, |e| e.key).is_ok()
    }

    fn entry_mut(&mut self, key: MutationKey) -> Option<&mut QueueEntry<S>> {
        // Keys are appended in increasing order
        let index = self.pending.binary_search_by_key(&key, |e| e.key).ok()?;
        self.pending.get_mut(index)
    }

    fn drain(&mut self) -> usize {
        let mut committed = 0;
        while self
            .pending
            .front()
            .is_some_and(|head| head.certified.is_some())
        {
            let Some(entry) = self.pending.pop_front() else {
                break;
            };
            if let Some(mutation) = entry.certified {
                self.base = mutation.apply(&self.base);
                committed += 1;
                debug!(key = entry.key, "Committed certified mutation");
            }
        }
        committed
    }
}
