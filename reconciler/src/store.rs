//! Subscribable reconciled store
//!
//! [`ReconciledStore`] owns one [`MutationQueue`] and exposes its fold as a
//! readable, observable value. Fetch cycles reserve a [`SlotHandle`] and
//! feed it the uncertified and certified results as they arrive.
//!
//! ```text
//!   reserve() ──► SlotHandle ──set/update──► MutationQueue ──fold──► observers
//! ```
//!
//! Every store is an explicitly constructed value; clones share the same
//! queue. Mutations are synchronous. Observers run after the queue lock is
//! released, so they may read the store.
//!
//! Every fold is stamped with a version while the queue lock is held.
//! Deliveries are serialized and a fold older than the last delivered one is
//! dropped, so concurrent writers can never leave an observer on a stale value.

use crate::metrics::StoreMetrics;
use crate::queue::{CancelOutcome, Certification, Mutation, MutationKey, MutationQueue, RecordOutcome};
use parking_lot::{Mutex, ReentrantMutex};
use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

type Observer<S> = Arc<dyn Fn(&S) + Send + Sync>;

struct Inner<S> {
    name: String,
    queue: Mutex<MutationQueue<S>>,
    observers: Mutex<Vec<(u64, Observer<S>)>>,
    next_observer_id: AtomicU64,
    // Bumped under the queue lock for every fold handed to observers
    version: AtomicU64,
    // Last version delivered; held while observers run
    delivered: ReentrantMutex<Cell<u64>>,
    metrics: Option<StoreMetrics>,
}

impl<S: Clone> Inner<S> {
    fn record(&self, key: MutationKey, mutation: Mutation<S>, certification: Certification) {
        let (version, value) = {
            let mut queue = self.queue.lock();
            match queue.record(key, mutation, certification) {
                RecordOutcome::Recorded { committed } => {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_mutation(
                            certification.is_certified(),
                            committed,
                            queue.pending_len(),
                        );
                    }
                    if committed > 0 {
                        debug!(store = %self.name, key, committed, "Drained certified entries");
                    }
                    (self.next_version(), queue.current())
                }
                RecordOutcome::Stale => return,
            }
        };
        self.notify(version, &value);
    }

    fn cancel(&self, key: MutationKey) {
        let (version, value) = {
            let mut queue = self.queue.lock();
            match queue.cancel(key) {
                CancelOutcome::Removed { committed } => {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_cancel(committed, queue.pending_len());
                    }
                    (self.next_version(), queue.current())
                }
                CancelOutcome::KeptCertified => (self.next_version(), queue.current()),
                CancelOutcome::Stale => return,
            }
        };
        self.notify(version, &value);
    }

    // Call with the queue lock held
    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn notify(&self, version: u64, value: &S) {
        let delivered = self.delivered.lock();
        if version <= delivered.get() {
            return;
        }
        delivered.set(version);

        let observers: Vec<Observer<S>> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in observers {
            // An observer wrote to the store and a newer fold went out
            if delivered.get() != version {
                break;
            }
            observer(value);
        }
    }
}

/// Reconciled view over certified and uncertified reads
pub struct ReconciledStore<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for ReconciledStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Clone> ReconciledStore<S> {
    /// Create a store whose committed state starts at `initial`
    pub fn new(name: impl Into<String>, initial: S) -> Self {
        Self::build(name.into(), initial, None)
    }

    /// Create a store that reports to `metrics`
    pub fn with_metrics(name: impl Into<String>, initial: S, metrics: StoreMetrics) -> Self {
        Self::build(name.into(), initial, Some(metrics))
    }

    fn build(name: String, initial: S, metrics: Option<StoreMetrics>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                queue: Mutex::new(MutationQueue::new(initial)),
                observers: Mutex::new(Vec::new()),
                next_observer_id: AtomicU64::new(0),
                version: AtomicU64::new(0),
                delivered: ReentrantMutex::new(Cell::new(0)),
                metrics,
            }),
        }
    }

    /// Store name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Reserve the next slot; call once per fetch cycle
    pub fn reserve(&self) -> SlotHandle<S> {
        let key = {
            let mut queue = self.inner.queue.lock();
            let key = queue.reserve();
            if let Some(metrics) = &self.inner.metrics {
                metrics.record_reserve(queue.pending_len());
            }
            key
        };

        SlotHandle {
            store: self.clone(),
            key,
            retired: false,
        }
    }

    /// Current visible value
    pub fn get(&self) -> S {
        self.inner.queue.lock().current()
    }

    /// Committed certified value
    pub fn base(&self) -> S {
        self.inner.queue.lock().base().clone()
    }

    /// Slots not yet committed
    pub fn pending_len(&self) -> usize {
        self.inner.queue.lock().pending_len()
    }

    /// True when every reserved slot has committed or been cancelled
    pub fn is_settled(&self) -> bool {
        self.inner.queue.lock().is_settled()
    }

    /// Register `observer`; it is called with the current value now and after every change
    pub fn subscribe<F>(&self, observer: F) -> Subscription<S>
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let id = self.inner.next_observer_id.fetch_add(1, Ordering::Relaxed);
        let observer: Observer<S> = Arc::new(observer);

        // No delivery can interleave between registering and the first call
        let _delivering = self.inner.delivered.lock();
        self.inner
            .observers
            .lock()
            .push((id, Arc::clone(&observer)));
        observer(&self.get());

        Subscription {
            store: Arc::downgrade(&self.inner),
            id,
        }
    }
}

impl<S> fmt::Debug for ReconciledStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconciledStore")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

/// Write access to one reserved slot
///
/// Dropping the handle cancels the slot (see [`SlotHandle::cancel`]).
pub struct SlotHandle<S: Clone> {
    store: ReconciledStore<S>,
    key: MutationKey,
    retired: bool,
}

impl<S: Clone> SlotHandle<S> {
    /// Reservation key
    pub fn key(&self) -> MutationKey {
        self.key
    }

    /// Record a replacement value
    pub fn set(&self, value: S, certification: impl Into<Certification>) {
        self.store
            .inner
            .record(self.key, Mutation::Set(value), certification.into());
    }

    /// Record a transform
    pub fn update<F>(&self, f: F, certification: impl Into<Certification>)
    where
        F: Fn(&S) -> S + Send + Sync + 'static,
    {
        self.store
            .inner
            .record(self.key, Mutation::Update(Arc::new(f)), certification.into());
    }

    /// Record an already built mutation
    pub fn apply(&self, mutation: Mutation<S>, certification: impl Into<Certification>) {
        self.store.inner.record(self.key, mutation, certification.into());
    }

    /// Retire the slot without contributing further
    ///
    /// Without a certified value the entry is removed, so slots behind it can
    /// commit. With one, the certified value stays queued and commits in order.
    pub fn cancel(mut self) {
        self.retire();
    }

    fn retire(&mut self) {
        if !self.retired {
            self.retired = true;
            self.store.inner.cancel(self.key);
        }
    }
}

impl<S: Clone> Drop for SlotHandle<S> {
    fn drop(&mut self) {
        self.retire();
    }
}

impl<S: Clone> fmt::Debug for SlotHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotHandle")
            .field("store", &self.store.inner.name)
            .field("key", &self.key)
            .finish()
    }
}

/// Registered observer; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes the observer"]
pub struct Subscription<S> {
    store: Weak<Inner<S>>,
    id: u64,
}

impl<S> Subscription<S> {
    /// Remove the observer
    pub fn unsubscribe(self) {}
}

impl<S> Drop for Subscription<S> {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.observers.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

impl<S> fmt::Debug for Subscription<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
