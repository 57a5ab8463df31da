//! Dual uncertified/certified loading into one slot
//!
//! [`query_and_update`] reserves a slot up front, drives both reads concurrently and
//! always leaves the slot with a certified value, so a failed certified read
//! cannot block the store.

use crate::queue::{Certification, Mutation};
use crate::store::ReconciledStore;
use std::fmt;
use std::future::Future;
use tracing::{debug, warn};

/// Load one fetch cycle into `store`
///
/// The slot is reserved when this function is called, not when the returned
/// future is first polled, so cycles commit in call order however they are
/// spawned or joined. The future owns the slot; dropping it unpolled cancels
/// the slot.
///
/// - The uncertified result is recorded when it arrives, unless the
///   certified one arrived first.
/// - The certified result is recorded and ends the cycle.
/// - If the certified read fails, the slot is resolved with an identity
///   mutation (the committed state is kept) and the error is returned.
pub fn query_and_update<S, E, Q, U>(
    store: &ReconciledStore<S>,
    query: Q,
    update: U,
) -> impl Future<Output = Result<(), E>>
where
    S: Clone + 'static,
    E: fmt::Display,
    Q: Future<Output = Result<Mutation<S>, E>>,
    U: Future<Output = Result<Mutation<S>, E>>,
{
    let slot = store.reserve();
    let name = store.name().to_string();

    async move {
        tokio::pin!(query);
        tokio::pin!(update);
        let mut query_done = false;

        loop {
            tokio::select! {
                biased;

                result = &mut update => {
                    return match result {
                        Ok(mutation) => {
                            slot.apply(mutation, Certification::Certified);
                            Ok(())
                        }
                        Err(err) => {
                            warn!(
                                store = %name,
                                key = slot.key(),
                                "Certified read failed, keeping committed state: {}",
                                err
                            );
                            slot.apply(Mutation::identity(), Certification::Certified);
                            Err(err)
                        }
                    };
                }

                result = &mut query, if !query_done => {
                    query_done = true;
                    match result {
                        Ok(mutation) => slot.apply(mutation, Certification::Uncertified),
                        Err(err) => {
                            debug!(store = %name, key = slot.key(), "Uncertified read failed: {}", err);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    async fn respond(delay_ms: u64, value: u64) -> anyhow::Result<Mutation<u64>> {
        sleep(Duration::from_millis(delay_ms)).await;
        Ok(Mutation::set(value))
    }

    async fn fail(delay_ms: u64) -> anyhow::Result<Mutation<u64>> {
        sleep(Duration::from_millis(delay_ms)).await;
        Err(anyhow!("replica unavailable"))
    }

    fn observe(store: &ReconciledStore<u64>) -> (Arc<Mutex<Vec<u64>>>, crate::Subscription<u64>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = store.subscribe(move |value: &u64| sink.lock().push(*value));
        (seen, subscription)
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_then_update() {
        let store = ReconciledStore::new("balance", 0u64);
        let (seen, _subscription) = observe(&store);

        query_and_update(&store, respond(10, 5), respond(100, 6))
            .await
            .unwrap();

        assert_eq!(*seen.lock(), vec![0, 5, 6]);
        assert_eq!(store.base(), 6);
        assert!(store.is_settled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_before_query_ignores_query() {
        let store = ReconciledStore::new("balance", 0u64);
        let (seen, _subscription) = observe(&store);

        query_and_update(&store, respond(100, 5), respond(10, 6))
            .await
            .unwrap();

        assert_eq!(*seen.lock(), vec![0, 6]);
        assert_eq!(store.base(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_update_keeps_committed_state() {
        let store = ReconciledStore::new("balance", 3u64);

        let result = query_and_update(&store, respond(10, 5), fail(100)).await;

        assert!(result.is_err());
        assert_eq!(store.base(), 3);
        assert_eq!(store.get(), 3);
        assert!(store.is_settled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_query_still_commits_update() {
        let store = ReconciledStore::new("balance", 0u64);
        query_and_update(&store, fail(5), respond(20, 9)).await.unwrap();
        assert_eq!(store.base(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_cycles_commit_in_reservation_order() {
        let store = ReconciledStore::new("balance", 0u64);
        let (seen, _subscription) = observe(&store);

        // The second cycle's certified read lands first
        let first = query_and_update(&store, respond(5, 1), respond(200, 2));
        let second = query_and_update(&store, respond(10, 3), respond(50, 4));
        let (a, b) = tokio::join!(first, second);
        a.unwrap();
        b.unwrap();

        // The later-reserved slot's value still wins, but only after slot one commits
        assert_eq!(store.base(), 4);
        assert_eq!(*seen.lock(), vec![0, 1, 3, 4, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slots_follow_call_order_not_poll_order() {
        let store = ReconciledStore::new("balance", 0u64);

        let first = query_and_update(&store, respond(500, 10), respond(50, 1));
        let second = query_and_update(&store, respond(500, 20), respond(10, 2));
        assert_eq!(store.pending_len(), 2);

        // Poll the later call first; its certified value still waits for the earlier slot
        let (b, a) = tokio::join!(second, first);
        a.unwrap();
        b.unwrap();

        assert_eq!(store.base(), 2);
        assert!(store.is_settled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_cycle_releases_slot() {
        let store = ReconciledStore::new("balance", 0u64);

        let abandoned = query_and_update(&store, respond(5, 1), respond(10, 2));
        drop(abandoned);

        query_and_update(&store, respond(5, 3), respond(10, 4))
            .await
            .unwrap();
        assert_eq!(store.base(), 4);
        assert!(store.is_settled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_spawned_cycles_on_worker_threads() {
        let store = ReconciledStore::new("balance", 0u64);
        let last = Arc::new(Mutex::new(0u64));
        let sink = Arc::clone(&last);
        let _subscription = store.subscribe(move |value: &u64| *sink.lock() = *value);

        let tasks: Vec<_> = (1..=32u64)
            .map(|n| tokio::spawn(query_and_update(&store, respond(n % 3, n * 10), respond(n % 5, n))))
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // Slots were reserved in call order, so the last call's value wins
        assert_eq!(store.base(), 32);
        assert!(store.is_settled());
        assert_eq!(*last.lock(), store.get());
    }
}
