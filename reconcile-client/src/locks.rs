//! Per-entity lock registry.
//!
//! Mutations against one remote entity must not overlap; mutations against
//! different entities proceed in parallel. Each entity id maps to its own
//! async mutex, created on first use and kept for the lifetime of the
//! registry. Waiters are served in arrival order.

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// The caller gave up waiting for a lock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cancelled while waiting for the lock on {id}")]
pub struct LockCancelled {
    /// Entity id that was being waited on.
    pub id: String,
}

/// Exclusive hold on one entity id. Released on drop.
#[derive(Debug)]
pub struct EntityGuard {
    id: String,
    _guard: OwnedMutexGuard<()>,
}

impl EntityGuard {
    /// The id this guard holds.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for EntityGuard {
    fn drop(&mut self) {
        trace!(id = %self.id, "released entity lock");
    }
}

/// Registry of per-entity mutexes.
#[derive(Debug, Default)]
pub struct EntityLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl EntityLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to `id`.
    pub async fn acquire(&self, id: &str) -> EntityGuard {
        let slot = self.slot(id);
        let guard = slot.lock_owned().await;
        trace!(id, "acquired entity lock");
        EntityGuard {
            id: id.to_string(),
            _guard: guard,
        }
    }

    /// Wait for exclusive access to `id`, giving up if `cancel` fires.
    pub async fn acquire_cancellable(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<EntityGuard, LockCancelled> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LockCancelled { id: id.to_string() }),
            guard = self.acquire(id) => Ok(guard),
        }
    }

    /// Number of ids that have ever been locked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no id has been locked yet.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn entries_are_created_lazily() {
        let locks = EntityLocks::new();
        assert!(locks.is_empty());

        drop(locks.acquire("pipe_1").await);
        drop(locks.acquire("pipe_1").await);
        drop(locks.acquire("pipe_2").await);

        assert_eq!(locks.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_id_is_never_held_twice() {
        let locks = Arc::new(EntityLocks::new());
        let holders = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let locks = locks.clone();
                let holders = holders.clone();
                let max_seen = max_seen.clone();
                tokio::spawn(async move {
                    let _guard = locks.acquire("resource-1").await;
                    let now = holders.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    holders.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_id_runs_sequentially() {
        let locks = Arc::new(EntityLocks::new());
        let delay = Duration::from_millis(50);
        let started = Instant::now();

        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let locks = locks.clone();
                tokio::spawn(async move {
                    let _guard = locks.acquire("resource-1").await;
                    tokio::time::sleep(delay).await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(started.elapsed() >= delay * 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn distinct_ids_run_in_parallel() {
        let locks = Arc::new(EntityLocks::new());
        let delay = Duration::from_millis(100);
        let started = Instant::now();

        let tasks: Vec<_> = ["resource-1", "resource-2", "resource-3"]
            .into_iter()
            .map(|id| {
                let locks = locks.clone();
                tokio::spawn(async move {
                    let _guard = locks.acquire(id).await;
                    tokio::time::sleep(delay).await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        // Serialized execution would take at least 300ms.
        assert!(started.elapsed() < delay * 3);
    }

    #[tokio::test]
    async fn waiters_are_served_in_arrival_order() {
        let locks = Arc::new(EntityLocks::new());
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let held = locks.acquire("pipe_1").await;

        let mut tasks = Vec::new();
        for n in 0..3 {
            let locks = locks.clone();
            let order = order.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = locks.acquire("pipe_1").await;
                order.lock().unwrap().push(n);
            }));
            // Let the task enqueue before spawning the next one.
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        drop(held);
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn cancelled_wait_gives_up() {
        let locks = EntityLocks::new();
        let _held = locks.acquire("pipe_1").await;
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = locks.acquire_cancellable("pipe_1", &cancel).await.unwrap_err();

        assert_eq!(err.id, "pipe_1");
    }

    #[tokio::test]
    async fn guard_releases_on_drop() {
        let locks = EntityLocks::new();
        let guard = locks.acquire("pipe_1").await;
        assert_eq!(guard.id(), "pipe_1");
        drop(guard);

        let again = tokio::time::timeout(Duration::from_secs(1), locks.acquire("pipe_1")).await;
        assert!(again.is_ok());
    }
}
