//! Single-flight resolution cache.
//!
//! Concurrent requests for the same key share one in-flight fetch, whatever
//! its outcome; distinct keys proceed fully in parallel. Successful entries
//! live as long as the cache, so a resolver reuses descriptors across
//! `resolve` calls. Failed entries are dropped once the fetch settles.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

type Slot<V, E> = Arc<OnceCell<Result<V, E>>>;

#[derive(Debug)]
pub struct ResolutionCache<K, V, E> {
    entries: Mutex<HashMap<K, Slot<V, E>>>,
    hits: AtomicU64,
}

impl<K, V, E> Default for ResolutionCache<K, V, E> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
        }
    }
}

impl<K, V, E> ResolutionCache<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, or run `resolve` to produce it.
    ///
    /// Calls that are satisfied without running their own `resolve` count as
    /// hits, including calls that waited on another caller's in-flight fetch.
    /// Callers waiting on a failed fetch receive the same error; the next
    /// call after that fetches again.
    pub async fn get_or_resolve<F, Fut>(&self, key: &K, resolve: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(key);
        let mut fetched = false;
        let flag = &mut fetched;
        let outcome = slot
            .get_or_init(move || async move {
                *flag = true;
                resolve().await
            })
            .await
            .clone();

        match &outcome {
            Ok(_) if !fetched => {
                self.hits.fetch_add(1, Ordering::SeqCst);
            }
            Err(_) if fetched => self.evict(key, &slot),
            _ => {}
        }
        outcome
    }

    /// The cached value for `key`, without fetching or counting a hit.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.lock()
            .get(key)
            .and_then(|slot| slot.get())
            .and_then(|outcome| outcome.as_ref().ok().cloned())
    }

    /// Number of calls served from the cache so far.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }

    /// Number of keys holding a value.
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| matches!(slot.get(), Some(Ok(_))))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &K) -> Slot<V, E> {
        self.lock().entry(key.clone()).or_default().clone()
    }

    /// Drop a failed slot. Waiters already hold it and still read the error.
    fn evict(&self, key: &K, slot: &Slot<V, E>) {
        let mut entries = self.lock();
        if entries.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            entries.remove(key);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Slot<V, E>>> {
        // The map is only touched in short critical sections that cannot
        // panic, so a poisoned lock still holds a consistent map.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
