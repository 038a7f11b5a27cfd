//!
//! # TTL cache
//!
//! A keyed cache whose entries expire a fixed duration after they were inserted.
//! Reads and writes go through an async `RwLock`; the lock is never held while a
//! loader runs, so two concurrent misses on the same key may both load and the last
//! writer wins.
//!
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};

use async_lock::RwLock;
use tracing::trace;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// value for `key` if present and not expired
    pub async fn get(&self, key: &K) -> Option<V> {
        let read = self.entries.read().await;
        let entry = read.get(key)?;
        if entry.is_expired(Instant::now()) {
            trace!(?key, "expired");
            None
        } else {
            Some(entry.value.clone())
        }
    }

    /// insert or replace `key`, restarting its expiry
    pub async fn insert(&self, key: K, value: V) {
        let now = Instant::now();
        let mut write = self.entries.write().await;
        write.retain(|_, entry| !entry.is_expired(now));
        write.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    pub async fn remove(&self, key: &K) -> Option<V> {
        let mut write = self.entries.write().await;
        write.remove(key).map(|entry| entry.value)
    }

    /// number of entries, expired ones included until purged
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// drop every expired entry, returning how many were dropped
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut write = self.entries.write().await;
        let before = write.len();
        write.retain(|_, entry| !entry.is_expired(now));
        before - write.len()
    }

    /// Return the cached value for `key`, or run `loader` and cache its output.
    /// Loader errors are returned as-is and nothing is cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            trace!(?key, "cache hit");
            return Ok(value);
        }

        trace!(?key, "cache miss");
        let value = loader().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }
}
