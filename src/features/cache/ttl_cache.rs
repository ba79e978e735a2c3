//! In-process key/value cache with per-entry time-to-live.
//!
//! Expiry is lazy: an expired entry is dropped when it is read, or by
//! [`TtlCache::purge_expired`] which the server runs on an interval. There is
//! no size bound and no LRU/LFU eviction.
//!
//! Every invalidation bumps a generation counter. `get_or_set` only stores a
//! loaded value if no invalidation happened while the loader ran, so a write
//! followed by `delete` can't be undone by a slower reader.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;

use crate::utils::{duration::deadline_after, logging::log_cache_event};

struct CacheEntry<V> {
    data: V,
    expires: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

pub struct TtlCache<V> {
    name: &'static str,
    entries: DashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    generation: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(name: &'static str, default_ttl: Duration) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            generation: AtomicU64::new(0),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();

        // The shard guard from `get` must be gone before `remove_if`.
        let expired = match self.entries.get(key) {
            Some(entry) if now < entry.expires => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                log_cache_event(self.name, key, "hit");
                return Some(entry.data.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove_if(key, |_, entry| entry.expires <= now);
            log_cache_event(self.name, key, "expired");
        } else {
            log_cache_event(self.name, key, "miss");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                data: value,
                expires: expiry(ttl),
            },
        );
    }

    /// Returns the cached value, or runs `loader` and caches its `Ok` result.
    /// Errors are passed through and never cached.
    pub async fn get_or_set<F, Fut, E>(&self, key: &str, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.get_or_set_with_ttl(key, self.default_ttl, loader).await
    }

    pub async fn get_or_set_with_ttl<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let seen = self.generation.load(Ordering::SeqCst);
        let value = loader().await?;

        // Checked under the shard lock. Invalidations bump before they lock.
        let entry = self.entries.entry(key.to_string());
        if self.generation.load(Ordering::SeqCst) == seen {
            entry.insert(CacheEntry {
                data: value.clone(),
                expires: expiry(ttl),
            });
        } else {
            drop(entry);
            log_cache_event(self.name, key, "stale_load_discarded");
        }
        Ok(value)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.invalidate();
        self.entries.remove(key).is_some()
    }

    /// Drops every key starting with `prefix`.
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        self.invalidate();
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let keep = !key.starts_with(prefix);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn clear(&self) {
        self.invalidate();
        self.entries.clear();
    }

    fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = now < entry.expires;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Includes entries that have expired but not been read or purged yet.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

fn expiry(ttl: Duration) -> Instant {
    deadline_after(Instant::now(), ttl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::advance;

    fn cache() -> TtlCache<String> {
        TtlCache::new("test", Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_lazily_on_read() {
        let cache = cache();
        cache.set("greeting", "hello".to_string());
        assert_eq!(cache.get("greeting").as_deref(), Some("hello"));

        advance(Duration::from_secs(9)).await;
        assert!(cache.get("greeting").is_some());

        advance(Duration::from_secs(1)).await;
        assert_eq!(cache.len(), 1);
        assert!(cache.get("greeting").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn per_entry_ttl_overrides_default() {
        let cache = cache();
        cache.set_with_ttl("short", "a".to_string(), Duration::from_secs(1));
        cache.set("long", "b".to_string());

        advance(Duration::from_secs(2)).await;
        assert!(cache.get("short").is_none());
        assert!(cache.get("long").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn get_or_set_loads_once_until_expiry() {
        let cache = cache();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let load = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>("loaded".to_string())
        };

        assert_eq!(cache.get_or_set("k", load).await.unwrap(), "loaded");
        assert_eq!(cache.get_or_set("k", load).await.unwrap(), "loaded");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        advance(Duration::from_secs(11)).await;
        cache.get_or_set("k", load).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn get_or_set_does_not_cache_errors() {
        let cache = cache();
        let result = cache
            .get_or_set("k", || async { Err::<String, _>("db down") })
            .await;
        assert_eq!(result, Err("db down"));
        assert!(cache.is_empty());

        let value = cache
            .get_or_set("k", || async { Ok::<_, &str>("recovered".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "recovered");
    }

    #[tokio::test]
    async fn invalidation_during_load_discards_the_loaded_value() {
        let cache = cache();
        let value = cache
            .get_or_set("k", || async {
                // A writer commits and invalidates while the loader holds a stale read.
                cache.delete("k");
                Ok::<_, ()>("stale".to_string())
            })
            .await
            .unwrap();
        assert_eq!(value, "stale");
        assert!(cache.get("k").is_none());

        let value = cache
            .get_or_set("k", || async { Ok::<_, ()>("fresh".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "fresh");
        assert_eq!(cache.get("k").as_deref(), Some("fresh"));
    }

    #[tokio::test(start_paused = true)]
    async fn huge_ttl_does_not_overflow() {
        let cache = cache();
        cache.set_with_ttl("k", "v".to_string(), Duration::MAX);
        advance(Duration::from_secs(3600)).await;
        assert!(cache.get("k").is_some());
    }

    #[tokio::test]
    async fn delete_prefix_and_clear() {
        let cache = cache();
        cache.set("org:1", "a".to_string());
        cache.set("org:2", "b".to_string());
        cache.set("connections:1", "c".to_string());

        assert!(cache.delete("org:2"));
        assert!(!cache.delete("org:2"));
        assert_eq!(cache.delete_prefix("org:"), 1);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_removes_only_expired_and_stats_track_lookups() {
        let cache = cache();
        cache.set_with_ttl("old", "x".to_string(), Duration::from_secs(1));
        cache.set("fresh", "y".to_string());
        advance(Duration::from_secs(5)).await;

        assert_eq!(cache.purge_expired(), 1);
        cache.get("fresh");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats, CacheStats { entries: 1, hits: 1, misses: 1 });
    }
}
