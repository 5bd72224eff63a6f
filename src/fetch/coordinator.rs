//! Single-Flight Fetch Coordinator
//!
//! Composes the TTL cache with get-or-fetch semantics: concurrent callers
//! requesting the same key while a fetch is in flight share one remote
//! call and one outcome.

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::debug;

use crate::cache::{CacheStats, TtlCache, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};
use crate::keys::{invalidation_patterns, Mutation};

/// Channel capacity for the per-key outcome broadcast. Exactly one
/// message is ever sent per channel.
const OUTCOME_CHANNEL_CAPACITY: usize = 1;

// == Caller Role ==
/// What a cache-missing caller does next: lead the fetch or wait on the
/// leader's broadcast.
enum Role<T> {
    Lead,
    Wait(broadcast::Receiver<Result<T>>),
}

// == Fetch Coordinator ==
/// Cache-aside coordinator with request deduplication.
///
/// Invariant: at most one in-flight fetch exists per key. The first
/// cache-missing caller becomes the leader and runs the fetcher; callers
/// arriving before the leader settles subscribe to its outcome instead of
/// fetching again. Failures are propagated to every waiter and never
/// cached.
#[derive(Debug)]
pub struct FetchCoordinator<T> {
    /// In-flight fetches keyed by cache key.
    ///
    /// Lock order: `pending` before `cache` whenever both are held.
    pending: Mutex<HashMap<String, broadcast::Sender<Result<T>>>>,
    /// Backing TTL cache
    cache: RwLock<TtlCache<T>>,
}

impl<T: Clone> FetchCoordinator<T> {
    // == Constructor ==
    /// Creates a coordinator over a fresh cache with the given capacity
    /// and default TTL in milliseconds.
    pub fn new(max_entries: usize, default_ttl_ms: u64) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            cache: RwLock::new(TtlCache::new(max_entries, default_ttl_ms)),
        }
    }

    /// Creates a coordinator from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.max_entries, config.default_ttl_ms)
    }

    // == Get Or Fetch ==
    /// Returns the cached value for `key`, or fetches it exactly once
    /// across all concurrent callers.
    ///
    /// On a cache hit the fetcher is not called. On a miss, the first
    /// caller invokes `fetcher`; on success the value is cached under
    /// `ttl_ms` (or the cache default) and every waiter resolves with a
    /// clone of it. On failure nothing is cached, the pending entry is
    /// removed so a later call can retry, and every waiter receives the
    /// same error.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetcher: F, ttl_ms: Option<u64>) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        let role = {
            let mut pending = self.pending.lock().await;
            {
                let mut cache = self.cache.write().await;
                if let Some(value) = cache.get(key) {
                    return Ok(value);
                }
            }
            match pending.get(key) {
                Some(sender) => Role::Wait(sender.subscribe()),
                None => {
                    let (sender, _) = broadcast::channel(OUTCOME_CHANNEL_CAPACITY);
                    pending.insert(key.to_string(), sender);
                    Role::Lead
                }
            }
        };

        match role {
            Role::Wait(mut receiver) => {
                debug!(key, "joining in-flight fetch");
                match receiver.recv().await {
                    Ok(outcome) => outcome,
                    // Sender dropped without settling, e.g. via clear()
                    Err(_) => Err(CacheError::Aborted(key.to_string())),
                }
            }
            Role::Lead => {
                debug!(key, "leading fetch");
                let outcome = fetcher().await;

                let sender = {
                    let mut pending = self.pending.lock().await;
                    if let Ok(value) = &outcome {
                        let mut cache = self.cache.write().await;
                        // Key length was validated above; set cannot fail
                        let _ = cache.set(key.to_string(), value.clone(), ttl_ms);
                    }
                    pending.remove(key)
                };

                // clear() may have dropped the channel while we fetched;
                // waiters were already rejected in that case.
                if let Some(sender) = sender {
                    let _ = sender.send(outcome.clone());
                }

                outcome
            }
        }
    }

    // == Cache Surface ==
    /// Probes the cache without fetching. Counts a hit or miss.
    pub async fn get(&self, key: &str) -> Option<T> {
        self.cache.write().await.get(key)
    }

    /// Stores a value directly, bypassing the fetch path.
    pub async fn set(&self, key: String, value: T, ttl_ms: Option<u64>) -> Result<()> {
        self.cache.write().await.set(key, value, ttl_ms)
    }

    /// Removes one cached entry; returns whether it existed.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.cache.write().await.invalidate(key)
    }

    /// Removes every cached entry whose key matches the regex pattern.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        self.cache.write().await.invalidate_pattern(pattern)
    }

    /// Applies the standard invalidation templates for a mutation on an
    /// entity type, plus its related entity types. Returns the total
    /// number of entries removed.
    pub async fn invalidate_for(
        &self,
        entity: &str,
        mutation: &Mutation,
        related: &[&str],
    ) -> Result<usize> {
        let mut removed = 0;
        let mut cache = self.cache.write().await;
        for pattern in invalidation_patterns(entity, mutation, related) {
            removed += cache.invalidate_pattern(&pattern)?;
        }
        Ok(removed)
    }

    /// Empties the cache and drops all pending single-flight channels.
    ///
    /// Waiters on dropped channels observe [`CacheError::Aborted`];
    /// leaders finish their fetch but no longer populate waiters.
    pub async fn clear(&self) {
        let mut pending = self.pending.lock().await;
        pending.clear();
        self.cache.write().await.clear();
    }

    /// Sweeps expired entries; returns the number removed.
    pub async fn cleanup_expired(&self) -> usize {
        self.cache.write().await.cleanup_expired()
    }

    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    /// Resets hit/miss/eviction counters.
    pub async fn reset_stats(&self) {
        self.cache.write().await.reset_stats()
    }

    /// Returns true if the key is cached and not expired.
    pub async fn has(&self, key: &str) -> bool {
        self.cache.read().await.has(key)
    }

    /// Returns all cached keys.
    pub async fn keys(&self) -> Vec<String> {
        self.cache.read().await.keys()
    }

    /// Returns the current number of cached entries.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Returns true if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_hit_skips_fetcher() {
        let coord: FetchCoordinator<String> = FetchCoordinator::new(100, 300_000);
        coord.set("k".to_string(), "cached".to_string(), None).await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let value = coord
            .get_or_fetch(
                "k",
                || async move {
                    calls_clone.fetch_add(1, Ordering::SeqCst);
                    Ok("fetched".to_string())
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(value, "cached");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_miss_fetches_and_populates() {
        let coord: FetchCoordinator<String> = FetchCoordinator::new(100, 300_000);

        let value = coord
            .get_or_fetch("k", || async { Ok("fetched".to_string()) }, None)
            .await
            .unwrap();

        assert_eq!(value, "fetched");
        assert!(coord.has("k").await);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let coord: Arc<FetchCoordinator<String>> = Arc::new(FetchCoordinator::new(100, 300_000));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let coord = coord.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                coord
                    .get_or_fetch(
                        "shared",
                        move || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok("value".to_string())
                        },
                        None,
                    )
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "value");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_not_cached() {
        let coord: Arc<FetchCoordinator<String>> = Arc::new(FetchCoordinator::new(100, 300_000));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let coord = coord.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                coord
                    .get_or_fetch(
                        "bad",
                        move || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(30)).await;
                            Err::<String, _>(CacheError::Fetch("boom".to_string()))
                        },
                        None,
                    )
                    .await
            }));
        }

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert_eq!(err, CacheError::Fetch("boom".to_string()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!coord.has("bad").await);

        // Pending entry was cleaned up, so a later call retries
        let value = coord
            .get_or_fetch("bad", || async { Ok("recovered".to_string()) }, None)
            .await
            .unwrap();
        assert_eq!(value, "recovered");
    }

    #[tokio::test]
    async fn test_clear_aborts_waiters() {
        let coord: Arc<FetchCoordinator<String>> = Arc::new(FetchCoordinator::new(100, 300_000));

        let leader = {
            let coord = coord.clone();
            tokio::spawn(async move {
                coord
                    .get_or_fetch(
                        "slow",
                        || async {
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Ok("late".to_string())
                        },
                        None,
                    )
                    .await
            })
        };

        // Let the leader register its pending entry, then join as waiter
        tokio::time::sleep(Duration::from_millis(20)).await;
        let waiter = {
            let coord = coord.clone();
            tokio::spawn(async move {
                coord
                    .get_or_fetch("slow", || async { Ok("other".to_string()) }, None)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        coord.clear().await;

        let err = waiter.await.unwrap().unwrap_err();
        assert_eq!(err, CacheError::Aborted("slow".to_string()));

        // The leader itself still gets its own result
        assert_eq!(leader.await.unwrap().unwrap(), "late");
    }

    #[tokio::test]
    async fn test_oversized_key_rejected() {
        let coord: FetchCoordinator<String> = FetchCoordinator::new(100, 300_000);
        let key = "x".repeat(MAX_KEY_LENGTH + 1);

        let result = coord
            .get_or_fetch(&key, || async { Ok("v".to_string()) }, None)
            .await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_invalidate_for_update() {
        let coord: FetchCoordinator<String> = FetchCoordinator::new(100, 300_000);
        coord.set("ingredients:list".to_string(), "a".to_string(), None).await.unwrap();
        coord.set("ingredients:detail:7".to_string(), "b".to_string(), None).await.unwrap();
        coord.set("ingredients:detail:8".to_string(), "c".to_string(), None).await.unwrap();
        coord.set("references:list".to_string(), "d".to_string(), None).await.unwrap();

        let removed = coord
            .invalidate_for(
                "ingredients",
                &Mutation::Update { id: "7".to_string() },
                &["references"],
            )
            .await
            .unwrap();

        assert_eq!(removed, 3);
        assert!(coord.has("ingredients:detail:8").await);
        assert!(!coord.has("ingredients:detail:7").await);
        assert!(!coord.has("ingredients:list").await);
        assert!(!coord.has("references:list").await);
    }
}
