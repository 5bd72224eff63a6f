//! TTL Cache Module
//!
//! Main cache engine combining HashMap storage with insertion-order
//! tracking for FIFO eviction and TTL expiration.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, InsertionTracker, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

// == TTL Cache ==
/// Bounded, expiring key-value store with hit/miss statistics and
/// pattern-based bulk invalidation.
///
/// Eviction is FIFO by insertion order, not LRU: reads need no access
/// bookkeeping and eviction is O(1).
#[derive(Debug)]
pub struct TtlCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Insertion order tracker for FIFO eviction
    order: InsertionTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Default TTL in milliseconds for entries without explicit TTL
    default_ttl_ms: u64,
}

impl<V: Clone> TtlCache<V> {
    // == Constructor ==
    /// Creates a new TtlCache with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the cache can hold.
    ///   A capacity of zero makes every `set` a silent no-op.
    /// * `default_ttl_ms` - Default TTL in milliseconds for entries
    ///   without explicit TTL
    pub fn new(max_entries: usize, default_ttl_ms: u64) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl_ms,
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns None and counts a miss if the key is unknown or expired;
    /// expired entries are evicted as a side effect. Otherwise returns a
    /// clone of the value and counts a hit.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                self.entries.remove(key);
                self.order.remove(key);
                self.stats.set_total_entries(self.entries.len());
                self.stats.record_miss();
                return None;
            }

            let value = entry.value.clone();
            self.stats.record_hit();
            Some(value)
        } else {
            self.stats.record_miss();
            None
        }
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL in milliseconds.
    ///
    /// If the key already exists, the value is overwritten, the TTL is
    /// reset, and the key keeps its eviction position. If the cache is at
    /// capacity and the key is new, exactly one entry is evicted FIFO
    /// before inserting. With a capacity of zero the write is silently
    /// dropped.
    pub fn set(&mut self, key: String, value: V, ttl_ms: Option<u64>) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        // Degenerate capacity: nothing can be held
        if self.max_entries == 0 {
            return Ok(());
        }

        let is_overwrite = self.entries.contains_key(&key);

        // If not overwriting and at capacity, evict the oldest insertion
        if !is_overwrite && self.entries.len() >= self.max_entries {
            if let Some(evicted_key) = self.order.evict_oldest() {
                self.entries.remove(&evicted_key);
                self.stats.record_eviction();
                debug!(key = %evicted_key, "evicted oldest entry at capacity");
            }
        }

        let entry = CacheEntry::new(value, ttl_ms.unwrap_or(self.default_ttl_ms));
        self.entries.insert(key.clone(), entry);
        self.order.record(&key);
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Invalidate ==
    /// Removes one entry by key; returns whether it existed.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.order.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        existed
    }

    // == Invalidate Pattern ==
    /// Removes every entry whose key matches the regex pattern.
    ///
    /// Matching is an unanchored search over the key, so
    /// `"ingredients:.*"` removes `ingredients:list` and every
    /// `ingredients:detail:*` key. Returns the number of entries removed.
    pub fn invalidate_pattern(&mut self, pattern: &str) -> Result<usize> {
        let re = Regex::new(pattern)
            .map_err(|e| CacheError::InvalidPattern(format!("{}: {}", pattern, e)))?;

        let matched: Vec<String> = self
            .entries
            .keys()
            .filter(|key| re.is_match(key))
            .cloned()
            .collect();

        for key in &matched {
            self.entries.remove(key);
            self.order.remove(key);
        }

        self.stats.set_total_entries(self.entries.len());
        debug!(pattern, removed = matched.len(), "pattern invalidation");
        Ok(matched.len())
    }

    // == Clear ==
    /// Empties the cache. Statistics are kept; use `reset_stats` to zero them.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.stats.set_total_entries(0);
    }

    // == Cleanup Expired ==
    /// Proactively removes all expired entries.
    ///
    /// Not required for correctness since `get` self-heals; useful for
    /// periodic maintenance. Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.entries.remove(&key);
            self.order.remove(&key);
        }

        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Reset Stats ==
    /// Resets hit/miss/eviction counters to zero.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
        self.stats.set_total_entries(self.entries.len());
    }

    // == Has ==
    /// Returns true if the key is present and not expired.
    ///
    /// Does not count as an access and does not evict.
    pub fn has(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    // == Keys ==
    /// Returns all currently stored keys, including not-yet-swept expired ones.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
