//! Generic TTL cache with LRU eviction.

use derive_getters::Getters;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Cache entry with value and expiration.
#[derive(Debug, Clone, Getters)]
pub struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// Check if this entry is expired.
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    /// Get remaining time until expiration.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.ttl.checked_sub(self.created_at.elapsed())
    }
}

/// Bounded map whose entries expire after a per-entry TTL.
///
/// When full, the least recently used entry is evicted to make room.
///
/// # Example
///
/// ```
/// use modwatch_cache::TtlCache;
/// use std::time::Duration;
///
/// let mut cache = TtlCache::new(100);
/// cache.insert("sodium", 42, Duration::from_secs(60));
/// assert_eq!(cache.get(&"sodium"), Some(42));
/// ```
#[derive(Debug)]
pub struct TtlCache<K, V> {
    max_size: usize,
    entries: HashMap<K, CacheEntry<V>>,
    access_order: VecDeque<K>,
}

impl<K, V> TtlCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Create an empty cache holding at most `max_size` entries.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
            entries: HashMap::new(),
            access_order: VecDeque::new(),
        }
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: K, value: V, ttl: Duration) {
        if self.entries.len() >= self.max_size && !self.entries.contains_key(&key) {
            self.evict_lru();
        }

        self.touch(&key);
        self.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Get a live value, dropping it if it has expired.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.is_expired() {
            tracing::debug!(ttl = ?entry.ttl, "Cache entry expired, removing");
            self.remove(key);
            return None;
        }

        let value = entry.value.clone();
        self.touch(key);
        Some(value)
    }

    /// Remove one entry.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
        self.entries.remove(key).map(|e| e.value)
    }

    /// Remove expired entries from cache.
    pub fn purge_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let entries = &self.entries;
        self.access_order.retain(|k| entries.contains_key(k));
        before - self.entries.len()
    }

    /// Clear all cache entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.access_order.clear();
    }

    /// Get number of cached entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, key: &K) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
        self.access_order.push_back(key.clone());
    }

    fn evict_lru(&mut self) {
        if let Some(key) = self.access_order.pop_front() {
            tracing::debug!("Evicting LRU entry");
            self.entries.remove(&key);
        }
    }
}
