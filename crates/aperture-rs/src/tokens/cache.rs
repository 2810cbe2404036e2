//! Token count caching.
//!
//! Counting the same content twice is pure waste: conversations are recounted
//! on every turn but most messages never change. Counts are memoized by
//! `(model_id, content_hash)`. The same key always produces the same value,
//! so concurrent fills race harmlessly; the loser just recomputes.
//!
//! There is no eviction: entries are a `usize` each and counting runs in
//! bounded agent sessions. [`CountCache::clear`] exists for tests and for
//! callers that outlive a session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Concurrency-safe count cache keyed by `(model_id, content_hash)`.
#[derive(Debug, Default)]
pub struct CountCache {
    entries: RwLock<HashMap<(String, u64), usize>>,
    /// Hits counter for diagnostics.
    hits: AtomicU64,
    /// Misses counter for diagnostics.
    misses: AtomicU64,
}

impl CountCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached count. Returns `Some(count)` on cache hit.
    pub fn get(&self, model_id: &str, text: &str) -> Option<usize> {
        let key = (model_id.to_string(), hash_content(text));
        match self.entries.read().get(&key) {
            Some(count) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(*count)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a count.
    pub fn put(&self, model_id: &str, text: &str, count: usize) {
        let key = (model_id.to_string(), hash_content(text));
        self.entries.write().insert(key, count);
    }

    /// Drop all entries. Hit/miss counters are reset too.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Number of cached counts.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Cache hit count.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Cache miss count.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Hit rate as a fraction (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Hash message content for the cache key. Uses a simple FNV-1a hash.
fn hash_content(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in text.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_put_and_get() {
        let cache = CountCache::new();
        cache.put("claude-sonnet-4", "hello world", 3);

        assert_eq!(cache.get("claude-sonnet-4", "hello world"), Some(3));
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn cache_miss() {
        let cache = CountCache::new();
        assert_eq!(cache.get("claude-sonnet-4", "never stored"), None);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn model_id_is_part_of_the_key() {
        let cache = CountCache::new();
        cache.put("claude-sonnet-4", "same text", 3);
        assert_eq!(cache.get("gpt-4o", "same text"), None);
    }

    #[test]
    fn clear_resets_entries_and_counters() {
        let cache = CountCache::new();
        cache.put("m", "a", 1);
        cache.get("m", "a");
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 0);
    }

    #[test]
    fn hit_rate_computation() {
        let cache = CountCache::new();
        cache.put("m", "a", 1);
        cache.get("m", "a"); // hit
        cache.get("m", "b"); // miss
        assert!((cache.hit_rate() - 0.5).abs() < 0.01);
    }

    #[test]
    fn hash_deterministic() {
        let h1 = hash_content("the same content");
        let h2 = hash_content("the same content");
        assert_eq!(h1, h2);
    }

    #[test]
    fn hash_different_inputs_differ() {
        assert_ne!(hash_content("alpha"), hash_content("beta"));
    }
}
