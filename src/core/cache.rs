//! TTL cache for search results.
//!
//! Keys are derived from a normalized query plus the requested result count,
//! so trivially different spellings of the same query share an entry.
//! Expired entries are evicted lazily on read.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

struct CacheEntry {
    value: Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) >= self.ttl
    }
}

/// In-memory result cache with per-entry TTL
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
}

impl ResultCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Cache key for a query/count pair.
    ///
    /// The query is trimmed, lowercased, and whitespace-collapsed before
    /// hashing so formatting differences do not fragment the cache.
    pub fn key_for(query: &str, count: usize) -> String {
        let normalized = query
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hasher.update(count.to_le_bytes());
        hex::encode(hasher.finalize())
    }

    /// Look up an entry, evicting it if expired
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                debug!(key, "cache entry expired");
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Store an entry with the default TTL
    pub fn put(&self, key: &str, value: Value) {
        self.put_with_ttl(key, value, self.default_ttl);
    }

    /// Store an entry with an explicit TTL
    pub fn put_with_ttl(&self, key: &str, value: Value, ttl: Duration) {
        let mut entries = self.lock();
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.lock().clear();
        debug!("result cache cleared");
    }

    /// Number of live entries (expired entries still counted until read)
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        match self.entries.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_normalization() {
        let a = ResultCache::key_for("Fitness Coaching  App", 10);
        let b = ResultCache::key_for("  fitness coaching app ", 10);
        assert_eq!(a, b);

        let c = ResultCache::key_for("fitness coaching app", 5);
        assert_ne!(a, c);
    }

    #[test]
    fn test_put_get_roundtrip() {
        let cache = ResultCache::new(Duration::from_secs(3600));
        let key = ResultCache::key_for("fitness market", 10);
        assert!(cache.get(&key).is_none());

        cache.put(&key, json!({"results": [{"url": "https://a.example"}]}));
        let hit = cache.get(&key).unwrap();
        assert_eq!(hit["results"][0]["url"], "https://a.example");
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let cache = ResultCache::new(Duration::from_secs(3600));
        let key = ResultCache::key_for("fitness market", 10);
        cache.put_with_ttl(&key, json!({"results": []}), Duration::from_secs(0));

        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = ResultCache::new(Duration::from_secs(3600));
        cache.put(&ResultCache::key_for("a", 1), json!(1));
        cache.put(&ResultCache::key_for("b", 1), json!(2));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
