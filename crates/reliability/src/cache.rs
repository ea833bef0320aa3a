//! Key→(value, expiry) store with lazy eviction.
//!
//! This models "the pending retry set for one sweep pass", not a
//! general-purpose cache: no capacity bound, no eviction beyond TTL, and
//! expired entries are removed opportunistically on access or insertion
//! rather than by a background reaper.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// TTL cache with a fixed per-instance time-to-live.
///
/// Exclusively owned by one consumer (methods take `&mut self`); a sweep
/// run never shares its failure cache.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, Entry<V>>,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Insert a value, stamping `expires_at = now + ttl`.
    ///
    /// Also sweeps all expired entries. O(n) per insert, acceptable because
    /// the cache is bounded to per-sweep-run failure counts.
    pub fn set(&mut self, key: K, value: V) {
        let now = Utc::now();
        self.sweep_expired(now);
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Insert a value with an explicit absolute expiry.
    ///
    /// Seam for deterministic expiry tests; production callers use `set`.
    pub fn set_with_expiry(&mut self, key: K, value: V, expires_at: DateTime<Utc>) {
        self.entries.insert(key, Entry { value, expires_at });
    }

    /// Fetch a live value. An expired entry is removed and reported absent.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = Utc::now();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.expires_at <= now,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| &e.value)
    }

    pub fn has(&mut self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Remove an entry, reporting whether it was present (expired or not).
    pub fn delete(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Number of entries in the backing store.
    ///
    /// May count expired entries that no access has evicted yet.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over live entries, evicting expired ones first.
    pub fn entries(&mut self) -> impl Iterator<Item = (&K, &V)> {
        self.sweep_expired(Utc::now());
        self.entries.iter().map(|(k, e)| (k, &e.value))
    }

    /// Drain live entries out of the cache, evicting expired ones first.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        self.sweep_expired(Utc::now());
        self.entries.drain().map(|(k, e)| (k, e.value)).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn sweep_expired(&mut self, now: DateTime<Utc>) {
        self.entries.retain(|_, e| e.expires_at > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> TtlCache<String, u32> {
        TtlCache::new(Duration::hours(2))
    }

    #[test]
    fn set_then_get_within_ttl() {
        let mut cache = cache();
        cache.set("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(&1));
        assert!(cache.has(&"a".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_get_removes_the_entry() {
        let mut cache = cache();
        cache.set_with_expiry("a".to_string(), 1, Utc::now() - Duration::seconds(1));
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn set_sweeps_expired_entries() {
        let mut cache = cache();
        cache.set_with_expiry("old".to_string(), 1, Utc::now() - Duration::seconds(1));
        cache.set("new".to_string(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"new".to_string()), Some(&2));
    }

    #[test]
    fn delete_reports_presence() {
        let mut cache = cache();
        cache.set("a".to_string(), 1);
        assert!(cache.delete(&"a".to_string()));
        assert!(!cache.delete(&"a".to_string()));
    }

    #[test]
    fn entries_yields_only_live_values() {
        let mut cache = cache();
        cache.set("live".to_string(), 1);
        cache.set_with_expiry("dead".to_string(), 2, Utc::now() - Duration::seconds(1));
        let mut seen: Vec<_> = cache.entries().map(|(k, v)| (k.clone(), *v)).collect();
        seen.sort();
        assert_eq!(seen, vec![("live".to_string(), 1)]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = cache();
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
