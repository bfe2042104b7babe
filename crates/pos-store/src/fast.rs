//! The fast cache: a synchronous, quota-limited map of serialized values.
//!
//! Usage is the byte length of every key plus its serialized value. A write
//! that would push usage past the quota is rejected and leaves the previous
//! value in place.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{Result, StoreError};

/// Default fast cache quota (5 MiB).
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, String>,
    used: usize,
}

impl Inner {
    fn footprint(&self, key: &str) -> usize {
        self.entries.get(key).map_or(0, |v| key.len() + v.len())
    }
}

/// In-process key → JSON text map with a byte quota.
#[derive(Debug)]
pub struct FastCache {
    inner: RwLock<Inner>,
    quota: usize,
}

impl FastCache {
    /// Create an empty cache with the given quota in bytes.
    #[must_use]
    pub fn new(quota: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            quota,
        }
    }

    /// Serialized value for `key`.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.inner.read().entries.get(key).cloned()
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().entries.contains_key(key)
    }

    /// Store a serialized value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::QuotaExceeded`] if the write does not fit; the
    /// cache is unchanged.
    pub fn set_raw(&self, key: &str, text: String) -> Result<()> {
        let mut inner = self.inner.write();
        let needed = key.len() + text.len();
        let available = self.quota - (inner.used - inner.footprint(key));
        if needed > available {
            return Err(StoreError::QuotaExceeded {
                key: key.to_string(),
                needed,
                available,
            });
        }

        inner.used = inner.used - inner.footprint(key) + needed;
        inner.entries.insert(key.to_string(), text);
        Ok(())
    }

    /// Store several serialized values, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::QuotaExceeded`] if the writes together do not
    /// fit; the cache is unchanged.
    pub fn set_many_raw(&self, items: Vec<(String, String)>) -> Result<()> {
        let mut inner = self.inner.write();

        // Later duplicates of a key replace earlier ones.
        let mut pending: HashMap<String, String> = HashMap::with_capacity(items.len());
        for (key, text) in items {
            pending.insert(key, text);
        }

        let freed: usize = pending.keys().map(|key| inner.footprint(key)).sum();
        let needed: usize = pending.iter().map(|(k, v)| k.len() + v.len()).sum();
        let available = self.quota - (inner.used - freed);
        if needed > available {
            let key = pending.keys().next().cloned().unwrap_or_default();
            return Err(StoreError::QuotaExceeded {
                key,
                needed,
                available,
            });
        }

        inner.used = inner.used - freed + needed;
        inner.entries.extend(pending);
        Ok(())
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        let mut inner = self.inner.write();
        let freed = inner.footprint(key);
        inner.used -= freed;
        inner.entries.remove(key).is_some()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.used = 0;
    }

    /// All keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.read().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Bytes in use.
    #[must_use]
    pub fn usage(&self) -> usize {
        self.inner.read().used
    }

    /// Quota in bytes.
    #[must_use]
    pub fn quota(&self) -> usize {
        self.quota
    }
}

impl Default for FastCache {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTA_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_tracks_keys_and_values() {
        let cache = FastCache::new(100);
        cache.set_raw("ab", "1234".into()).unwrap();
        assert_eq!(cache.usage(), 6);

        cache.set_raw("ab", "12".into()).unwrap();
        assert_eq!(cache.usage(), 4);

        assert!(cache.remove("ab"));
        assert!(!cache.remove("ab"));
        assert_eq!(cache.usage(), 0);
    }

    #[test]
    fn over_quota_keeps_previous_value() {
        let cache = FastCache::new(10);
        cache.set_raw("k", "old".into()).unwrap();

        let err = cache.set_raw("k", "x".repeat(20)).unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { needed: 21, .. }));
        assert_eq!(cache.get_raw("k").as_deref(), Some("old"));
    }

    #[test]
    fn replacing_counts_freed_space() {
        let cache = FastCache::new(10);
        cache.set_raw("k", "12345678".into()).unwrap();
        // 9 bytes used; replacing with 9 bytes must fit.
        cache.set_raw("k", "abcdefgh".into()).unwrap();
    }

    #[test]
    fn set_many_is_all_or_nothing() {
        let cache = FastCache::new(12);
        cache.set_raw("a", "1".into()).unwrap();

        let err = cache
            .set_many_raw(vec![("b".into(), "2".into()), ("c".into(), "x".repeat(20))])
            .unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        assert!(!cache.contains("b"));

        cache
            .set_many_raw(vec![("b".into(), "2".into()), ("a".into(), "3".into())])
            .unwrap();
        assert_eq!(cache.keys(), ["a", "b"]);
        assert_eq!(cache.usage(), 4);
    }

    #[test]
    fn clear_resets_usage() {
        let cache = FastCache::default();
        cache.set_raw("a", "1".into()).unwrap();
        cache.clear();
        assert_eq!(cache.usage(), 0);
        assert!(cache.keys().is_empty());
        assert_eq!(cache.quota(), DEFAULT_QUOTA_BYTES);
    }
}
