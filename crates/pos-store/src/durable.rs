//! The durable backend: the asynchronous, authoritative side of the store.
//!
//! Every write the store accepts is eventually mirrored here by the
//! [`DurableWriter`](crate::writer::DurableWriter). On startup the store
//! copies everything back into the fast cache.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StoreError};

/// A key, its JSON value and the unix-millis time of the write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Store key.
    pub key: String,
    /// JSON value.
    pub value: Value,
    /// Write time in unix milliseconds.
    pub timestamp: i64,
}

impl Entry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn now(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Storage operations of the durable backend.
///
/// Implementations are called from the writer thread and from blocking
/// tasks, never from async code directly.
pub trait DurableBackend: Send + Sync {
    /// Insert or replace one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put(&self, entry: &Entry) -> Result<()>;

    /// Insert or replace several entries atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; no entry is written.
    fn put_batch(&self, entries: &[Entry]) -> Result<()>;

    /// Get one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get(&self, key: &str) -> Result<Option<Entry>>;

    /// Delete one entry. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete(&self, key: &str) -> Result<()>;

    /// Delete every entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn clear(&self) -> Result<()>;

    /// Every entry, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn entries(&self) -> Result<Vec<Entry>>;

    /// Approximate bytes used on disk, if the backend can tell.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn size_estimate(&self) -> Result<Option<u64>>;
}

// ============================================================================
// In-memory backend
// ============================================================================

/// A durable backend kept in memory.
///
/// Used for tests and ephemeral stores. [`set_failing`](Self::set_failing)
/// simulates an outage: while set, every operation fails.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, (Value, i64)>>,
    failing: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail (`true`) or succeed again (`false`).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of stored entries, ignoring the outage switch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the backend holds no entries, ignoring the outage switch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Database("backend unavailable".into()));
        }
        Ok(())
    }
}

impl DurableBackend for MemoryBackend {
    fn put(&self, entry: &Entry) -> Result<()> {
        self.check()?;
        self.entries
            .write()
            .insert(entry.key.clone(), (entry.value.clone(), entry.timestamp));
        Ok(())
    }

    fn put_batch(&self, entries: &[Entry]) -> Result<()> {
        self.check()?;
        let mut map = self.entries.write();
        for entry in entries {
            map.insert(entry.key.clone(), (entry.value.clone(), entry.timestamp));
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Entry>> {
        self.check()?;
        Ok(self.entries.read().get(key).map(|(value, timestamp)| Entry {
            key: key.to_string(),
            value: value.clone(),
            timestamp: *timestamp,
        }))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.check()?;
        self.entries.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.check()?;
        self.entries.write().clear();
        Ok(())
    }

    fn entries(&self) -> Result<Vec<Entry>> {
        self.check()?;
        Ok(self
            .entries
            .read()
            .iter()
            .map(|(key, (value, timestamp))| Entry {
                key: key.clone(),
                value: value.clone(),
                timestamp: *timestamp,
            })
            .collect())
    }

    fn size_estimate(&self) -> Result<Option<u64>> {
        self.check()?;
        let bytes: usize = self
            .entries
            .read()
            .iter()
            .map(|(key, (value, _))| key.len() + value.to_string().len())
            .sum();
        Ok(Some(bytes as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_crud() {
        let backend = MemoryBackend::new();

        backend.put(&Entry::now("a", json!(1))).unwrap();
        backend
            .put_batch(&[Entry::now("b", json!([1, 2])), Entry::now("c", json!({"x": 1}))])
            .unwrap();

        assert_eq!(backend.get("a").unwrap().unwrap().value, json!(1));
        let keys: Vec<String> = backend.entries().unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, ["a", "b", "c"]);

        backend.delete("b").unwrap();
        backend.delete("missing").unwrap();
        assert_eq!(backend.len(), 2);

        backend.clear().unwrap();
        assert!(backend.is_empty());
    }

    #[test]
    fn outage_fails_every_operation() {
        let backend = MemoryBackend::new();
        backend.put(&Entry::now("a", json!(1))).unwrap();
        backend.set_failing(true);

        assert!(backend.put(&Entry::now("b", json!(2))).is_err());
        assert!(backend.get("a").is_err());
        assert!(backend.entries().is_err());
        assert!(backend.size_estimate().is_err());

        backend.set_failing(false);
        assert_eq!(backend.len(), 1);
    }
}
