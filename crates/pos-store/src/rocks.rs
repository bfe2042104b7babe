//! `RocksDB` durable backend.
//!
//! This module provides the `RocksBackend` implementation of the
//! `DurableBackend` trait.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::durable::{DurableBackend, Entry};
use crate::error::{Result, StoreError};
use crate::schema::{all_column_families, cf};

/// On-disk form of an entry's value.
#[derive(Serialize, Deserialize)]
struct StoredValue {
    value: Value,
    timestamp: i64,
}

/// RocksDB-backed durable backend.
pub struct RocksBackend {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksBackend {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn encode(entry: &Entry) -> Result<Vec<u8>> {
        Self::serialize(&StoredValue {
            value: entry.value.clone(),
            timestamp: entry.timestamp,
        })
    }

    fn decode(key: String, data: &[u8]) -> Result<Entry> {
        let stored: StoredValue = Self::deserialize(data)?;
        Ok(Entry {
            key,
            value: stored.value,
            timestamp: stored.timestamp,
        })
    }
}

impl DurableBackend for RocksBackend {
    fn put(&self, entry: &Entry) -> Result<()> {
        let cf = self.cf(cf::KV)?;
        let value = Self::encode(entry)?;

        self.db
            .put_cf(&cf, entry.key.as_bytes(), value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn put_batch(&self, entries: &[Entry]) -> Result<()> {
        let cf = self.cf(cf::KV)?;

        let mut batch = WriteBatch::default();
        for entry in entries {
            batch.put_cf(&cf, entry.key.as_bytes(), Self::encode(entry)?);
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Entry>> {
        let cf = self.cf(cf::KV)?;

        self.db
            .get_cf(&cf, key.as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::decode(key.to_string(), &data))
            .transpose()
    }

    fn delete(&self, key: &str) -> Result<()> {
        let cf = self.cf(cf::KV)?;

        self.db
            .delete_cf(&cf, key.as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let cf = self.cf(cf::KV)?;

        // Delete every key in one batch so a clear is all-or-nothing.
        let mut batch = WriteBatch::default();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            batch.delete_cf(&cf, key);
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn entries(&self) -> Result<Vec<Entry>> {
        let cf = self.cf(cf::KV)?;

        let mut entries = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            entries.push(Self::decode(key, &value)?);
        }

        Ok(entries)
    }

    fn size_estimate(&self) -> Result<Option<u64>> {
        let cf = self.cf(cf::KV)?;

        self.db
            .property_int_value_cf(&cf, "rocksdb.estimate-live-data-size")
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_backend() -> (RocksBackend, TempDir) {
        let dir = TempDir::new().unwrap();
        let backend = RocksBackend::open(dir.path()).unwrap();
        (backend, dir)
    }

    #[test]
    fn entry_crud() {
        let (backend, _dir) = create_test_backend();
        let entry = Entry {
            key: "pos_settings".into(),
            value: json!({"taxRate": 10, "ratio": 0.5, "name": "Toko"}),
            timestamp: 1_700_000_000_000,
        };

        // Create
        backend.put(&entry).unwrap();

        // Read
        let retrieved = backend.get("pos_settings").unwrap().unwrap();
        assert_eq!(retrieved, entry);

        // Delete
        backend.delete("pos_settings").unwrap();
        assert!(backend.get("pos_settings").unwrap().is_none());

        // Deleting again is fine
        backend.delete("pos_settings").unwrap();
    }

    #[test]
    fn batch_and_clear() {
        let (backend, _dir) = create_test_backend();

        backend
            .put_batch(&[
                Entry::now("b", json!([{"id": "1"}])),
                Entry::now("a", json!("text")),
            ])
            .unwrap();

        let keys: Vec<String> = backend.entries().unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, ["a", "b"]);

        backend.clear().unwrap();
        assert!(backend.entries().unwrap().is_empty());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let backend = RocksBackend::open(dir.path()).unwrap();
            backend.put(&Entry::now("k", json!({"v": [1, 2, 3]}))).unwrap();
        }

        let backend = RocksBackend::open(dir.path()).unwrap();
        assert_eq!(backend.get("k").unwrap().unwrap().value, json!({"v": [1, 2, 3]}));
        assert!(backend.size_estimate().is_ok());
    }
}
