//! Collection helpers: record CRUD over keys that hold a JSON array.
//!
//! Every mutation reads the whole array, changes it and writes it back. The
//! store-wide collection lock makes these cycles serial within the process.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use pos_core::time::now_timestamp;

use crate::error::{Result, StoreError};
use crate::kv::KvStore;

/// A record: a JSON object with a string `id`.
pub type Record = Map<String, Value>;

const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

fn has_id(record: &Record, id: &str) -> bool {
    record.get("id").and_then(Value::as_str) == Some(id)
}

fn is_unset(record: &Record, field: &str) -> bool {
    record.get(field).map_or(true, Value::is_null)
}

impl KvStore {
    /// All records in a collection.
    ///
    /// Empty when the key is absent or not an array. Elements that are not
    /// objects are skipped.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<Record> {
        let Some(value) = self.get(key) else {
            return Vec::new();
        };
        let Value::Array(items) = value else {
            warn!(key = %key, "collection is not an array");
            return Vec::new();
        };

        items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(record) => Some(record),
                other => {
                    warn!(key = %key, element = %other, "skipping non-object element");
                    None
                }
            })
            .collect()
    }

    /// All records in a collection, deserialized as `T`.
    ///
    /// Records that do not deserialize are skipped.
    #[must_use]
    pub fn get_all_as<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        self.get_all(key)
            .into_iter()
            .filter_map(|record| {
                let id = record.get("id").cloned();
                match serde_json::from_value(Value::Object(record)) {
                    Ok(typed) => Some(typed),
                    Err(e) => {
                        warn!(key = %key, id = ?id, error = %e, "skipping unreadable record");
                        None
                    }
                }
            })
            .collect()
    }

    /// Append a record.
    ///
    /// `createdAt` and `updatedAt` are set to now when absent. The id is not
    /// checked for uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if `record` is not a JSON object,
    /// or the error of the underlying write.
    pub fn add_one<T: Serialize + ?Sized>(&self, key: &str, record: &T) -> Result<Record> {
        let Value::Object(mut record) = serde_json::to_value(record)? else {
            return Err(StoreError::Serialization("record must be a JSON object".into()));
        };

        let now = now_timestamp();
        for field in [CREATED_AT, UPDATED_AT] {
            if is_unset(&record, field) {
                record.insert(field.into(), Value::String(now.clone()));
            }
        }

        let _guard = self.collection_lock.lock();
        let mut records = self.get_all(key);
        records.push(record.clone());
        self.set(key, &records)?;
        Ok(record)
    }

    /// First record with the given id.
    #[must_use]
    pub fn find_one(&self, key: &str, id: &str) -> Option<Record> {
        self.get_all(key).into_iter().find(|r| has_id(r, id))
    }

    /// Shallow-merge `partial` into the first record with the given id.
    ///
    /// `updatedAt` is set to now and `createdAt` in `partial` is ignored.
    /// Returns the merged record, or `None` (and writes nothing) when no
    /// record matches.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying write.
    pub fn update_one(&self, key: &str, id: &str, partial: Record) -> Result<Option<Record>> {
        let _guard = self.collection_lock.lock();
        let mut records = self.get_all(key);
        let Some(record) = records.iter_mut().find(|r| has_id(r, id)) else {
            return Ok(None);
        };

        for (field, value) in partial {
            if field != CREATED_AT {
                record.insert(field, value);
            }
        }
        record.insert(UPDATED_AT.into(), Value::String(now_timestamp()));
        let merged = record.clone();

        self.set(key, &records)?;
        Ok(Some(merged))
    }

    /// Remove every record with the given id.
    ///
    /// The collection is written even when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying write.
    pub fn delete_one(&self, key: &str, id: &str) -> Result<()> {
        let _guard = self.collection_lock.lock();
        let mut records = self.get_all(key);
        records.retain(|r| !has_id(r, id));
        self.set(key, &records)
    }

    /// Records whose `field` equals `value`.
    #[must_use]
    pub fn find_by_field(&self, key: &str, field: &str, value: &Value) -> Vec<Record> {
        self.get_all(key)
            .into_iter()
            .filter(|r| r.get(field) == Some(value))
            .collect()
    }

    /// Read several collections, let `f` change them, and write them all
    /// back in one [`set_many`](Self::set_many).
    ///
    /// `f` receives the collections in the order of `keys`. Either every
    /// collection is written or none is.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying write.
    pub fn modify_collections<F, R>(&self, keys: &[&str], f: F) -> Result<R>
    where
        F: FnOnce(&mut [Vec<Record>]) -> R,
    {
        let _guard = self.collection_lock.lock();
        let mut collections: Vec<Vec<Record>> = keys.iter().map(|key| self.get_all(key)).collect();

        let result = f(&mut collections);

        let items = keys
            .iter()
            .zip(collections)
            .map(|(key, records)| {
                let array = records.into_iter().map(Value::Object).collect();
                ((*key).to_string(), Value::Array(array))
            })
            .collect();
        self.set_many(items)?;
        Ok(result)
    }

    /// Read a plain JSON list, let `f` change it and write it back.
    ///
    /// Used for lists of scalars such as category names. A missing or
    /// non-array value reads as an empty list. Nothing is written when `f`
    /// returns `None`.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying write.
    pub fn modify_list<F, R>(&self, key: &str, f: F) -> Result<Option<R>>
    where
        F: FnOnce(&mut Vec<Value>) -> Option<R>,
    {
        let _guard = self.collection_lock.lock();
        let mut items = match self.get(key) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };

        let Some(result) = f(&mut items) else {
            return Ok(None);
        };
        self.set(key, &items)?;
        Ok(Some(result))
    }
}
