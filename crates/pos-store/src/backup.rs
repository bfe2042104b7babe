//! Backup and restore of the whole store.
//!
//! A backup document is one JSON object whose top-level keys are exactly the
//! store keys. It is taken from the durable backend, which is authoritative.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::info;

use crate::error::{Result, StoreError};
use crate::kv::KvStore;
use crate::notify::ChangeEvent;

/// A full snapshot: store key → value.
pub type BackupDocument = Map<String, Value>;

impl KvStore {
    /// Snapshot every durable entry.
    ///
    /// Pending durable writes are flushed first, so the snapshot includes
    /// every write made before the call.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable backend cannot be read.
    pub async fn backup(&self) -> Result<BackupDocument> {
        self.flush().await;
        let entries = self.durable_entries().await?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.key, entry.value))
            .collect())
    }

    /// Replace the whole store with a backup document.
    ///
    /// The document is checked before anything changes: it must be a JSON
    /// object and its values must fit in the fast cache. Then both backends
    /// are cleared, every pair is written, the fast cache is reloaded from
    /// the durable backend and a `restore` event is published.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidBackup`] for a non-object document and
    /// [`StoreError::QuotaExceeded`] when it is too large; the store is
    /// unchanged in both cases.
    pub async fn restore(&self, document: &Value) -> Result<()> {
        let Value::Object(map) = document else {
            return Err(StoreError::InvalidBackup(format!(
                "expected a JSON object, got {}",
                kind(document)
            )));
        };

        let mut needed = 0;
        for (key, value) in map {
            needed += key.len() + serde_json::to_string(value)?.len();
        }
        let quota = self.fast.quota();
        if needed > quota {
            return Err(StoreError::QuotaExceeded {
                key: "<backup>".into(),
                needed,
                available: quota,
            });
        }

        self.clear();
        let items = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        self.set_many(items)?;
        self.flush().await;
        self.migrate_from_durable().await;

        info!(keys = map.len(), "store restored from backup");
        self.notifier.publish(ChangeEvent::Restore {
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
        Ok(())
    }

    /// Write a backup to `path` as pretty-printed JSON.
    ///
    /// Returns the number of keys written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup cannot be taken or the file cannot be
    /// written.
    pub async fn export_backup<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let document = self.backup().await?;
        let text = serde_json::to_string_pretty(&document)?;

        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path.as_ref(), text).await?;

        info!(path = %path.as_ref().display(), keys = document.len(), "backup exported");
        Ok(document.len())
    }

    /// Restore from a backup file written by [`export_backup`](Self::export_backup).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or is
    /// rejected by [`restore`](Self::restore).
    pub async fn import_backup<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        let document: Value = serde_json::from_str(&text)
            .map_err(|e| StoreError::InvalidBackup(format!("not valid JSON: {e}")))?;
        self.restore(&document).await
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
