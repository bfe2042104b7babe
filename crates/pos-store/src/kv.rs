//! The dual-backend key-value store.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::durable::{DurableBackend, Entry};
use crate::error::{Result, StoreError};
use crate::fast::{FastCache, DEFAULT_QUOTA_BYTES};
use crate::notify::{ChangeEvent, Notifier, DEFAULT_CAPACITY};
use crate::writer::{DurableWriter, WriteOp};

/// Store tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Fast cache quota in bytes.
    pub fast_quota_bytes: usize,
    /// Notifier buffer size; zero disables change notifications.
    pub broadcast_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            fast_quota_bytes: DEFAULT_QUOTA_BYTES,
            broadcast_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Space used by the two backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageEstimate {
    /// Bytes used in the fast cache.
    pub fast_usage_bytes: usize,
    /// Fast cache quota.
    pub fast_quota_bytes: usize,
    /// Approximate durable bytes, when the backend reports them.
    pub durable_bytes: Option<u64>,
}

/// Keys written while a migration is reading the durable snapshot.
///
/// The fast cache already holds the newer value for these, so the migration
/// must not copy the snapshot over them.
#[derive(Debug, Default)]
struct WriteLog {
    tracking: bool,
    touched: HashSet<String>,
    cleared: bool,
}

impl WriteLog {
    fn start(&mut self) {
        self.tracking = true;
        self.touched.clear();
        self.cleared = false;
    }

    fn stop(&mut self) {
        self.tracking = false;
        self.touched.clear();
        self.cleared = false;
    }

    fn touch(&mut self, key: &str) {
        if self.tracking {
            self.touched.insert(key.to_string());
        }
    }

    fn touch_all(&mut self) {
        if self.tracking {
            self.cleared = true;
        }
    }

    fn superseded(&self, key: &str) -> bool {
        self.cleared || self.touched.contains(key)
    }
}

/// Key-value store with a synchronous fast cache mirrored into a durable
/// backend.
///
/// Reads come from the fast cache only. Writes land in the fast cache
/// synchronously and are queued for the durable backend; a durable failure is
/// logged and never reported to the caller. Call
/// [`migrate_from_durable`](Self::migrate_from_durable) once at startup to
/// load the durable state into the cache.
pub struct KvStore {
    pub(crate) fast: FastCache,
    pub(crate) backend: Arc<dyn DurableBackend>,
    pub(crate) writer: DurableWriter,
    pub(crate) notifier: Notifier,
    /// Keeps fast cache writes and durable queue order in step, and records
    /// the keys written during a migration.
    write_lock: Mutex<WriteLog>,
    /// One migration at a time.
    migration_lock: tokio::sync::Mutex<()>,
    /// Serializes whole-collection read-modify-write cycles.
    pub(crate) collection_lock: Mutex<()>,
}

impl KvStore {
    /// Create a store over a durable backend.
    ///
    /// The fast cache starts empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer thread cannot be started.
    pub fn new(backend: Arc<dyn DurableBackend>, config: StoreConfig) -> Result<Self> {
        let writer = DurableWriter::spawn(Arc::clone(&backend))?;
        Ok(Self {
            fast: FastCache::new(config.fast_quota_bytes),
            backend,
            writer,
            notifier: Notifier::new(config.broadcast_capacity),
            write_lock: Mutex::new(WriteLog::default()),
            migration_lock: tokio::sync::Mutex::new(()),
            collection_lock: Mutex::new(()),
        })
    }

    /// Open a store backed by `RocksDB` at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the writer thread
    /// cannot be started.
    #[cfg(feature = "rocksdb-backend")]
    pub fn open<P: AsRef<std::path::Path>>(path: P, config: StoreConfig) -> Result<Self> {
        let backend = crate::rocks::RocksBackend::open(path)?;
        Self::new(Arc::new(backend), config)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Value stored under `key`.
    ///
    /// `None` when absent or unreadable; a parse failure is logged.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let text = self.fast.get_raw(key)?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                error!(key = %key, error = %e, "stored value is not valid JSON");
                None
            }
        }
    }

    /// Value stored under `key`, deserialized as `T`.
    ///
    /// `None` when absent or not a `T`; a mismatch is logged.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                error!(key = %key, error = %e, "stored value has unexpected shape");
                None
            }
        }
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fast.contains(key)
    }

    /// All keys in the fast cache, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.fast.keys()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Store a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized or does not fit in
    /// the fast cache. The previous value is then left in place.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let text = serde_json::to_string(&value)?;

        let mut log = self.write_lock.lock();
        self.fast.set_raw(key, text)?;
        log.touch(key);

        let entry = Entry::now(key, value);
        debug!(key = %key, "stored");
        self.notifier.publish(ChangeEvent::Update {
            key: entry.key.clone(),
            value: entry.value.clone(),
            timestamp: entry.timestamp,
        });
        self.writer.enqueue(WriteOp::Put(entry));
        Ok(())
    }

    /// Store several values at once.
    ///
    /// The fast cache takes all of them or none; the durable backend receives
    /// them as one atomic batch.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be serialized or the values do not
    /// fit in the fast cache together. Nothing is written then.
    pub fn set_many(&self, items: Vec<(String, Value)>) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let texts = items
            .iter()
            .map(|(key, value)| -> Result<(String, String)> {
                Ok((key.clone(), serde_json::to_string(value)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut log = self.write_lock.lock();
        self.fast.set_many_raw(texts)?;
        for (key, _) in &items {
            log.touch(key);
        }

        let timestamp = chrono::Utc::now().timestamp_millis();
        let entries: Vec<Entry> = items
            .into_iter()
            .map(|(key, value)| Entry {
                key,
                value,
                timestamp,
            })
            .collect();

        debug!(count = entries.len(), "stored batch");
        for entry in &entries {
            self.notifier.publish(ChangeEvent::Update {
                key: entry.key.clone(),
                value: entry.value.clone(),
                timestamp,
            });
        }
        self.writer.enqueue(WriteOp::PutBatch(entries));
        Ok(())
    }

    /// Remove `key` from both backends.
    pub fn remove(&self, key: &str) {
        let mut log = self.write_lock.lock();
        self.fast.remove(key);
        log.touch(key);
        debug!(key = %key, "removed");
        self.writer.enqueue(WriteOp::Delete(key.to_string()));
    }

    /// Remove every key from both backends.
    pub fn clear(&self) {
        let mut log = self.write_lock.lock();
        self.fast.clear();
        log.touch_all();
        info!("store cleared");
        self.writer.enqueue(WriteOp::Clear);
    }

    // =========================================================================
    // Durable side
    // =========================================================================

    /// Wait until every durable write queued before this call is applied.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Copy every durable entry into the fast cache.
    ///
    /// Returns the number of entries copied. Failures are logged, never
    /// returned: a durable read failure copies nothing, an entry that does not
    /// fit is skipped.
    ///
    /// Writes made while the snapshot is being read win: their keys keep the
    /// fast cache value instead of the older durable one.
    pub async fn migrate_from_durable(&self) -> usize {
        let _migration = self.migration_lock.lock().await;
        self.write_lock.lock().start();
        self.flush().await;

        let entries = match self.durable_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                self.write_lock.lock().stop();
                warn!(error = %e, "migration skipped, durable backend unreadable");
                return 0;
            }
        };

        let mut log = self.write_lock.lock();
        let total = entries.len();
        let mut copied = 0;
        let mut superseded = 0;
        for entry in entries {
            if log.superseded(&entry.key) {
                superseded += 1;
                continue;
            }
            let text = match serde_json::to_string(&entry.value) {
                Ok(text) => text,
                Err(e) => {
                    warn!(key = %entry.key, error = %e, "entry not migrated");
                    continue;
                }
            };
            match self.fast.set_raw(&entry.key, text) {
                Ok(()) => copied += 1,
                Err(e) => warn!(key = %entry.key, error = %e, "entry not migrated"),
            }
        }

        log.stop();
        drop(log);

        info!(copied, superseded, total, "migrated durable entries into fast cache");
        copied
    }

    /// Space used by both backends.
    pub async fn estimate(&self) -> StorageEstimate {
        let backend = Arc::clone(&self.backend);
        let durable_bytes = match tokio::task::spawn_blocking(move || backend.size_estimate()).await
        {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                warn!(error = %e, "durable size estimate unavailable");
                None
            }
            Err(e) => {
                warn!(error = %e, "durable size estimate task failed");
                None
            }
        };

        StorageEstimate {
            fast_usage_bytes: self.fast.usage(),
            fast_quota_bytes: self.fast.quota(),
            durable_bytes,
        }
    }

    /// Subscribe to change events. `None` when notifications are disabled.
    #[must_use]
    pub fn subscribe(&self) -> Option<broadcast::Receiver<ChangeEvent>> {
        self.notifier.subscribe()
    }

    /// Read every durable entry on the blocking pool.
    pub(crate) async fn durable_entries(&self) -> Result<Vec<Entry>> {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || backend.entries())
            .await
            .map_err(|e| StoreError::Database(format!("durable read task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::durable::MemoryBackend;
    use serde_json::json;

    fn store_with(config: StoreConfig) -> (KvStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let store = KvStore::new(backend.clone(), config).unwrap();
        (store, backend)
    }

    fn store() -> (KvStore, Arc<MemoryBackend>) {
        store_with(StoreConfig::default())
    }

    #[tokio::test]
    async fn set_then_get() {
        let (store, backend) = store();
        store.set("pos_settings", &json!({"taxRate": 10})).unwrap();

        assert_eq!(store.get("pos_settings"), Some(json!({"taxRate": 10})));
        assert!(store.contains_key("pos_settings"));

        store.flush().await;
        assert_eq!(
            backend.get("pos_settings").unwrap().unwrap().value,
            json!({"taxRate": 10})
        );
    }

    #[tokio::test]
    async fn absent_key_is_none() {
        let (store, _) = store();
        assert_eq!(store.get("missing"), None);
        assert_eq!(store.get_as::<Vec<String>>("missing"), None);
    }

    #[tokio::test]
    async fn corrupt_text_reads_as_absent() {
        let (store, _) = store();
        store.fast.set_raw("broken", "{not json".into()).unwrap();
        assert_eq!(store.get("broken"), None);
    }

    #[tokio::test]
    async fn typed_mismatch_reads_as_none() {
        let (store, _) = store();
        store.set("k", &json!("text")).unwrap();
        assert_eq!(store.get_as::<Vec<String>>("k"), None);
        assert_eq!(store.get_as::<String>("k").as_deref(), Some("text"));
    }

    #[tokio::test]
    async fn remove_and_clear_reach_durable() {
        let (store, backend) = store();
        store.set("a", &1).unwrap();
        store.set("b", &2).unwrap();
        store.remove("a");
        store.flush().await;
        assert!(backend.get("a").unwrap().is_none());
        assert_eq!(store.keys(), ["b"]);

        store.clear();
        store.flush().await;
        assert!(backend.is_empty());
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn set_many_publishes_each_key() {
        let (store, backend) = store();
        let mut rx = store.subscribe().unwrap();

        store
            .set_many(vec![("a".into(), json!(1)), ("b".into(), json!(2))])
            .unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(first, ChangeEvent::Update { ref key, .. } if key == "a"));
        assert!(matches!(second, ChangeEvent::Update { ref key, .. } if key == "b"));

        store.flush().await;
        assert_eq!(backend.len(), 2);
    }

    #[tokio::test]
    async fn quota_failure_is_returned() {
        let (store, _) = store_with(StoreConfig {
            fast_quota_bytes: 16,
            ..StoreConfig::default()
        });
        store.set("k", &"small").unwrap();

        let err = store.set("k", &"x".repeat(64)).unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        assert_eq!(store.get("k"), Some(json!("small")));
    }

    #[tokio::test]
    async fn migration_copies_durable_entries() {
        let backend = Arc::new(MemoryBackend::new());
        backend.put(&Entry::now("pos_users", json!([{"id": "1"}]))).unwrap();
        backend.put(&Entry::now("pos_settings", json!({}))).unwrap();

        let store = KvStore::new(backend, StoreConfig::default()).unwrap();
        assert_eq!(store.get("pos_users"), None);

        assert_eq!(store.migrate_from_durable().await, 2);
        assert_eq!(store.get("pos_users"), Some(json!([{"id": "1"}])));
    }

    /// Pauses the first armed `entries()` call after its snapshot is taken,
    /// until the test releases it.
    #[derive(Default)]
    struct GatedBackend {
        inner: MemoryBackend,
        armed: std::sync::atomic::AtomicBool,
        snapshot_taken: tokio::sync::Notify,
        release: Mutex<Option<std::sync::mpsc::Receiver<()>>>,
    }

    impl GatedBackend {
        fn arm(&self) -> std::sync::mpsc::Sender<()> {
            let (tx, rx) = std::sync::mpsc::channel();
            *self.release.lock() = Some(rx);
            self.armed.store(true, std::sync::atomic::Ordering::SeqCst);
            tx
        }
    }

    impl DurableBackend for GatedBackend {
        fn put(&self, entry: &Entry) -> Result<()> {
            self.inner.put(entry)
        }

        fn put_batch(&self, entries: &[Entry]) -> Result<()> {
            self.inner.put_batch(entries)
        }

        fn get(&self, key: &str) -> Result<Option<Entry>> {
            self.inner.get(key)
        }

        fn delete(&self, key: &str) -> Result<()> {
            self.inner.delete(key)
        }

        fn clear(&self) -> Result<()> {
            self.inner.clear()
        }

        fn entries(&self) -> Result<Vec<Entry>> {
            let snapshot = self.inner.entries()?;
            if self.armed.swap(false, std::sync::atomic::Ordering::SeqCst) {
                self.snapshot_taken.notify_one();
                let release = self.release.lock().take();
                if let Some(rx) = release {
                    let _ = rx.recv();
                }
            }
            Ok(snapshot)
        }

        fn size_estimate(&self) -> Result<Option<u64>> {
            self.inner.size_estimate()
        }
    }

    #[tokio::test]
    async fn write_during_migration_is_not_overwritten() {
        let backend = Arc::new(GatedBackend::default());
        let store = Arc::new(KvStore::new(backend.clone(), StoreConfig::default()).unwrap());
        store.set("stok", &10).unwrap();
        store.set("other", &1).unwrap();
        store.flush().await;

        let release = backend.arm();
        let migration = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.migrate_from_durable().await }
        });

        backend.snapshot_taken.notified().await;
        store.set("stok", &7).unwrap();
        release.send(()).unwrap();

        assert_eq!(migration.await.unwrap(), 1);
        assert_eq!(store.get("stok"), Some(json!(7)));
        assert_eq!(store.get("other"), Some(json!(1)));

        store.flush().await;
        assert_eq!(backend.inner.get("stok").unwrap().unwrap().value, json!(7));
    }

    #[tokio::test]
    async fn removal_during_migration_stays_removed() {
        let backend = Arc::new(GatedBackend::default());
        let store = Arc::new(KvStore::new(backend.clone(), StoreConfig::default()).unwrap());
        store.set("pos_auth", &json!({"id": "1"})).unwrap();
        store.flush().await;

        let release = backend.arm();
        let migration = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.migrate_from_durable().await }
        });

        backend.snapshot_taken.notified().await;
        store.remove("pos_auth");
        release.send(()).unwrap();

        assert_eq!(migration.await.unwrap(), 0);
        assert_eq!(store.get("pos_auth"), None);
    }

    #[tokio::test]
    async fn migration_swallows_outage() {
        let (store, backend) = store();
        backend.set_failing(true);
        assert_eq!(store.migrate_from_durable().await, 0);
    }

    #[tokio::test]
    async fn estimate_reports_both_sides() {
        let (store, _) = store();
        store.set("k", &"v").unwrap();
        store.flush().await;

        let estimate = store.estimate().await;
        assert_eq!(estimate.fast_usage_bytes, "k".len() + "\"v\"".len());
        assert_eq!(estimate.fast_quota_bytes, DEFAULT_QUOTA_BYTES);
        assert!(estimate.durable_bytes.is_some());
    }

    #[tokio::test]
    async fn disabled_notifier_does_not_affect_writes() {
        let (store, _) = store_with(StoreConfig {
            broadcast_capacity: 0,
            ..StoreConfig::default()
        });
        assert!(store.subscribe().is_none());
        store.set("k", &1).unwrap();
        assert_eq!(store.get("k"), Some(json!(1)));
    }
}
