//! Common test utilities for pos-store integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use pos_store::{KvStore, MemoryBackend, StoreConfig};

/// A store over `RocksDB` in a temporary directory.
pub struct TestHarness {
    /// The store under test.
    pub store: KvStore,
    /// Temporary directory for the database (kept alive for test duration).
    pub temp_dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = open(temp_dir.path());
        Self { store, temp_dir }
    }

    /// Close the store and open a fresh one over the same database, with an
    /// empty fast cache.
    pub async fn reopen(self) -> Self {
        let Self { store, temp_dir } = self;
        store.flush().await;
        drop(store);

        let store = open(temp_dir.path());
        Self { store, temp_dir }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Open a `RocksDB`-backed store at `path`.
pub fn open(path: &Path) -> KvStore {
    KvStore::open(path, StoreConfig::default()).expect("Failed to open store")
}

/// A store over an in-memory backend, with the backend for fault injection.
pub fn memory_store(config: StoreConfig) -> (KvStore, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let store = KvStore::new(backend.clone(), config).expect("Failed to create store");
    (store, backend)
}
