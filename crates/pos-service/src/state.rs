//! Application state.

use std::sync::Arc;

use pos_store::KvStore;

use crate::config::AppConfig;
use crate::error::Result;

/// Application state shared by every operation.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<KvStore>,

    /// Service configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Create a new application state over an open store.
    #[must_use]
    pub fn new(store: Arc<KvStore>, config: AppConfig) -> Self {
        Self { store, config }
    }

    /// Open the `RocksDB` store named by the configuration and bootstrap it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or seeding fails.
    #[cfg(feature = "rocksdb-backend")]
    pub async fn start(config: AppConfig) -> Result<Self> {
        tracing::info!(path = %config.data_dir, "Opening RocksDB store");
        let store = KvStore::open(&config.data_dir, config.store_config())?;

        let state = Self::new(Arc::new(store), config);
        state.bootstrap().await?;
        Ok(state)
    }

    /// Load durable data into the fast cache, then seed an empty store.
    ///
    /// Migration failures are logged by the store and never stop seeding.
    /// Returns whether default data was seeded.
    ///
    /// # Errors
    ///
    /// Returns an error if seed data cannot be written.
    pub async fn bootstrap(&self) -> Result<bool> {
        let migrated = self.store.migrate_from_durable().await;
        tracing::info!(entries = migrated, "Loaded durable data into fast cache");

        if !self.config.seed_defaults {
            tracing::debug!("Seeding disabled");
            return Ok(false);
        }
        self.seed_defaults()
    }
}
