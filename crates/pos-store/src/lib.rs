//! Local storage layer for the POS.
//!
//! A [`KvStore`] keeps a flat namespace of JSON values in two places:
//!
//! - a **fast cache** ([`FastCache`]): in-process, synchronous and limited by
//!   a byte quota. All reads are served from here.
//! - a **durable backend** ([`DurableBackend`]): `RocksDB` in production
//!   ([`RocksBackend`]), or [`MemoryBackend`] for tests. Writes are mirrored
//!   here by a background writer in call order.
//!
//! Collection keys hold a JSON array of records; the CRUD helpers in
//! [`collection`] read, change and write back the whole array. Every write
//! publishes a [`ChangeEvent`] to subscribers.
//!
//! # Example
//!
//! ```no_run
//! use pos_store::{KvStore, StoreConfig};
//! use serde_json::json;
//!
//! # async fn run() -> pos_store::Result<()> {
//! let store = KvStore::open("/tmp/pos-db", StoreConfig::default())?;
//! store.migrate_from_durable().await;
//!
//! store.add_one("pos_products", &json!({"id": "P1", "nama": "Kopi"}))?;
//! let product = store.find_one("pos_products", "P1");
//!
//! let snapshot = store.backup().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod backup;
pub mod collection;
pub mod durable;
pub mod error;
pub mod fast;
pub mod kv;
pub mod notify;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;
mod writer;

pub use backup::BackupDocument;
pub use collection::Record;
pub use durable::{DurableBackend, Entry, MemoryBackend};
pub use error::{Result, StoreError};
pub use fast::FastCache;
pub use kv::{KvStore, StorageEstimate, StoreConfig};
pub use notify::{ChangeEvent, Notifier};
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksBackend;
