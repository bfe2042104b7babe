//! Database schema definitions and column families.
//!
//! The durable store mirrors a flat key space, so a single column family
//! holds every entry.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Key-value entries, keyed by store key.
    /// Value is a CBOR-encoded `{value, timestamp}`.
    pub const KV: &str = "kv";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::KV]
}
