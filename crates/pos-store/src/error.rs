//! Error types for the POS store.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Durable database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The fast cache has no room for the write.
    #[error("quota exceeded writing {key}: needed {needed} bytes, {available} available")]
    QuotaExceeded {
        /// The key being written.
        key: String,
        /// Bytes the write would occupy.
        needed: usize,
        /// Bytes still free.
        available: usize,
    },

    /// A backup document was rejected before anything was changed.
    #[error("invalid backup: {0}")]
    InvalidBackup(String),

    /// Filesystem or thread error.
    #[error("io error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
