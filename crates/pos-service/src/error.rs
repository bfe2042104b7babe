//! Service error types.

use pos_core::CoreError;
use pos_store::StoreError;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Service error type.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Domain rule violated (empty cart, bad amount, weak password, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No session, or the credentials did not match.
    #[error("unauthorized")]
    Unauthorized,

    /// Logged in, but the role may not do this.
    #[error("forbidden")]
    Forbidden,

    /// Record not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Record already exists.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl ServiceError {
    /// Stable machine-readable code for the error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(StoreError::QuotaExceeded { .. }) => "quota_exceeded",
            Self::Store(StoreError::InvalidBackup(_)) => "invalid_backup",
            Self::Store(_) => "storage_error",
            Self::Core(_) | Self::BadRequest(_) => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
        }
    }
}
