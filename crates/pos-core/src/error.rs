//! Error types for the POS core.

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Checkout attempted with no line items.
    #[error("cart is empty")]
    EmptyCart,

    /// A quantity that must be positive was not.
    #[error("invalid quantity for {product_id}: {quantity}")]
    InvalidQuantity {
        /// The product whose line was rejected.
        product_id: String,
        /// The rejected quantity.
        quantity: f64,
    },

    /// Invalid amount (negative discount, non-finite value, ...).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Password does not satisfy the password policy.
    #[error("invalid password: {0}")]
    InvalidPassword(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
