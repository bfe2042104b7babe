//! Storage key names.
//!
//! The store is a flat namespace. Collection keys hold a JSON array of
//! records; singleton keys hold a single JSON object or list.

/// User accounts (collection).
pub const USERS: &str = "pos_users";

/// Product catalog (collection).
pub const PRODUCTS: &str = "pos_products";

/// Stock movements (collection).
pub const STOCK_HISTORY: &str = "pos_stock_history";

/// Customers (collection).
pub const CUSTOMERS: &str = "pos_customers";

/// Promo codes (collection).
pub const PROMO_CODES: &str = "pos_promo_codes";

/// Completed sales (collection).
pub const TRANSACTIONS: &str = "pos_transactions";

/// Expenses (collection).
pub const EXPENSES: &str = "pos_expenses";

/// Authenticated session snapshot (singleton).
pub const AUTH: &str = "pos_auth";

/// Application settings (singleton).
pub const SETTINGS: &str = "pos_settings";

/// Product category names (list of strings).
pub const CATEGORIES: &str = "pos_categories";

/// Expense category names (list of strings).
pub const EXPENSE_CATEGORIES: &str = "pos_expense_categories";
