//! POS application layer.
//!
//! This crate wires the store to the domain and provides:
//!
//! - Configuration and bootstrap (migrate durable data, seed a fresh store)
//! - Login sessions and user management
//! - Product catalog and expense bookkeeping
//! - Checkout recording (sale plus stock decrement in one write)
//! - Settings and category lists
//! - Report queries
//!
//! # Roles
//!
//! Operations that need a role take the acting [`pos_core::SessionUser`].
//! Super admins and admins manage users and settings. Managers and above
//! manage products and expenses and see financial figures. Every role can
//! sell and see sales reports.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod auth;
pub mod categories;
pub mod config;
pub mod error;
pub mod expenses;
pub mod products;
pub mod reports;
pub mod sales;
pub mod seed;
pub mod settings;
pub mod state;
pub mod users;

pub use categories::CategoryKind;
pub use config::AppConfig;
pub use error::{Result, ServiceError};
pub use expenses::ExpenseInput;
pub use products::ProductInput;
pub use reports::Dashboard;
pub use state::AppState;
pub use users::{NewUser, UserUpdate};
