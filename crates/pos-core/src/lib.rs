//! Core types and utilities for the point-of-sale.
//!
//! This crate provides the foundational types used throughout the POS:
//!
//! - **Identifiers**: `generate_id`, invoice numbers
//! - **Storage keys**: the collection and singleton key names in [`keys`]
//! - **Catalog**: `Product`, `Customer`
//! - **Sales**: `Sale`, `SaleItem`, `Payment`
//! - **Expenses**: `Expense`
//! - **Users**: `User`, `SessionUser`, `Role`, password hashing
//! - **Checkout**: `Cart`, `Discount`, `CartTotals`
//! - **Finance**: `calculate_profit`, `calculate_net_profit`
//! - **Reports**: sales summary, profit/loss, top products, cashier performance
//!
//! # Amounts
//!
//! Amounts are `f64` in whole currency units (IDR by default). Records arrive
//! as loosely-typed JSON, so numeric fields are parsed the lenient way: a
//! number, or the numeric prefix of a string, and `0` for anything else.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod checkout;
pub mod error;
pub mod expense;
pub mod finance;
pub mod ids;
pub mod keys;
pub mod lenient;
pub mod password;
pub mod report;
pub mod sale;
pub mod settings;
pub mod time;
pub mod user;

pub use catalog::{Customer, Product};
pub use checkout::{Cart, CartLine, CartTotals, CheckoutDetails, Discount};
pub use error::{CoreError, Result};
pub use expense::Expense;
pub use finance::{calculate_net_profit, calculate_profit, total_expenses, ProfitSummary};
pub use ids::{generate_id, generate_invoice_no};
pub use password::{check_policy, hash_password, verify_password, DEFAULT_PASSWORD_ITERATIONS};
pub use report::{
    CashierPerformance, DailyStats, DateRange, ProductRanking, ProductSales, ProfitLoss,
    SalesSummary,
};
pub use sale::{Payment, PaymentMethod, Sale, SaleItem, SaleStatus};
pub use settings::Settings;
pub use user::{Role, SessionUser, User, UserStatus};
