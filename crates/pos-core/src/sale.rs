//! Sale (checkout transaction) types.
//!
//! A sale is stored in the `pos_transactions` collection. Its `items` drive
//! both the revenue it contributes and the stock it consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{lenient, time};

/// A completed checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Record id.
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,

    /// Human-facing invoice number (`INV/YYYYMMDD/NNNNNN`).
    #[serde(default, deserialize_with = "lenient::text")]
    pub invoice_no: String,

    /// Customer, if one was attached to the sale.
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub customer_id: Option<String>,

    /// Line items.
    #[serde(default, deserialize_with = "lenient::list")]
    pub items: Vec<SaleItem>,

    /// Sum of line subtotals.
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::write_amount"
    )]
    pub subtotal: f64,

    /// Discount applied to the subtotal.
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::write_amount"
    )]
    pub discount: f64,

    /// How the discount was expressed (`percentage` or `nominal`).
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub discount_type: Option<String>,

    /// Tax charged.
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::write_amount"
    )]
    pub tax: f64,

    /// Amount due: subtotal - discount + tax.
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::write_amount"
    )]
    pub total: f64,

    /// Payments received.
    #[serde(default, deserialize_with = "lenient::list")]
    pub payments: Vec<Payment>,

    /// The user who rang up the sale.
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub cashier_id: Option<String>,

    /// When the sale was made.
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub created_at: Option<String>,

    /// Sale status.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status: SaleStatus,
}

impl Sale {
    /// When the sale was made, if the record carries a readable timestamp.
    #[must_use]
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(time::parse_timestamp_str)
    }

    /// Total units across all line items.
    #[must_use]
    pub fn items_sold(&self) -> f64 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// One line of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    /// The product sold.
    #[serde(default, deserialize_with = "lenient::text")]
    pub product_id: String,

    /// Product name at the time of sale.
    #[serde(default, deserialize_with = "lenient::text")]
    pub nama: String,

    /// Unit selling price.
    #[serde(
        default,
        deserialize_with = "lenient::number_only",
        serialize_with = "lenient::write_opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub harga: Option<f64>,

    /// Unit price under its alternate field name.
    #[serde(
        default,
        deserialize_with = "lenient::number_only",
        serialize_with = "lenient::write_opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,

    /// Units sold.
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::write_amount"
    )]
    pub quantity: f64,

    /// Line subtotal as recorded at checkout.
    #[serde(
        default,
        deserialize_with = "lenient::number_only",
        serialize_with = "lenient::write_opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub subtotal: Option<f64>,
}

impl SaleItem {
    /// Revenue of this line.
    ///
    /// Prefers the stored subtotal, then `harga × quantity`, then
    /// `price × quantity`, else `0`.
    #[must_use]
    pub fn revenue(&self) -> f64 {
        self.subtotal
            .or_else(|| self.harga.map(|harga| harga * self.quantity))
            .or_else(|| self.price.map(|price| price * self.quantity))
            .unwrap_or(0.0)
    }
}

/// A payment toward a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment method.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub method: PaymentMethod,

    /// Amount paid.
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::write_amount"
    )]
    pub amount: f64,
}

/// Payment methods accepted at the till.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash.
    #[default]
    Tunai,
    /// Debit card.
    Debit,
    /// Credit card.
    Kredit,
    /// QRIS QR payment.
    Qris,
    /// Bank transfer.
    Transfer,
}

/// Lifecycle status of a sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Paid and final.
    #[default]
    Completed,
    /// Cancelled after the fact.
    Voided,
}
