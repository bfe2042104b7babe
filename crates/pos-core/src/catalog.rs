//! Catalog types: products and customers.

use serde::{Deserialize, Serialize};

use crate::lenient;

/// A product in the catalog.
///
/// Prices are per unit: `harga_beli` is the purchase (cost) price,
/// `harga_jual` the selling price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Record id.
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,

    /// Stock keeping unit code.
    #[serde(default, deserialize_with = "lenient::text")]
    pub sku: String,

    /// Barcode.
    #[serde(default, deserialize_with = "lenient::text")]
    pub barcode: String,

    /// Display name.
    #[serde(default, deserialize_with = "lenient::text")]
    pub nama: String,

    /// Category name.
    #[serde(default, deserialize_with = "lenient::text")]
    pub kategori: String,

    /// Purchase price per unit.
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::write_amount"
    )]
    pub harga_beli: f64,

    /// Selling price per unit.
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::write_amount"
    )]
    pub harga_jual: f64,

    /// Units on hand.
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::write_amount"
    )]
    pub stok: f64,

    /// Threshold at or below which the product counts as low on stock.
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::write_amount"
    )]
    pub min_stok: f64,

    /// Unit label ("Pcs", "Kg", ...).
    #[serde(default, deserialize_with = "lenient::text")]
    pub satuan: String,

    /// Free-form description.
    #[serde(default, deserialize_with = "lenient::text")]
    pub deskripsi: String,

    /// Creation timestamp.
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,

    /// Last update timestamp.
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,
}

impl Product {
    /// Whether stock is at or below the minimum.
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.stok <= self.min_stok
    }

    /// Value of the stock on hand at purchase price.
    #[must_use]
    pub fn stock_value(&self) -> f64 {
        self.harga_beli * self.stok
    }
}

/// A customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Record id.
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,

    /// Name.
    #[serde(default, deserialize_with = "lenient::text")]
    pub nama: String,

    /// Phone number.
    #[serde(default, deserialize_with = "lenient::text")]
    pub no_telepon: String,

    /// Email address.
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: String,

    /// Postal address.
    #[serde(default, deserialize_with = "lenient::text")]
    pub alamat: String,

    /// Loyalty points.
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::write_amount"
    )]
    pub poin: f64,

    /// Creation timestamp.
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,

    /// Last update timestamp.
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,
}
