//! Product catalog management.
//!
//! Super admins, admins and managers create, edit and delete products.
//! Prices come from form text with `.` thousands separators; stock levels are
//! whole numbers.

use serde::Deserialize;
use serde_json::Value;

use pos_core::lenient::{amount_to_json, parse_count, parse_grouped_amount};
use pos_core::{generate_id, keys, Product, SessionUser};
use pos_store::{Record, StoreError};

use crate::error::{Result, ServiceError};
use crate::state::AppState;

/// Product form fields for [`AppState::create_product`] and
/// [`AppState::update_product`].
///
/// Prices accept numbers or text such as `"50.000"`; `stok` and `minStok`
/// keep their leading integer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    /// Stock keeping unit code. Required.
    pub sku: String,
    /// Barcode.
    #[serde(default)]
    pub barcode: String,
    /// Display name. Required.
    pub nama: String,
    /// Category name. Required.
    pub kategori: String,
    /// Purchase price.
    #[serde(default)]
    pub harga_beli: Value,
    /// Selling price.
    #[serde(default)]
    pub harga_jual: Value,
    /// Units on hand.
    #[serde(default)]
    pub stok: Value,
    /// Low-stock threshold.
    #[serde(default)]
    pub min_stok: Value,
    /// Unit label.
    #[serde(default)]
    pub satuan: String,
    /// Free-form description.
    #[serde(default)]
    pub deskripsi: String,
}

impl ProductInput {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("sku", &self.sku),
            ("nama", &self.nama),
            ("kategori", &self.kategori),
        ] {
            if value.trim().is_empty() {
                return Err(ServiceError::BadRequest(format!("{field} is required")));
            }
        }
        Ok(())
    }

    fn into_record(self) -> Record {
        let mut record = Record::new();
        for (field, text) in [
            ("sku", self.sku),
            ("barcode", self.barcode),
            ("nama", self.nama),
            ("kategori", self.kategori),
            ("satuan", self.satuan),
            ("deskripsi", self.deskripsi),
        ] {
            record.insert(field.into(), Value::String(text.trim().to_string()));
        }
        record.insert("hargaBeli".into(), amount_to_json(parse_grouped_amount(&self.harga_beli)));
        record.insert("hargaJual".into(), amount_to_json(parse_grouped_amount(&self.harga_jual)));
        record.insert("stok".into(), amount_to_json(parse_count(&self.stok)));
        record.insert("minStok".into(), amount_to_json(parse_count(&self.min_stok)));
        record
    }
}

pub(crate) fn require_inventory(actor: &SessionUser) -> Result<()> {
    if actor.role.can_manage_inventory() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}

fn to_product(record: Record) -> Result<Product> {
    Ok(serde_json::from_value(Value::Object(record)).map_err(StoreError::from)?)
}

impl AppState {
    /// Every product in the catalog.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.store.get_all_as(keys::PRODUCTS)
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` manages inventory,
    /// [`ServiceError::BadRequest`] for a missing SKU, name or category, or a
    /// storage error.
    pub fn create_product(&self, actor: &SessionUser, input: ProductInput) -> Result<Product> {
        require_inventory(actor)?;
        input.validate()?;

        let mut record = input.into_record();
        record.insert("id".into(), Value::String(generate_id()));
        let product = to_product(self.store.add_one(keys::PRODUCTS, &record)?)?;

        tracing::info!(product_id = %product.id, sku = %product.sku, by = %actor.id, "Product created");
        Ok(product)
    }

    /// Replace a product's form fields. Its id and `createdAt` are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` manages inventory,
    /// [`ServiceError::BadRequest`] for a missing SKU, name or category,
    /// [`ServiceError::NotFound`] for an unknown product, or a storage error.
    pub fn update_product(&self, actor: &SessionUser, id: &str, input: ProductInput) -> Result<Product> {
        require_inventory(actor)?;
        input.validate()?;

        let merged = self
            .store
            .update_one(keys::PRODUCTS, id, input.into_record())?
            .ok_or_else(|| ServiceError::NotFound(format!("product {id}")))?;
        let product = to_product(merged)?;

        tracing::info!(product_id = %id, by = %actor.id, "Product updated");
        Ok(product)
    }

    /// Delete a product. Past sales keep their lines for it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` manages inventory,
    /// [`ServiceError::NotFound`] for an unknown product, or a storage error.
    pub fn delete_product(&self, actor: &SessionUser, id: &str) -> Result<()> {
        require_inventory(actor)?;
        if self.store.find_one(keys::PRODUCTS, id).is_none() {
            return Err(ServiceError::NotFound(format!("product {id}")));
        }
        self.store.delete_one(keys::PRODUCTS, id)?;

        tracing::info!(product_id = %id, by = %actor.id, "Product deleted");
        Ok(())
    }
}
