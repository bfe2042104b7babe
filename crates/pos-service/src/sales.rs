//! Checkout recording.

use chrono::Utc;
use serde_json::Value;

use pos_core::lenient::{amount_to_json, parse_amount};
use pos_core::time::to_record_timestamp;
use pos_core::{keys, Cart, CheckoutDetails, Product, Sale, SessionUser};

use crate::error::{Result, ServiceError};
use crate::state::AppState;

impl AppState {
    /// A product by id.
    #[must_use]
    pub fn find_product(&self, id: &str) -> Option<Product> {
        self.store
            .find_one(keys::PRODUCTS, id)
            .and_then(|record| serde_json::from_value(Value::Object(record)).ok())
    }

    /// Add one unit of a product to `cart` at its selling price.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for an unknown product.
    pub fn add_to_cart(&self, cart: &mut Cart, product_id: &str) -> Result<()> {
        let product = self
            .find_product(product_id)
            .ok_or_else(|| ServiceError::NotFound(format!("product {product_id}")))?;
        cart.add_product(&product);
        Ok(())
    }

    /// Ring up `cart` as a completed sale by `cashier`.
    ///
    /// The sale is appended to `pos_transactions` and every sold product's
    /// `stok` is decremented in the same write, so either both land or
    /// neither does. Stock may go negative; lines for products that no
    /// longer exist are recorded without a stock change.
    ///
    /// # Errors
    ///
    /// Returns a core error for an empty cart or an invalid discount, or a
    /// storage error if the write is rejected.
    pub fn record_sale(
        &self,
        cashier: &SessionUser,
        cart: Cart,
        details: CheckoutDetails,
    ) -> Result<Sale> {
        let details = CheckoutDetails {
            cashier_id: cashier.id.clone(),
            ..details
        };
        let now = Utc::now();
        let sale = cart.into_sale(&details, &self.load_settings(), now)?;

        let Value::Object(record) =
            serde_json::to_value(&sale).map_err(pos_store::StoreError::from)?
        else {
            return Err(ServiceError::BadRequest("sale is not a JSON object".into()));
        };
        let stamp = to_record_timestamp(now);

        self.store
            .modify_collections(&[keys::TRANSACTIONS, keys::PRODUCTS], |collections| {
                collections[0].push(record);

                let products = &mut collections[1];
                for item in &sale.items {
                    let Some(product) = products
                        .iter_mut()
                        .find(|p| p.get("id").and_then(Value::as_str) == Some(item.product_id.as_str()))
                    else {
                        tracing::warn!(product_id = %item.product_id, "Sold product not in catalog");
                        continue;
                    };
                    let stok = product.get("stok").map_or(0.0, parse_amount);
                    product.insert("stok".into(), amount_to_json(stok - item.quantity));
                    product.insert("updatedAt".into(), Value::String(stamp.clone()));
                }
            })?;

        tracing::info!(
            invoice = %sale.invoice_no,
            total = sale.total,
            items = sale.items.len(),
            cashier = %cashier.id,
            "Sale recorded"
        );
        Ok(sale)
    }

    /// Every recorded sale.
    #[must_use]
    pub fn sales(&self) -> Vec<Sale> {
        self.store.get_all_as(keys::TRANSACTIONS)
    }
}
