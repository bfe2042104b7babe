//! Cart and checkout arithmetic.
//!
//! Totals follow the till:
//!
//! ```text
//! subtotal = Σ quantity × harga
//! discount = subtotal × pct / 100   (percentage)
//!          | value                  (nominal)
//!          | 0                      (no discount, or empty subtotal)
//! tax      = (subtotal - discount) × taxRate / 100   when tax is enabled
//! total    = subtotal - discount + tax
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{generate_id, generate_invoice_no};
use crate::sale::{Payment, PaymentMethod, Sale, SaleItem, SaleStatus};
use crate::time::to_record_timestamp;
use crate::{CoreError, Product, Result, Settings};

/// One product line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product id.
    pub product_id: String,
    /// Product name.
    pub nama: String,
    /// Unit selling price.
    pub harga: f64,
    /// Units.
    pub quantity: f64,
}

impl CartLine {
    /// `quantity × harga`.
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.quantity * self.harga
    }
}

/// A discount on the cart subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// Percent of the subtotal.
    Percentage(f64),
    /// Fixed amount.
    Nominal(f64),
}

impl Discount {
    /// The stored name of the discount kind.
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            Self::Percentage(_) => "percentage",
            Self::Nominal(_) => "nominal",
        }
    }

    /// Discount amount for a subtotal. Always `0` on an empty subtotal.
    #[must_use]
    pub fn amount(self, subtotal: f64) -> f64 {
        if subtotal == 0.0 {
            return 0.0;
        }
        match self {
            Self::Percentage(pct) => subtotal * pct / 100.0,
            Self::Nominal(value) => value,
        }
    }

    fn validate(self) -> Result<()> {
        let (Self::Percentage(v) | Self::Nominal(v)) = self;
        if !v.is_finite() || v < 0.0 {
            return Err(CoreError::InvalidAmount(format!("discount {v}")));
        }
        Ok(())
    }
}

/// Subtotal, discount, tax and total of a cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Sum of line subtotals.
    pub subtotal: f64,
    /// Discount.
    pub discount: f64,
    /// Tax.
    pub tax: f64,
    /// Amount due.
    pub total: f64,
}

/// Who is paying and how.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutDetails {
    /// Customer, if any.
    pub customer_id: Option<String>,
    /// The cashier ringing up the sale.
    pub cashier_id: String,
    /// Payment method for the full total.
    pub payment_method: PaymentMethod,
    /// Discount, if any.
    pub discount: Option<Discount>,
}

/// A cart being rung up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines in the order they were added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of a product, starting a new line if needed.
    pub fn add_product(&mut self, product: &Product) {
        if let Some(line) = self.line_mut(&product.id) {
            line.quantity += 1.0;
        } else {
            self.lines.push(CartLine {
                product_id: product.id.clone(),
                nama: product.nama.clone(),
                harga: product.harga_jual,
                quantity: 1.0,
            });
        }
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuantity`] for a non-finite quantity.
    pub fn set_quantity(&mut self, product_id: &str, quantity: f64) -> Result<()> {
        if !quantity.is_finite() {
            return Err(CoreError::InvalidQuantity {
                product_id: product_id.to_string(),
                quantity,
            });
        }
        if quantity <= 0.0 {
            self.remove(product_id);
        } else if let Some(line) = self.line_mut(product_id) {
            line.quantity = quantity;
        }
        Ok(())
    }

    /// Change a line's quantity by `delta`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuantity`] if the result is not finite.
    pub fn change_quantity(&mut self, product_id: &str, delta: f64) -> Result<()> {
        let Some(current) = self.line_mut(product_id).map(|line| line.quantity) else {
            return Ok(());
        };
        self.set_quantity(product_id, current + delta)
    }

    /// Drop a line.
    pub fn remove(&mut self, product_id: &str) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Totals under the given discount and settings.
    #[must_use]
    pub fn totals(&self, discount: Option<Discount>, settings: &Settings) -> CartTotals {
        let subtotal = self.subtotal();
        let discount = discount.map_or(0.0, |d| d.amount(subtotal));
        let tax = (subtotal - discount) * settings.effective_tax_rate() / 100.0;
        CartTotals {
            subtotal,
            discount,
            tax,
            total: subtotal - discount + tax,
        }
    }

    /// Turn the cart into a completed sale paid in full.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyCart`] for an empty cart and
    /// [`CoreError::InvalidAmount`] for a negative or non-finite discount.
    pub fn into_sale(
        self,
        details: &CheckoutDetails,
        settings: &Settings,
        now: DateTime<Utc>,
    ) -> Result<Sale> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        if let Some(discount) = details.discount {
            discount.validate()?;
        }

        let totals = self.totals(details.discount, settings);
        let items = self
            .lines
            .into_iter()
            .map(|line| SaleItem {
                subtotal: Some(line.subtotal()),
                product_id: line.product_id,
                nama: line.nama,
                harga: Some(line.harga),
                price: None,
                quantity: line.quantity,
            })
            .collect();

        Ok(Sale {
            id: generate_id(),
            invoice_no: generate_invoice_no(now),
            customer_id: details.customer_id.clone(),
            items,
            subtotal: totals.subtotal,
            discount: totals.discount,
            discount_type: Some(
                details
                    .discount
                    .map_or("percentage", Discount::kind)
                    .to_string(),
            ),
            tax: totals.tax,
            total: totals.total,
            payments: vec![Payment {
                method: details.payment_method,
                amount: totals.total,
            }],
            cashier_id: Some(details.cashier_id.clone()),
            created_at: Some(to_record_timestamp(now)),
            status: SaleStatus::Completed,
        })
    }

    fn line_mut(&mut self, product_id: &str) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }
}
