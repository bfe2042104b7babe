//! Gross and net profit.
//!
//! Pure functions over already-loaded sales, products and expenses. Cost of
//! goods is taken from the *current* product purchase price; a sale line
//! whose product no longer exists still counts as revenue but costs nothing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Expense, Product, Sale};

/// Revenue, cost of goods and gross profit over a set of sales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitSummary {
    /// Sum of line revenue.
    pub total_revenue: f64,
    /// Sum of `hargaBeli × quantity` over lines whose product is known.
    pub total_cost: f64,
    /// `total_revenue - total_cost`.
    pub gross_profit: f64,
}

/// Index products by id. The first product with a given id wins.
pub(crate) fn product_index(products: &[Product]) -> HashMap<&str, &Product> {
    let mut index = HashMap::with_capacity(products.len());
    for product in products {
        index.entry(product.id.as_str()).or_insert(product);
    }
    index
}

/// Compute revenue, cost and gross profit.
#[must_use]
pub fn calculate_profit(sales: &[Sale], products: &[Product]) -> ProfitSummary {
    let index = product_index(products);
    let mut summary = ProfitSummary::default();

    for item in sales.iter().flat_map(|sale| &sale.items) {
        summary.total_revenue += item.revenue();
        if let Some(product) = index.get(item.product_id.as_str()) {
            summary.total_cost += product.harga_beli * item.quantity;
        }
    }

    summary.gross_profit = summary.total_revenue - summary.total_cost;
    summary
}

/// Sum of expense amounts.
#[must_use]
pub fn total_expenses(expenses: &[Expense]) -> f64 {
    expenses.iter().map(Expense::value).sum()
}

/// Gross profit minus expenses.
#[must_use]
pub fn calculate_net_profit(gross_profit: f64, expenses: &[Expense]) -> f64 {
    gross_profit - total_expenses(expenses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};

    fn parse<T: DeserializeOwned>(value: Value) -> Vec<T> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn profit_from_subtotal_and_purchase_price() {
        let products: Vec<Product> = parse(json!([{"id": "P1", "hargaBeli": 50000}]));
        let sales: Vec<Sale> = parse(json!([
            {"items": [{"productId": "P1", "quantity": 3, "subtotal": 225000}]}
        ]));

        let summary = calculate_profit(&sales, &products);

        assert_eq!(summary.total_revenue, 225_000.0);
        assert_eq!(summary.total_cost, 150_000.0);
        assert_eq!(summary.gross_profit, 75_000.0);
    }

    #[test]
    fn net_profit_subtracts_both_amount_fields() {
        let expenses: Vec<Expense> = parse(json!([{"jumlah": 20000}, {"amount": 5000}]));
        assert_eq!(calculate_net_profit(75_000.0, &expenses), 50_000.0);
    }

    #[test]
    fn deleted_product_adds_revenue_only() {
        let products: Vec<Product> = parse(json!([{"id": "P1", "hargaBeli": 50000}]));
        let sales: Vec<Sale> = parse(json!([
            {"items": [{"productId": "GONE", "quantity": 2, "subtotal": 10000}]}
        ]));

        let summary = calculate_profit(&sales, &products);

        assert_eq!(summary.total_revenue, 10_000.0);
        assert_eq!(summary.total_cost, 0.0);
        assert_eq!(summary.gross_profit, 10_000.0);
    }

    #[test]
    fn string_quantities_and_prices_are_parsed() {
        let products: Vec<Product> = parse(json!([{"id": "P1", "hargaBeli": "1000"}]));
        let sales: Vec<Sale> = parse(json!([
            {"items": [{"productId": "P1", "quantity": "4", "harga": 1500}]},
            {"items": null}
        ]));

        let summary = calculate_profit(&sales, &products);

        assert_eq!(summary.total_revenue, 6000.0);
        assert_eq!(summary.total_cost, 4000.0);
    }

    #[test]
    fn duplicate_product_ids_use_first() {
        let products: Vec<Product> = parse(json!([
            {"id": "P1", "hargaBeli": 10},
            {"id": "P1", "hargaBeli": 99}
        ]));
        let sales: Vec<Sale> = parse(json!([
            {"items": [{"productId": "P1", "quantity": 1, "subtotal": 20}]}
        ]));

        assert_eq!(calculate_profit(&sales, &products).total_cost, 10.0);
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(calculate_profit(&[], &[]), ProfitSummary::default());
        assert_eq!(calculate_net_profit(100.0, &[]), 100.0);
    }
}
