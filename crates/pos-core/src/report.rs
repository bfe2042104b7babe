//! Report aggregations: sales summary, profit and loss, product and cashier
//! rankings, and the per-day dashboard figures.
//!
//! All functions are pure. Dates are grouped by UTC calendar day.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::finance::{calculate_net_profit, calculate_profit, product_index, total_expenses};
use crate::{Expense, Product, Sale, User};

// ============================================================================
// Date filtering
// ============================================================================

/// An optional, inclusive time window.
///
/// Records without a readable date always pass the filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Earliest instant included.
    pub start: Option<DateTime<Utc>>,
    /// Latest instant included.
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// A range with no bounds.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Whole UTC days from `first` through `last`.
    #[must_use]
    pub fn days(first: Option<NaiveDate>, last: Option<NaiveDate>) -> Self {
        Self {
            start: first.and_then(|day| day.and_hms_opt(0, 0, 0)).map(utc),
            end: last
                .and_then(|day| day.and_hms_milli_opt(23, 59, 59, 999))
                .map(utc),
        }
    }

    /// Whether the range has neither bound.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether a record dated `at` falls inside the range.
    #[must_use]
    pub fn contains(&self, at: Option<DateTime<Utc>>) -> bool {
        let Some(at) = at else {
            return true;
        };
        self.start.map_or(true, |start| at >= start) && self.end.map_or(true, |end| at <= end)
    }
}

fn utc(naive: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&naive)
}

/// Sales made within the range.
#[must_use]
pub fn filter_sales<'a>(sales: &'a [Sale], range: &DateRange) -> Vec<&'a Sale> {
    sales
        .iter()
        .filter(|sale| range.is_unbounded() || range.contains(sale.occurred_at()))
        .collect()
}

/// Expenses incurred within the range.
#[must_use]
pub fn filter_expenses<'a>(expenses: &'a [Expense], range: &DateRange) -> Vec<&'a Expense> {
    expenses
        .iter()
        .filter(|expense| range.is_unbounded() || range.contains(expense.occurred_at()))
        .collect()
}

// ============================================================================
// Sales summary
// ============================================================================

/// Totals over a set of sales.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    /// Sum of sale totals.
    pub total: f64,
    /// Number of sales.
    pub count: usize,
    /// `total / count`, `0` when there are no sales.
    pub average: f64,
    /// Sale totals per UTC day. Undated sales are left out.
    pub daily: BTreeMap<NaiveDate, f64>,
}

/// Summarize the sales inside `range`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sales_summary(sales: &[Sale], range: &DateRange) -> SalesSummary {
    let filtered = filter_sales(sales, range);
    let mut summary = SalesSummary {
        count: filtered.len(),
        ..SalesSummary::default()
    };

    for sale in filtered {
        summary.total += sale.total;
        if let Some(at) = sale.occurred_at() {
            *summary.daily.entry(at.date_naive()).or_default() += sale.total;
        }
    }

    if summary.count > 0 {
        summary.average = summary.total / summary.count as f64;
    }
    summary
}

/// Sale totals for the `days` UTC days ending with `last`, oldest first.
///
/// Days without sales are present with a zero total.
#[must_use]
pub fn sales_trend(sales: &[Sale], last: NaiveDate, days: u32) -> Vec<(NaiveDate, f64)> {
    let mut totals: BTreeMap<NaiveDate, f64> = (0..days)
        .filter_map(|back| last.checked_sub_days(Days::new(u64::from(back))))
        .map(|day| (day, 0.0))
        .collect();

    for sale in sales {
        if let Some(total) = sale
            .occurred_at()
            .and_then(|at| totals.get_mut(&at.date_naive()))
        {
            *total += sale.total;
        }
    }

    totals.into_iter().collect()
}

// ============================================================================
// Profit and loss
// ============================================================================

/// Profit and loss over a range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitLoss {
    /// Line revenue.
    pub revenue: f64,
    /// Cost of goods sold.
    pub cost: f64,
    /// `revenue - cost`.
    pub gross_profit: f64,
    /// Expenses within the range.
    pub total_expenses: f64,
    /// `gross_profit - total_expenses`.
    pub net_profit: f64,
}

/// Compute profit and loss for the sales and expenses inside `range`.
#[must_use]
pub fn profit_loss(
    sales: &[Sale],
    products: &[Product],
    expenses: &[Expense],
    range: &DateRange,
) -> ProfitLoss {
    let sales: Vec<Sale> = filter_sales(sales, range).into_iter().cloned().collect();
    let expenses: Vec<Expense> = filter_expenses(expenses, range)
        .into_iter()
        .cloned()
        .collect();

    let gross = calculate_profit(&sales, products);
    ProfitLoss {
        revenue: gross.total_revenue,
        cost: gross.total_cost,
        gross_profit: gross.gross_profit,
        total_expenses: total_expenses(&expenses),
        net_profit: calculate_net_profit(gross.gross_profit, &expenses),
    }
}

/// Value of all stock on hand at purchase price.
#[must_use]
pub fn inventory_value(products: &[Product]) -> f64 {
    products.iter().map(Product::stock_value).sum()
}

/// Products at or below their minimum stock.
#[must_use]
pub fn low_stock(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.is_low_stock()).collect()
}

// ============================================================================
// Rankings
// ============================================================================

/// How to rank products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductRanking {
    /// By line revenue.
    Revenue,
    /// By units sold.
    Quantity,
}

/// Units and revenue sold for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    /// Product id.
    pub product_id: String,
    /// Current product name.
    pub nama: String,
    /// Units sold.
    pub quantity: f64,
    /// Revenue.
    pub revenue: f64,
}

/// Best-selling products, highest first, at most `limit` entries.
///
/// Lines for products no longer in the catalog are dropped.
#[must_use]
pub fn top_products(
    sales: &[Sale],
    products: &[Product],
    ranking: ProductRanking,
    limit: usize,
) -> Vec<ProductSales> {
    let index = product_index(products);
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, ProductSales> = HashMap::new();

    for item in sales.iter().flat_map(|sale| &sale.items) {
        let Some(product) = index.get(item.product_id.as_str()) else {
            continue;
        };
        let entry = totals.entry(item.product_id.as_str()).or_insert_with(|| {
            order.push(item.product_id.as_str());
            ProductSales {
                product_id: product.id.clone(),
                nama: product.nama.clone(),
                quantity: 0.0,
                revenue: 0.0,
            }
        });
        entry.quantity += item.quantity;
        entry.revenue += item.revenue();
    }

    let mut ranked: Vec<ProductSales> = order
        .into_iter()
        .filter_map(|id| totals.remove(id))
        .collect();
    ranked.sort_by(|a, b| match ranking {
        ProductRanking::Revenue => descending(a.revenue, b.revenue),
        ProductRanking::Quantity => descending(a.quantity, b.quantity),
    });
    ranked.truncate(limit);
    ranked
}

/// Sales handled by one cashier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashierPerformance {
    /// User id.
    pub cashier_id: String,
    /// User name.
    pub nama: String,
    /// Number of sales.
    pub count: usize,
    /// Sum of sale totals.
    pub total: f64,
}

/// Sales count and total per cashier, highest total first.
///
/// Sales whose cashier is not a known user are left out.
#[must_use]
pub fn cashier_performance(sales: &[Sale], users: &[User]) -> Vec<CashierPerformance> {
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, CashierPerformance> = HashMap::new();

    for sale in sales {
        let Some(cashier) = sale
            .cashier_id
            .as_deref()
            .and_then(|id| users.iter().find(|u| u.id == id))
        else {
            continue;
        };
        let entry = totals.entry(cashier.id.as_str()).or_insert_with(|| {
            order.push(cashier.id.as_str());
            CashierPerformance {
                cashier_id: cashier.id.clone(),
                nama: cashier.nama.clone(),
                count: 0,
                total: 0.0,
            }
        });
        entry.count += 1;
        entry.total += sale.total;
    }

    let mut ranked: Vec<CashierPerformance> = order
        .into_iter()
        .filter_map(|id| totals.remove(id))
        .collect();
    ranked.sort_by(|a, b| descending(a.total, b.total));
    ranked
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

// ============================================================================
// Dashboard
// ============================================================================

/// Figures for a single UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// The day.
    pub date: NaiveDate,
    /// Sum of sale totals.
    pub sales: f64,
    /// Number of sales.
    pub transactions: usize,
    /// Units sold.
    pub items_sold: f64,
    /// Sale totals minus cost of goods.
    pub profit: f64,
}

/// Dashboard figures for `day`.
#[must_use]
pub fn daily_stats(sales: &[Sale], products: &[Product], day: NaiveDate) -> DailyStats {
    let index = product_index(products);
    let mut stats = DailyStats {
        date: day,
        sales: 0.0,
        transactions: 0,
        items_sold: 0.0,
        profit: 0.0,
    };

    let todays = sales
        .iter()
        .filter(|sale| sale.occurred_at().map(|at| at.date_naive()) == Some(day));
    for sale in todays {
        let cost: f64 = sale
            .items
            .iter()
            .map(|item| {
                index
                    .get(item.product_id.as_str())
                    .map_or(0.0, |p| p.harga_beli * item.quantity)
            })
            .sum();

        stats.sales += sale.total;
        stats.transactions += 1;
        stats.items_sold += sale.items_sold();
        stats.profit += sale.total - cost;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};

    fn parse<T: DeserializeOwned>(value: Value) -> Vec<T> {
        serde_json::from_value(value).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn products() -> Vec<Product> {
        parse(json!([
            {"id": "P1", "nama": "Kopi", "hargaBeli": 1000, "stok": 5, "minStok": 10},
            {"id": "P2", "nama": "Teh", "hargaBeli": 500, "stok": 50, "minStok": 10}
        ]))
    }

    fn sales() -> Vec<Sale> {
        parse(json!([
            {
                "id": "T1", "cashierId": "U1", "total": 3000,
                "createdAt": "2024-03-01T09:00:00.000Z",
                "items": [{"productId": "P1", "quantity": 2, "subtotal": 3000}]
            },
            {
                "id": "T2", "cashierId": "U2", "total": 8000,
                "createdAt": "2024-03-02T09:00:00.000Z",
                "items": [
                    {"productId": "P2", "quantity": 10, "subtotal": 7000},
                    {"productId": "GONE", "quantity": 1, "subtotal": 1000}
                ]
            },
            {
                "id": "T3", "cashierId": "GHOST", "total": 1500,
                "createdAt": "2024-03-02T23:59:59.999Z",
                "items": [{"productId": "P1", "quantity": 1, "subtotal": 1500}]
            }
        ]))
    }

    #[test]
    fn range_is_inclusive_by_whole_day() {
        let range = DateRange::days(Some(day(2024, 3, 2)), Some(day(2024, 3, 2)));
        let all = sales();
        let ids: Vec<&str> = filter_sales(&all, &range)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, ["T2", "T3"]);
    }

    #[test]
    fn end_day_counts_until_midnight() {
        let sales: Vec<Sale> = parse(json!([
            {"id": "late", "total": 1, "createdAt": "2024-03-05T23:59:00.000Z"},
            {"id": "next", "total": 1, "createdAt": "2024-03-06T00:00:00.000Z"},
            {"id": "before", "total": 1, "createdAt": "2024-02-29T23:59:59.999Z"}
        ]));
        let range = DateRange::days(Some(day(2024, 3, 1)), Some(day(2024, 3, 5)));

        let ids: Vec<&str> = filter_sales(&sales, &range)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, ["late"]);
        assert!(range.contains(Some(utc(day(2024, 3, 5).and_hms_opt(23, 59, 59).unwrap()))));
    }

    #[test]
    fn undated_records_pass_filter() {
        let expenses: Vec<Expense> = parse(json!([{"jumlah": 10}, {"jumlah": 20, "tanggal": "2020-01-01"}]));
        let range = DateRange::days(Some(day(2024, 1, 1)), None);
        assert_eq!(filter_expenses(&expenses, &range).len(), 1);
    }

    #[test]
    fn summary_groups_by_day() {
        let summary = sales_summary(&sales(), &DateRange::all());

        assert_eq!(summary.count, 3);
        assert_eq!(summary.total, 12_500.0);
        assert!((summary.average - 12_500.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.daily[&day(2024, 3, 1)], 3000.0);
        assert_eq!(summary.daily[&day(2024, 3, 2)], 9500.0);
    }

    #[test]
    fn empty_summary_has_zero_average() {
        assert_eq!(sales_summary(&[], &DateRange::all()).average, 0.0);
    }

    #[test]
    fn trend_fills_missing_days() {
        let trend = sales_trend(&sales(), day(2024, 3, 3), 3);
        assert_eq!(
            trend,
            vec![
                (day(2024, 3, 1), 3000.0),
                (day(2024, 3, 2), 9500.0),
                (day(2024, 3, 3), 0.0)
            ]
        );
    }

    #[test]
    fn profit_loss_over_range() {
        let expenses: Vec<Expense> = parse(json!([
            {"jumlah": 500, "tanggal": "2024-03-01"},
            {"jumlah": 9999, "tanggal": "2024-04-01"}
        ]));
        let range = DateRange::days(Some(day(2024, 3, 1)), Some(day(2024, 3, 1)));

        let pl = profit_loss(&sales(), &products(), &expenses, &range);

        assert_eq!(pl.revenue, 3000.0);
        assert_eq!(pl.cost, 2000.0);
        assert_eq!(pl.gross_profit, 1000.0);
        assert_eq!(pl.total_expenses, 500.0);
        assert_eq!(pl.net_profit, 500.0);
    }

    #[test]
    fn inventory_and_low_stock() {
        let products = products();
        assert_eq!(inventory_value(&products), 30_000.0);
        let low: Vec<&str> = low_stock(&products).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(low, ["P1"]);
    }

    #[test]
    fn top_products_by_revenue_and_quantity() {
        let by_revenue = top_products(&sales(), &products(), ProductRanking::Revenue, 10);
        assert_eq!(by_revenue.len(), 2);
        assert_eq!(by_revenue[0].product_id, "P2");
        assert_eq!(by_revenue[1].quantity, 3.0);
        assert_eq!(by_revenue[1].revenue, 4500.0);

        let by_quantity = top_products(&sales(), &products(), ProductRanking::Quantity, 1);
        assert_eq!(by_quantity.len(), 1);
        assert_eq!(by_quantity[0].nama, "Teh");
    }

    #[test]
    fn cashier_performance_skips_unknown_users() {
        let users: Vec<User> = parse(json!([
            {"id": "U1", "username": "a", "nama": "Ani"},
            {"id": "U2", "username": "b", "nama": "Budi"}
        ]));

        let perf = cashier_performance(&sales(), &users);

        assert_eq!(perf.len(), 2);
        assert_eq!(perf[0].nama, "Budi");
        assert_eq!(perf[0].total, 8000.0);
        assert_eq!(perf[1].count, 1);
    }

    #[test]
    fn daily_stats_profit_uses_sale_total() {
        let stats = daily_stats(&sales(), &products(), day(2024, 3, 2));

        assert_eq!(stats.transactions, 2);
        assert_eq!(stats.sales, 9500.0);
        assert_eq!(stats.items_sold, 12.0);
        // 8000 - 10*500, plus 1500 - 1*1000
        assert_eq!(stats.profit, 3500.0);
    }
}
