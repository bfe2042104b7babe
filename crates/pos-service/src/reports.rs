//! Report queries over the stored collections.
//!
//! Every role sees sales, best sellers and cashier figures. Profit,
//! inventory value and the dashboard need [`Role::can_view_financials`].
//!
//! [`Role::can_view_financials`]: pos_core::Role::can_view_financials

use chrono::NaiveDate;
use serde::Serialize;

use pos_core::report::{
    self, filter_sales, CashierPerformance, DailyStats, DateRange, ProductRanking, ProductSales,
    ProfitLoss, SalesSummary,
};
use pos_core::{keys, Product, Sale, SessionUser, User};

use crate::error::{Result, ServiceError};
use crate::state::AppState;

/// Days shown in the dashboard sales trend.
pub const TREND_DAYS: u32 = 7;

/// Products shown in the dashboard best-seller list.
pub const DASHBOARD_TOP_PRODUCTS: usize = 5;

/// Recent sales shown on the dashboard.
pub const DASHBOARD_RECENT_SALES: usize = 5;

/// Dashboard figures for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// The day's sales, transactions, items and profit.
    pub today: DailyStats,
    /// Daily sales totals for the trailing week, oldest first.
    pub trend: Vec<(NaiveDate, f64)>,
    /// Best sellers by units, all time.
    pub top_products: Vec<ProductSales>,
    /// The day's latest sales, newest first.
    pub recent_sales: Vec<Sale>,
    /// Products at or below minimum stock.
    pub low_stock: Vec<Product>,
    /// Number of products in the catalog.
    pub product_count: usize,
}

fn require_financials(actor: &SessionUser) -> Result<()> {
    if actor.role.can_view_financials() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}

fn in_range(sales: &[Sale], range: &DateRange) -> Vec<Sale> {
    filter_sales(sales, range).into_iter().cloned().collect()
}

impl AppState {
    /// Dashboard for `day`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` may view financials.
    pub fn dashboard(&self, actor: &SessionUser, day: NaiveDate) -> Result<Dashboard> {
        require_financials(actor)?;
        let sales = self.sales();
        let products = self.products();

        let mut recent: Vec<Sale> = sales
            .iter()
            .filter(|sale| sale.occurred_at().map(|at| at.date_naive()) == Some(day))
            .cloned()
            .collect();
        recent.reverse();
        recent.truncate(DASHBOARD_RECENT_SALES);

        Ok(Dashboard {
            today: report::daily_stats(&sales, &products, day),
            trend: report::sales_trend(&sales, day, TREND_DAYS),
            top_products: report::top_products(
                &sales,
                &products,
                ProductRanking::Quantity,
                DASHBOARD_TOP_PRODUCTS,
            ),
            recent_sales: recent,
            low_stock: report::low_stock(&products).into_iter().cloned().collect(),
            product_count: products.len(),
        })
    }

    /// Sales total, count, average and daily totals inside `range`.
    #[must_use]
    pub fn sales_report(&self, range: &DateRange) -> SalesSummary {
        report::sales_summary(&self.sales(), range)
    }

    /// Best sellers inside `range`.
    #[must_use]
    pub fn top_products(
        &self,
        range: &DateRange,
        ranking: ProductRanking,
        limit: usize,
    ) -> Vec<ProductSales> {
        let sales = in_range(&self.sales(), range);
        report::top_products(&sales, &self.products(), ranking, limit)
    }

    /// Sales per cashier inside `range`, highest total first.
    #[must_use]
    pub fn cashier_performance(&self, range: &DateRange) -> Vec<CashierPerformance> {
        let sales = in_range(&self.sales(), range);
        let users: Vec<User> = self.store.get_all_as(keys::USERS);
        report::cashier_performance(&sales, &users)
    }

    /// Profit and loss inside `range`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` may view financials.
    pub fn profit_loss(&self, actor: &SessionUser, range: &DateRange) -> Result<ProfitLoss> {
        require_financials(actor)?;
        Ok(report::profit_loss(
            &self.sales(),
            &self.products(),
            &self.expenses(),
            range,
        ))
    }

    /// Stock on hand valued at purchase price.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` may view financials.
    pub fn inventory_value(&self, actor: &SessionUser) -> Result<f64> {
        require_financials(actor)?;
        Ok(report::inventory_value(&self.products()))
    }
}
