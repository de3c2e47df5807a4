//! Product rankings over per-product sales totals.

use std::cmp::Ordering;

use crate::domain::ProductSales;

pub const DEFAULT_TOP_N: usize = 10;

/// Product totals held in quantity order: highest first, ties by product id.
///
/// The order is re-established on construction so rankings never depend on
/// how the store sorted its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRankings {
    products: Vec<ProductSales>,
}

impl ProductRankings {
    pub fn new(mut products: Vec<ProductSales>) -> Self {
        products.sort_by(|left, right| {
            right
                .total_quantity
                .cmp(&left.total_quantity)
                .then_with(|| compare_ids(&left.product_id, &right.product_id))
        });
        Self { products }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn top_sellers(&self, n: usize) -> Vec<ProductSales> {
        self.products.iter().take(n).cloned().collect()
    }

    pub fn revenue_leaders(&self, n: usize) -> Vec<ProductSales> {
        let mut by_revenue = self.products.clone();
        by_revenue.sort_by(|left, right| {
            right
                .total_sales
                .total_cmp(&left.total_sales)
                .then_with(|| compare_ids(&left.product_id, &right.product_id))
        });
        by_revenue.truncate(n);
        by_revenue
    }

    /// Last `n` products that sold at least once, still in quantity order.
    pub fn bottom_sellers(&self, n: usize) -> Vec<ProductSales> {
        let sold = self
            .products
            .iter()
            .filter(|product| product.has_sales())
            .collect::<Vec<_>>();
        let skip = sold.len().saturating_sub(n);
        sold.into_iter().skip(skip).cloned().collect()
    }

    pub fn unsold_products(&self) -> Vec<ProductSales> {
        self.products
            .iter()
            .filter(|product| !product.has_sales())
            .cloned()
            .collect()
    }
}

/// Numeric ids compare numerically, anything else lexically after them.
fn compare_ids(left: &str, right: &str) -> Ordering {
    match (left.parse::<i64>(), right.parse::<i64>()) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => left.cmp(right),
    }
}
