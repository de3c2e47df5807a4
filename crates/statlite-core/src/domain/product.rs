use serde::Serialize;

/// Sales totals for one catalog product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub product_id: String,
    pub product_name: String,
    pub total_quantity: i64,
    pub total_sales: f64,
}

impl ProductSales {
    pub fn has_sales(&self) -> bool {
        self.total_quantity != 0
    }
}
