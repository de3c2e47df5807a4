use statlite_warehouse::{QueryResult, Warehouse, WarehouseError};

/// Per-product totals, zero-filled for products that never sold.
pub const PRODUCTS_QUERY: &str = "SELECT product_id, product_name, total_quantity, total_sales \
     FROM vw_product_sales ORDER BY total_quantity DESC, product_id";

/// Every sale line, including sales without detail lines.
pub const SALES_QUERY: &str = "SELECT transaction_id, card_id, product_id, quantity, price, \
     transaction_date, transaction_time FROM vw_sale_lines";

/// Read side of the relational store the dashboard pulls from.
///
/// Implementations run one read-only query and return the full result set.
/// A result with `truncated` set is treated as a failure by the callers.
pub trait DataSource {
    fn run_query(&self, sql: &str) -> Result<QueryResult, WarehouseError>;
}

impl DataSource for Warehouse {
    fn run_query(&self, sql: &str) -> Result<QueryResult, WarehouseError> {
        self.fetch(sql)
    }
}

impl<S: DataSource + ?Sized> DataSource for &S {
    fn run_query(&self, sql: &str) -> Result<QueryResult, WarehouseError> {
        (**self).run_query(sql)
    }
}
