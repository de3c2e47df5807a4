//! Database views backing the dashboard queries.

use ::duckdb::Connection;

/// Create the views the dashboard reads from.
///
/// - `vw_product_sales`: quantity and revenue totals per product, zero for
///   products that never sold
/// - `vw_sale_lines`: one row per sale line; sales without detail lines keep
///   a single row with null product columns
///
/// Date and time columns are exposed as text so that the analytics layer owns
/// their parsing.
///
/// # Errors
/// Returns an error if the view creation SQL fails to execute.
pub fn create_views(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r"
CREATE OR REPLACE VIEW vw_product_sales AS
SELECT
    p.product_id,
    p.product_name,
    CAST(COALESCE(SUM(d.quantity), 0) AS BIGINT) AS total_quantity,
    CAST(COALESCE(SUM(d.quantity * d.price), 0) AS DOUBLE) AS total_sales
FROM products p
LEFT JOIN detailed_sale d ON p.product_id = d.product_id
GROUP BY p.product_id, p.product_name;

CREATE OR REPLACE VIEW vw_sale_lines AS
SELECT
    s.transaction_id,
    s.card_id,
    CAST(s.transaction_date AS VARCHAR) AS transaction_date,
    CAST(s.transaction_time AS VARCHAR) AS transaction_time,
    d.product_id,
    d.quantity,
    d.price
FROM sale s
LEFT JOIN detailed_sale d ON s.transaction_id = d.transaction_id;
",
    )?;

    Ok(())
}
