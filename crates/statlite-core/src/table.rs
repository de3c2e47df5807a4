//! Decoding of fetched result sets into typed records.
//!
//! Columns are looked up by name, so the order a query returns them in does
//! not matter. Only the columns the analytics need are checked.

use serde_json::Value;
use statlite_warehouse::QueryResult;

use crate::domain::{ProductSales, TransactionRecord};
use crate::error::{AnalyticsError, Field};

static NULL_CELL: Value = Value::Null;

pub fn decode_transactions(table: &QueryResult) -> Result<Vec<TransactionRecord>, AnalyticsError> {
    let transaction_id = required_column(table, Field::TransactionId)?;
    let card_id = required_column(table, Field::CardId)?;
    let transaction_date = required_column(table, Field::TransactionDate)?;
    let transaction_time = required_column(table, Field::TransactionTime)?;
    let product_id = table.column_index(Field::ProductId.as_str());
    let quantity = table.column_index(Field::Quantity.as_str());
    let price = table.column_index(Field::Price.as_str());

    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            Ok(TransactionRecord {
                transaction_id: id_cell(index, Field::TransactionId, cell(row, transaction_id))?,
                card_id: id_cell(index, Field::CardId, cell(row, card_id))?,
                product_id: match optional_cell(row, product_id) {
                    Value::Null => None,
                    value => Some(id_cell(index, Field::ProductId, value)?),
                },
                quantity: integer_cell(index, Field::Quantity, optional_cell(row, quantity))?,
                price: float_cell(index, Field::Price, optional_cell(row, price))?,
                transaction_date: text_cell(index, Field::TransactionDate, cell(row, transaction_date))?,
                transaction_time: text_cell(index, Field::TransactionTime, cell(row, transaction_time))?,
            })
        })
        .collect()
}

/// Null totals decode to zero: a product that never sold has no sum.
pub fn decode_products(table: &QueryResult) -> Result<Vec<ProductSales>, AnalyticsError> {
    let product_id = required_column(table, Field::ProductId)?;
    let product_name = required_column(table, Field::ProductName)?;
    let total_quantity = required_column(table, Field::TotalQuantity)?;
    let total_sales = required_column(table, Field::TotalSales)?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            Ok(ProductSales {
                product_id: id_cell(index, Field::ProductId, cell(row, product_id))?,
                product_name: text_cell(index, Field::ProductName, cell(row, product_name))?,
                total_quantity: integer_cell(index, Field::TotalQuantity, cell(row, total_quantity))?
                    .unwrap_or(0),
                total_sales: float_cell(index, Field::TotalSales, cell(row, total_sales))?
                    .unwrap_or(0.0),
            })
        })
        .collect()
}

fn required_column(table: &QueryResult, field: Field) -> Result<usize, AnalyticsError> {
    table
        .column_index(field.as_str())
        .ok_or(AnalyticsError::MissingColumn {
            column: field.as_str(),
        })
}

fn cell(row: &[Value], index: usize) -> &Value {
    row.get(index).unwrap_or(&NULL_CELL)
}

fn optional_cell(row: &[Value], index: Option<usize>) -> &Value {
    index.map_or(&NULL_CELL, |index| cell(row, index))
}

fn id_cell(row: usize, field: Field, value: &Value) -> Result<String, AnalyticsError> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Ok(text.trim().to_owned()),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(AnalyticsError::parse(row, field, render(other))),
    }
}

fn text_cell(row: usize, field: Field, value: &Value) -> Result<String, AnalyticsError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        other => Err(AnalyticsError::parse(row, field, render(other))),
    }
}

fn integer_cell(row: usize, field: Field, value: &Value) -> Result<Option<i64>, AnalyticsError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|value| value.fract() == 0.0 && fits_i64(*value))
                    .map(|value| value as i64)
            })
            .map(Some)
            .ok_or_else(|| AnalyticsError::parse(row, field, number.to_string())),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AnalyticsError::parse(row, field, text.as_str())),
        other => Err(AnalyticsError::parse(row, field, render(other))),
    }
}

/// `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
fn fits_i64(value: f64) -> bool {
    value >= i64::MIN as f64 && value < i64::MAX as f64
}

fn float_cell(row: usize, field: Field, value: &Value) -> Result<Option<f64>, AnalyticsError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_f64()
            .map(Some)
            .ok_or_else(|| AnalyticsError::parse(row, field, number.to_string())),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Some)
            .ok_or_else(|| AnalyticsError::parse(row, field, text.as_str())),
        other => Err(AnalyticsError::parse(row, field, render(other))),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::from("null"),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use statlite_warehouse::SqlColumn;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
        QueryResult {
            columns: columns
                .iter()
                .map(|name| SqlColumn {
                    name: (*name).to_owned(),
                    r#type: String::from("VARCHAR"),
                })
                .collect(),
            row_count: rows.len(),
            rows,
            truncated: false,
        }
    }

    #[test]
    fn decodes_sale_lines_regardless_of_column_order() {
        let result = table(
            &["card_id", "transaction_time", "transaction_id", "transaction_date", "product_id", "quantity", "price"],
            vec![
                vec![json!("card-a"), json!("09:00:00"), json!(10), json!("2024-01-01"), json!(7), json!(2), json!(3.5)],
                vec![json!("card-b"), json!("10:00:00"), json!(11), json!("2024-01-02"), Value::Null, Value::Null, Value::Null],
            ],
        );

        let records = decode_transactions(&result).expect("decode");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].transaction_id, "10");
        assert_eq!(records[0].product_id.as_deref(), Some("7"));
        assert_eq!(records[0].quantity, Some(2));
        assert_eq!(records[0].price, Some(3.5));
        assert_eq!(records[1].product_id, None);
        assert_eq!(records[1].quantity, None);
    }

    #[test]
    fn product_columns_are_optional_for_sale_lines() {
        let result = table(
            &["transaction_id", "card_id", "transaction_date", "transaction_time"],
            vec![vec![json!("t-1"), json!("card-a"), json!("2024-01-01"), json!("09:00")]],
        );

        let records = decode_transactions(&result).expect("decode");
        assert_eq!(records[0].product_id, None);
        assert_eq!(records[0].price, None);
    }

    #[test]
    fn missing_required_column_is_reported() {
        let result = table(&["transaction_id", "card_id", "transaction_date"], Vec::new());
        let err = decode_transactions(&result).expect_err("must fail");
        assert!(matches!(
            err,
            AnalyticsError::MissingColumn {
                column: "transaction_time"
            }
        ));
    }

    #[test]
    fn null_date_is_a_parse_error() {
        let result = table(
            &["transaction_id", "card_id", "transaction_date", "transaction_time"],
            vec![vec![json!(1), json!("card-a"), Value::Null, json!("09:00")]],
        );
        let err = decode_transactions(&result).expect_err("must fail");
        assert!(matches!(
            err,
            AnalyticsError::Parse {
                row: 0,
                field: Field::TransactionDate,
                ..
            }
        ));
    }

    #[test]
    fn null_card_is_a_parse_error() {
        let result = table(
            &["transaction_id", "card_id", "transaction_date", "transaction_time"],
            vec![vec![json!(1), Value::Null, json!("2024-01-01"), json!("09:00")]],
        );
        let err = decode_transactions(&result).expect_err("must fail");
        assert!(matches!(err, AnalyticsError::Parse { field: Field::CardId, .. }));
    }

    #[test]
    fn product_totals_default_to_zero() {
        let result = table(
            &["product_id", "product_name", "total_quantity", "total_sales"],
            vec![
                vec![json!(1), json!("Coffee"), json!(12), json!(30.0)],
                vec![json!(2), json!("Cake"), Value::Null, Value::Null],
            ],
        );

        let products = decode_products(&result).expect("decode");
        assert_eq!(products[0].total_quantity, 12);
        assert_eq!(products[1].total_quantity, 0);
        assert_eq!(products[1].total_sales, 0.0);
    }

    #[test]
    fn non_numeric_quantity_is_a_parse_error() {
        let result = table(
            &["product_id", "product_name", "total_quantity", "total_sales"],
            vec![vec![json!(1), json!("Coffee"), json!("lots"), json!(30.0)]],
        );
        let err = decode_products(&result).expect_err("must fail");
        assert!(matches!(
            err,
            AnalyticsError::Parse {
                field: Field::TotalQuantity,
                ..
            }
        ));
    }

    #[test]
    fn quantity_beyond_i64_is_a_parse_error() {
        // Given: A whole-number total far outside the i64 range
        let result = table(
            &["product_id", "product_name", "total_quantity", "total_sales"],
            vec![vec![json!(1), json!("Coffee"), json!(1e20), json!(30.0)]],
        );

        // When: The product totals are decoded
        let err = decode_products(&result).expect_err("must fail");

        // Then: The value is rejected rather than clamped
        assert!(matches!(
            err,
            AnalyticsError::Parse {
                row: 0,
                field: Field::TotalQuantity,
                ..
            }
        ));
    }

    #[test]
    fn whole_float_quantity_within_range_is_accepted() {
        let result = table(
            &["product_id", "product_name", "total_quantity", "total_sales"],
            vec![vec![json!(1), json!("Coffee"), json!(12.0), json!(30.0)]],
        );

        let products = decode_products(&result).expect("decode");
        assert_eq!(products[0].total_quantity, 12);
    }
}
