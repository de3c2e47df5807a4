use serde::Serialize;

use super::calendar::{SaleDate, SaleTimestamp};

/// One sale line as fetched from the store.
///
/// `transaction_id` groups the lines of a single purchase. `card_id` stands in
/// for the customer: a person paying with two cards counts as two customers.
/// Sales without detail lines arrive with the product columns unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub card_id: String,
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
    pub transaction_date: String,
    pub transaction_time: String,
}

/// A transaction line with its temporal features attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedTransaction {
    #[serde(flatten)]
    pub record: TransactionRecord,
    pub full_datetime: SaleTimestamp,
    pub week_start: SaleDate,
    /// 0 = Monday, 6 = Sunday.
    pub day_of_week: u8,
    pub day_name: &'static str,
    pub hour: u8,
}

impl DerivedTransaction {
    pub fn transaction_id(&self) -> &str {
        self.record.transaction_id.as_str()
    }

    pub fn card_id(&self) -> &str {
        self.record.card_id.as_str()
    }
}
