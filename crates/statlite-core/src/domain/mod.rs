pub mod calendar;
pub mod product;
pub mod transaction;

pub use calendar::{parse_time, SaleDate, SaleTimestamp, WeekStart, DAY_NAMES};
pub use product::ProductSales;
pub use transaction::{DerivedTransaction, TransactionRecord};
