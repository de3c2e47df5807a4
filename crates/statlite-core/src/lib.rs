//! Core analytics for statlite.
//!
//! This crate contains:
//! - Typed sale records and the calendar helpers behind week bucketing
//! - Time features, cohort retention, and customer KPIs
//! - Product rankings
//! - The data source trait and dashboard report assembly
//! - Response envelope and structured errors

pub mod cohort;
pub mod dashboard;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod features;
pub mod kpi;
pub mod products;
pub mod table;

pub use cohort::{build_retention_matrix, CohortRow, RetentionMatrix};
pub use dashboard::{
    AnalysisOptions, ClientsReport, CohortReport, Dashboard, DashboardPages, DashboardReport,
    ProductsReport, SalesPages,
};
pub use data_source::{DataSource, PRODUCTS_QUERY, SALES_QUERY};
pub use domain::{
    DerivedTransaction, ProductSales, SaleDate, SaleTimestamp, TransactionRecord, WeekStart,
};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};
pub use error::{AnalyticsError, Field, ValidationError};
pub use features::derive_time_features;
pub use kpi::{
    activity_profile, new_customer_card, repeat_purchase_rate, repeat_purchase_summary,
    week_over_week_return, ActivityCell, NewCustomerCard, RepeatPurchaseSummary, WeeklyReturn,
};
pub use products::{ProductRankings, DEFAULT_TOP_N};
pub use statlite_warehouse::{
    ImportReport, ImportTable, QueryGuardrails, QueryResult, SqlColumn, Warehouse,
    WarehouseConfig, WarehouseError,
};
pub use table::{decode_products, decode_transactions};
