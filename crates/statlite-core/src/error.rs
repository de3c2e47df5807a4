use thiserror::Error;

use statlite_warehouse::WarehouseError;

/// Input fields whose values are parsed by the analytics layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    TransactionId,
    CardId,
    TransactionDate,
    TransactionTime,
    ProductId,
    ProductName,
    Quantity,
    Price,
    TotalQuantity,
    TotalSales,
}

impl Field {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TransactionId => "transaction_id",
            Self::CardId => "card_id",
            Self::TransactionDate => "transaction_date",
            Self::TransactionTime => "transaction_time",
            Self::ProductId => "product_id",
            Self::ProductName => "product_name",
            Self::Quantity => "quantity",
            Self::Price => "price",
            Self::TotalQuantity => "total_quantity",
            Self::TotalSales => "total_sales",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract violations in report options and envelopes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("limit must be at least 1")]
    InvalidLimit,

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },

    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Errors raised while turning fetched rows into KPIs.
///
/// Any of these aborts the whole computation; no partial report is produced.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("row {row}: cannot parse {field} from '{value}'")]
    Parse {
        row: usize,
        field: Field,
        value: String,
    },

    #[error("required column '{column}' is missing from the result set")]
    MissingColumn { column: &'static str },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("dataset truncated at {max_rows} rows; raise the fetch row limit")]
    DatasetTruncated { max_rows: usize },

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),
}

impl AnalyticsError {
    /// Stable identifier used in envelope errors.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse_error",
            Self::MissingColumn { .. } => "missing_column",
            Self::InvalidState(_) => "invalid_state",
            Self::DatasetTruncated { .. } => "dataset_truncated",
            Self::Warehouse(_) => "warehouse",
        }
    }

    pub(crate) fn parse(row: usize, field: Field, value: impl Into<String>) -> Self {
        Self::Parse {
            row,
            field,
            value: value.into(),
        }
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}
