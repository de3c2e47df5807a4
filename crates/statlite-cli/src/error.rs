use statlite_core::{AnalyticsError, ValidationError, WarehouseError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("usage error: {0}")]
    Usage(String),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("strict mode failed: warnings={warning_count}, errors={error_count}")]
    StrictModeViolation {
        warning_count: usize,
        error_count: usize,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::Usage(_) => 2,
            Self::Analytics(AnalyticsError::Warehouse(_)) | Self::Warehouse(_) => 4,
            Self::Analytics(_) => 3,
            Self::StrictModeViolation { .. } => 5,
            Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
