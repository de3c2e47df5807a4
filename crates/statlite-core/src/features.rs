//! Temporal features derived from each sale line.

use crate::domain::{
    parse_time, DerivedTransaction, SaleDate, SaleTimestamp, TransactionRecord, WeekStart,
    DAY_NAMES,
};
use crate::error::{AnalyticsError, Field};

/// Attach `full_datetime`, `week_start`, `day_of_week`, `day_name` and `hour`
/// to every record, preserving input order.
///
/// A single malformed date or time fails the whole batch: a dropped or null
/// timestamp would silently skew every aggregate downstream.
pub fn derive_time_features(
    records: Vec<TransactionRecord>,
    week_start: WeekStart,
) -> Result<Vec<DerivedTransaction>, AnalyticsError> {
    let derived = records
        .into_iter()
        .enumerate()
        .map(|(row, record)| derive_row(row, record, week_start))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(rows = derived.len(), %week_start, "derived time features");
    Ok(derived)
}

fn derive_row(
    row: usize,
    record: TransactionRecord,
    convention: WeekStart,
) -> Result<DerivedTransaction, AnalyticsError> {
    let date = SaleDate::parse(&record.transaction_date).map_err(|_| {
        AnalyticsError::parse(row, Field::TransactionDate, record.transaction_date.as_str())
    })?;
    let time = parse_time(&record.transaction_time).ok_or_else(|| {
        AnalyticsError::parse(row, Field::TransactionTime, record.transaction_time.as_str())
    })?;

    let full_datetime = SaleTimestamp::new(date, time);
    let week_start = date.week_start(convention).ok_or_else(|| {
        AnalyticsError::invalid_state(format!(
            "row {row}: week start of {date} falls outside the supported calendar"
        ))
    })?;
    let day_of_week = full_datetime.day_of_week();

    Ok(DerivedTransaction {
        record,
        full_datetime,
        week_start,
        day_of_week,
        day_name: DAY_NAMES[usize::from(day_of_week)],
        hour: full_datetime.hour(),
    })
}
