//! Weekly acquisition cohorts and their retention matrix.
//!
//! A card joins the cohort of the week holding its earliest purchase in the
//! loaded dataset. Cohorts are therefore relative to the fetch window: widening
//! the window can move a card into an earlier cohort.
//!
//! Period offsets are whole weeks between the cohort week and the order week.
//! Both dates are aligned to the same week start, so the day difference is
//! always an exact multiple of seven.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::{DerivedTransaction, SaleDate, WeekStart};
use crate::error::AnalyticsError;

/// One cohort row of the matrix.
///
/// `active[p]` counts distinct cards of the cohort seen in offset `p`;
/// `retention[p]` is that count over `size`. A cell is `None`, never zero, when
/// the cohort had no activity in that offset or is not yet old enough to reach
/// it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortRow {
    pub cohort_week: SaleDate,
    pub size: usize,
    pub active: Vec<Option<usize>>,
    pub retention: Vec<Option<f64>>,
}

impl CohortRow {
    pub fn retention_at(&self, period: usize) -> Option<f64> {
        self.retention.get(period).copied().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetentionMatrix {
    pub week_start: WeekStart,
    /// Number of offset columns; every row is padded to this width.
    pub periods: usize,
    pub cohorts: Vec<CohortRow>,
}

impl RetentionMatrix {
    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }

    pub fn cohort(&self, cohort_week: SaleDate) -> Option<&CohortRow> {
        self.cohorts
            .iter()
            .find(|row| row.cohort_week == cohort_week)
    }

    /// Cohort week to number of cards that first bought in it.
    pub fn cohort_sizes(&self) -> BTreeMap<SaleDate, usize> {
        self.cohorts
            .iter()
            .map(|row| (row.cohort_week, row.size))
            .collect()
    }
}

/// Build the retention matrix from derived sale lines.
///
/// `week_start` records the convention the rows were derived with; it is
/// carried into the output untouched.
pub fn build_retention_matrix(
    rows: &[DerivedTransaction],
    week_start: WeekStart,
) -> Result<RetentionMatrix, AnalyticsError> {
    let mut first_week: BTreeMap<&str, SaleDate> = BTreeMap::new();
    for row in rows {
        first_week
            .entry(row.card_id())
            .and_modify(|week| *week = (*week).min(row.week_start))
            .or_insert(row.week_start);
    }

    let mut active_cards: BTreeMap<(SaleDate, SaleDate), BTreeSet<&str>> = BTreeMap::new();
    for row in rows {
        let Some(cohort_week) = first_week.get(row.card_id()).copied() else {
            continue;
        };
        active_cards
            .entry((cohort_week, row.week_start))
            .or_default()
            .insert(row.card_id());
    }

    let mut counts: BTreeMap<SaleDate, BTreeMap<usize, usize>> = BTreeMap::new();
    let mut periods = 0;
    for ((cohort_week, order_week), cards) in &active_cards {
        let days = order_week.days_since(*cohort_week);
        let offset = usize::try_from(days / 7).map_err(|_| {
            AnalyticsError::invalid_state(format!(
                "order week {order_week} precedes cohort week {cohort_week}"
            ))
        })?;
        periods = periods.max(offset + 1);
        counts
            .entry(*cohort_week)
            .or_default()
            .insert(offset, cards.len());
    }

    let cohorts = counts
        .into_iter()
        .map(|(cohort_week, by_offset)| cohort_row(cohort_week, &by_offset, periods))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        cohorts = cohorts.len(),
        periods,
        cards = first_week.len(),
        "built retention matrix"
    );

    Ok(RetentionMatrix {
        week_start,
        periods,
        cohorts,
    })
}

fn cohort_row(
    cohort_week: SaleDate,
    by_offset: &BTreeMap<usize, usize>,
    periods: usize,
) -> Result<CohortRow, AnalyticsError> {
    let size = by_offset.get(&0).copied().unwrap_or(0);
    if size == 0 {
        return Err(AnalyticsError::invalid_state(format!(
            "cohort {cohort_week} has no members in its defining week"
        )));
    }

    let active = (0..periods)
        .map(|offset| by_offset.get(&offset).copied())
        .collect::<Vec<_>>();
    let retention = active
        .iter()
        .map(|count| count.map(|count| count as f64 / size as f64))
        .collect();

    Ok(CohortRow {
        cohort_week,
        size,
        active,
        retention,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionRecord;
    use crate::features::derive_time_features;

    fn derived(lines: &[(&str, &str, &str)]) -> Vec<DerivedTransaction> {
        let records = lines
            .iter()
            .enumerate()
            .map(|(index, (card, date, time))| TransactionRecord {
                transaction_id: format!("t-{index}"),
                card_id: (*card).to_owned(),
                product_id: None,
                quantity: None,
                price: None,
                transaction_date: (*date).to_owned(),
                transaction_time: (*time).to_owned(),
            })
            .collect();
        derive_time_features(records, WeekStart::Monday).expect("derive")
    }

    fn week(value: &str) -> SaleDate {
        SaleDate::parse(value).expect("date")
    }

    #[test]
    fn two_customer_example() {
        // A buys in W1 and again in W2, B only in W1.
        let rows = derived(&[
            ("A", "2024-01-02", "10:00"),
            ("B", "2024-01-03", "11:00"),
            ("A", "2024-01-09", "12:00"),
        ]);

        let matrix = build_retention_matrix(&rows, WeekStart::Monday).expect("matrix");
        let cohort = matrix.cohort(week("2024-01-01")).expect("W1 cohort");
        assert_eq!(cohort.size, 2);
        assert_eq!(cohort.retention_at(0), Some(1.0));
        assert_eq!(cohort.retention_at(1), Some(0.5));
        assert_eq!(matrix.periods, 2);
    }

    #[test]
    fn gaps_stay_none_instead_of_zero() {
        let rows = derived(&[
            ("A", "2024-01-01", "10:00"),
            ("A", "2024-01-15", "10:00"),
            ("B", "2024-01-08", "10:00"),
        ]);

        let matrix = build_retention_matrix(&rows, WeekStart::Monday).expect("matrix");
        let first = matrix.cohort(week("2024-01-01")).expect("first cohort");
        assert_eq!(first.active, vec![Some(1), None, Some(1)]);
        assert_eq!(first.retention, vec![Some(1.0), None, Some(1.0)]);

        let second = matrix.cohort(week("2024-01-08")).expect("second cohort");
        assert_eq!(second.active, vec![Some(1), None, None]);
    }

    #[test]
    fn repeated_purchases_in_one_week_count_once() {
        let rows = derived(&[
            ("A", "2024-01-01", "10:00"),
            ("A", "2024-01-02", "10:00"),
            ("A", "2024-01-03", "10:00"),
        ]);

        let matrix = build_retention_matrix(&rows, WeekStart::Monday).expect("matrix");
        assert_eq!(matrix.cohorts.len(), 1);
        assert_eq!(matrix.cohorts[0].size, 1);
        assert_eq!(matrix.periods, 1);
    }

    #[test]
    fn cohort_is_taken_from_earliest_purchase_regardless_of_row_order() {
        let rows = derived(&[
            ("A", "2024-01-10", "10:00"),
            ("A", "2024-01-02", "10:00"),
        ]);

        let matrix = build_retention_matrix(&rows, WeekStart::Monday).expect("matrix");
        assert_eq!(matrix.cohorts[0].cohort_week, week("2024-01-01"));
        assert_eq!(matrix.cohorts[0].active, vec![Some(1), Some(1)]);
    }

    #[test]
    fn empty_input_yields_empty_matrix() {
        let matrix = build_retention_matrix(&[], WeekStart::Monday).expect("matrix");
        assert!(matrix.is_empty());
        assert_eq!(matrix.periods, 0);
        assert!(matrix.cohort_sizes().is_empty());
    }

    #[test]
    fn cohort_sizes_follow_cohort_order() {
        let rows = derived(&[
            ("B", "2024-01-08", "10:00"),
            ("A", "2024-01-01", "10:00"),
            ("C", "2024-01-09", "10:00"),
        ]);

        let matrix = build_retention_matrix(&rows, WeekStart::Monday).expect("matrix");
        let sizes = matrix.cohort_sizes().into_iter().collect::<Vec<_>>();
        assert_eq!(sizes, vec![(week("2024-01-01"), 1), (week("2024-01-08"), 2)]);
    }
}
