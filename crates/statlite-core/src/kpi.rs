//! Customer KPIs computed over derived sale lines.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::cohort::RetentionMatrix;
use crate::domain::{DerivedTransaction, SaleDate, DAY_NAMES};
use crate::error::AnalyticsError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RepeatPurchaseSummary {
    pub customers: usize,
    pub repeat_customers: usize,
    pub rate: f64,
}

/// Share of cards seen on more than one distinct transaction.
///
/// Undefined for an empty dataset, which is reported as
/// [`AnalyticsError::InvalidState`].
pub fn repeat_purchase_summary(
    rows: &[DerivedTransaction],
) -> Result<RepeatPurchaseSummary, AnalyticsError> {
    let mut transactions_by_card: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for row in rows {
        transactions_by_card
            .entry(row.card_id())
            .or_default()
            .insert(row.transaction_id());
    }

    let customers = transactions_by_card.len();
    if customers == 0 {
        return Err(AnalyticsError::invalid_state(
            "repeat-purchase rate is undefined for an empty dataset",
        ));
    }

    let repeat_customers = transactions_by_card
        .values()
        .filter(|transactions| transactions.len() > 1)
        .count();

    Ok(RepeatPurchaseSummary {
        customers,
        repeat_customers,
        rate: repeat_customers as f64 / customers as f64,
    })
}

pub fn repeat_purchase_rate(rows: &[DerivedTransaction]) -> Result<f64, AnalyticsError> {
    repeat_purchase_summary(rows).map(|summary| summary.rate)
}

/// Share of the previous calendar week's customers who came back in
/// `week_start`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyReturn {
    pub week_start: SaleDate,
    /// 1-based position of the week among the observed weeks.
    pub week_index: usize,
    pub previous_week: SaleDate,
    pub previous_week_customers: usize,
    pub returning_customers: usize,
    /// `None` when nobody bought in the previous week.
    pub return_fraction: Option<f64>,
}

/// One entry per observed week after the first, in week order.
///
/// The comparison week is always the calendar week right before, even when it
/// had no sales; such entries carry no fraction rather than being dropped, so
/// the series length is the number of observed weeks minus one.
pub fn week_over_week_return(
    rows: &[DerivedTransaction],
) -> Result<Vec<WeeklyReturn>, AnalyticsError> {
    let mut cards_by_week: BTreeMap<SaleDate, BTreeSet<&str>> = BTreeMap::new();
    for row in rows {
        cards_by_week
            .entry(row.week_start)
            .or_default()
            .insert(row.card_id());
    }

    let empty = BTreeSet::new();
    cards_by_week
        .iter()
        .enumerate()
        .skip(1)
        .map(|(position, (week_start, cards))| {
            let previous_week = week_start.checked_add_days(-7).ok_or_else(|| {
                AnalyticsError::invalid_state(format!(
                    "week before {week_start} falls outside the supported calendar"
                ))
            })?;
            let previous_cards = cards_by_week.get(&previous_week).unwrap_or(&empty);
            let returning_customers = cards.intersection(previous_cards).count();
            let previous_week_customers = previous_cards.len();

            Ok(WeeklyReturn {
                week_start: *week_start,
                week_index: position + 1,
                previous_week,
                previous_week_customers,
                returning_customers,
                return_fraction: (previous_week_customers > 0)
                    .then(|| returning_customers as f64 / previous_week_customers as f64),
            })
        })
        .collect()
}

/// "New customers" card: the latest cohort against the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewCustomerCard {
    pub week_start: SaleDate,
    pub new_customers: usize,
    pub reference_week: Option<SaleDate>,
    pub reference_customers: Option<usize>,
    pub delta: Option<i64>,
}

pub fn new_customer_card(matrix: &RetentionMatrix) -> Option<NewCustomerCard> {
    let mut recent = matrix.cohorts.iter().rev();
    let latest = recent.next()?;
    let reference = recent.next();

    Some(NewCustomerCard {
        week_start: latest.cohort_week,
        new_customers: latest.size,
        reference_week: reference.map(|row| row.cohort_week),
        reference_customers: reference.map(|row| row.size),
        delta: reference.map(|row| latest.size as i64 - row.size as i64),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityCell {
    pub day_of_week: u8,
    pub day_name: &'static str,
    pub hour: u8,
    pub transactions: usize,
}

/// Distinct transactions per weekday and hour, Monday first. Cells without
/// sales are omitted.
pub fn activity_profile(rows: &[DerivedTransaction]) -> Vec<ActivityCell> {
    let mut cells: BTreeMap<(u8, u8), BTreeSet<&str>> = BTreeMap::new();
    for row in rows {
        cells
            .entry((row.day_of_week, row.hour))
            .or_default()
            .insert(row.transaction_id());
    }

    cells
        .into_iter()
        .map(|((day_of_week, hour), transactions)| ActivityCell {
            day_of_week,
            day_name: DAY_NAMES[usize::from(day_of_week)],
            hour,
            transactions: transactions.len(),
        })
        .collect()
}
