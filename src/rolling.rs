use crate::aligner::align_with;
use crate::schema::{AlignedRow, DateRange, EntityId, FinancialRecord, MetricField, RecordSet};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Four quarters, i.e. trailing twelve months.
pub const DEFAULT_TRAILING_WINDOW: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingWindow {
    pub sum: f64,
    /// How many records were actually summed. Less than the requested window
    /// when the entity's history is short.
    pub periods: usize,
}

impl TrailingWindow {
    pub fn is_complete(&self, window: usize) -> bool {
        self.periods >= window
    }
}

/// Sums `field` over the `window` most recent records dated on or before
/// `reference`. Short histories sum whatever is available.
pub fn trailing_sum<'a, I>(
    records: I,
    reference: NaiveDate,
    window: usize,
    field: MetricField,
) -> TrailingWindow
where
    I: IntoIterator<Item = &'a FinancialRecord>,
{
    let mut eligible: Vec<&FinancialRecord> = records
        .into_iter()
        .filter(|r| r.period_end_date <= reference)
        .collect();
    eligible.sort_by(|a, b| b.period_end_date.cmp(&a.period_end_date));
    eligible.truncate(window);

    TrailingWindow {
        sum: eligible.iter().map(|r| r.get(field)).sum(),
        periods: eligible.len(),
    }
}

pub fn trailing_aggregate<'a, I>(
    records: I,
    reference: NaiveDate,
    window: usize,
    field: MetricField,
) -> f64
where
    I: IntoIterator<Item = &'a FinancialRecord>,
{
    trailing_sum(records, reference, window, field).sum
}

/// Trailing-`window` sums on the shared period axis.
///
/// The range only picks the axis dates; each window looks back over the
/// entity's whole history. A cell is absent only when the entity has nothing
/// reported on or before that date.
pub fn trailing_series(
    entities: &[EntityId],
    records: &RecordSet,
    field: MetricField,
    window: usize,
    range: &DateRange,
) -> Vec<AlignedRow> {
    align_with(entities, records, range, |cell| {
        let trailing = trailing_sum(cell.history, cell.period_end_date, window, field);
        (trailing.periods > 0).then_some(trailing.sum)
    })
}
