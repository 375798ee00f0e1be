use crate::metrics::{growth_between, margin_of};
use crate::period_index::build_period_index;
use crate::range::filter_range;
use crate::schema::{
    AlignedRow, DateRange, EntityId, FinancialRecord, MarginKind, MetricField, RecordSet,
};
use crate::utils::sorted_ascending;
use chrono::NaiveDate;
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// What a value extractor sees for one (date, entity) cell of the grid.
pub struct AlignedCell<'a> {
    pub entity: &'a EntityId,
    pub period_end_date: NaiveDate,
    /// The entity's in-range record for exactly this date, if any.
    pub record: Option<&'a FinancialRecord>,
    /// The in-range record immediately before `record`.
    pub previous: Option<&'a FinancialRecord>,
    /// The entity's full, unfiltered collection.
    pub history: &'a [FinancialRecord],
}

struct EntityView<'a> {
    id: &'a EntityId,
    history: &'a [FinancialRecord],
    ordered: Vec<&'a FinancialRecord>,
    position: HashMap<NaiveDate, usize>,
}

/// Builds one row per period in the shared index, with a cell for every
/// requested entity whether or not it reported on that date.
pub fn align_with<F>(
    entities: &[EntityId],
    records: &RecordSet,
    range: &DateRange,
    mut value: F,
) -> Vec<AlignedRow>
where
    F: FnMut(&AlignedCell<'_>) -> Option<f64>,
{
    let views: Vec<EntityView<'_>> = entities
        .iter()
        .map(|id| {
            let history = records.get(id).map(Vec::as_slice).unwrap_or(&[]);
            let ordered = sorted_ascending(filter_range(history, range));
            let position = ordered
                .iter()
                .enumerate()
                .map(|(idx, r)| (r.period_end_date, idx))
                .collect();
            EntityView {
                id,
                history,
                ordered,
                position,
            }
        })
        .collect();

    let index = build_period_index(views.iter().map(|v| v.ordered.iter().copied()));
    debug!(
        "Aligning {} entities over {} periods",
        views.len(),
        index.len()
    );

    index
        .into_iter()
        .map(|date| {
            let values: BTreeMap<EntityId, Option<f64>> = views
                .iter()
                .map(|view| {
                    let idx = view.position.get(&date).copied();
                    let cell = AlignedCell {
                        entity: view.id,
                        period_end_date: date,
                        record: idx.map(|i| view.ordered[i]),
                        previous: idx.and_then(|i| i.checked_sub(1)).map(|p| view.ordered[p]),
                        history: view.history,
                    };
                    (view.id.clone(), value(&cell))
                })
                .collect();

            AlignedRow {
                period_end_date: date,
                values,
            }
        })
        .collect()
}

/// Raw `field` values per entity on the shared period axis.
pub fn align_series(
    entities: &[EntityId],
    records: &RecordSet,
    field: MetricField,
    range: &DateRange,
) -> Vec<AlignedRow> {
    align_with(entities, records, range, |cell| {
        cell.record.map(|r| r.get(field))
    })
}

pub fn align_margin_series(
    entities: &[EntityId],
    records: &RecordSet,
    kind: MarginKind,
    range: &DateRange,
) -> Vec<AlignedRow> {
    align_with(entities, records, range, |cell| {
        cell.record.and_then(|r| margin_of(r, kind))
    })
}

/// QoQ growth per entity; the first in-range period of each entity is absent.
pub fn align_growth_series(
    entities: &[EntityId],
    records: &RecordSet,
    field: MetricField,
    range: &DateRange,
) -> Vec<AlignedRow> {
    align_with(entities, records, range, |cell| {
        cell.record
            .and_then(|r| growth_between(r, cell.previous, field))
    })
}
