//! Cross-entity snapshots: latest-value comparisons, share of total and the
//! per-quarter margin heatmap.

use crate::metrics::{margin, record_margins, RecordMargins};
use crate::range::filter_range;
use crate::schema::{DateRange, EntityId, MetricField, RecordSet};
use crate::utils::sorted_descending;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestValue {
    pub entity: EntityId,
    pub period_end_date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareSlice {
    pub entity: EntityId,
    /// Magnitude of the latest value.
    pub value: f64,
    pub share_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub entity: EntityId,
    pub period_end_date: NaiveDate,
    pub margins: RecordMargins,
}

/// Each entity's most recent in-range `field` value, in request order.
pub fn latest_values(
    entities: &[EntityId],
    records: &RecordSet,
    field: MetricField,
    range: &DateRange,
) -> Vec<LatestValue> {
    entities
        .iter()
        .filter_map(|entity| {
            let history = records.get(entity)?;
            let latest = sorted_descending(filter_range(history, range))
                .first()
                .copied()?;
            Some(LatestValue {
                entity: entity.clone(),
                period_end_date: latest.period_end_date,
                value: latest.get(field),
            })
        })
        .collect()
}

/// Splits the sum of absolute latest values between entities.
pub fn share_breakdown(
    entities: &[EntityId],
    records: &RecordSet,
    field: MetricField,
    range: &DateRange,
) -> Vec<ShareSlice> {
    let latest = latest_values(entities, records, field, range);
    let total: f64 = latest.iter().map(|l| l.value.abs()).sum();

    latest
        .into_iter()
        .map(|l| ShareSlice {
            share_pct: margin(l.value.abs(), total),
            value: l.value.abs(),
            entity: l.entity,
        })
        .collect()
}

/// Gross, operating and net margin for every in-range record, oldest first.
/// Records sharing a date keep the requested entity order.
pub fn margin_heatmap(
    entities: &[EntityId],
    records: &RecordSet,
    range: &DateRange,
) -> Vec<HeatmapCell> {
    let mut cells: Vec<HeatmapCell> = entities
        .iter()
        .flat_map(|entity| {
            let history = records.get(entity).map(Vec::as_slice).unwrap_or(&[]);
            filter_range(history, range)
                .into_iter()
                .map(move |record| HeatmapCell {
                    entity: entity.clone(),
                    period_end_date: record.period_end_date,
                    margins: record_margins(record),
                })
        })
        .collect();

    cells.sort_by_key(|c| c.period_end_date);
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FinancialRecord;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(d: NaiveDate, revenue: f64, net_income: f64) -> FinancialRecord {
        FinancialRecord {
            period_end_date: d,
            revenue,
            gross_profit: revenue / 2.0,
            operating_income: revenue / 4.0,
            operating_expenses: revenue / 4.0,
            net_income,
        }
    }

    fn fixture() -> (Vec<EntityId>, RecordSet) {
        let a = EntityId::from("a");
        let b = EntityId::from("b");
        let mut set = RecordSet::new();
        set.insert(
            a.clone(),
            vec![record(date(2023, 3, 31), 100.0, 10.0), record(date(2023, 6, 30), 300.0, -30.0)],
        );
        set.insert(
            b.clone(),
            vec![record(date(2023, 6, 30), 100.0, 10.0), record(date(2023, 3, 31), 0.0, 0.0)],
        );
        (vec![a, b], set)
    }

    #[test]
    fn test_latest_values_skip_entities_without_data() {
        let (mut entities, set) = fixture();
        entities.insert(0, EntityId::from("ghost"));

        let latest = latest_values(&entities, &set, MetricField::Revenue, &DateRange::all());
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].entity, EntityId::from("a"));
        assert_eq!(latest[0].value, 300.0);
        assert_eq!(latest[1].period_end_date, date(2023, 6, 30));
    }

    #[test]
    fn test_share_uses_magnitudes() {
        let (entities, set) = fixture();
        let shares = share_breakdown(&entities, &set, MetricField::NetIncome, &DateRange::all());

        assert_eq!(shares[0].value, 30.0);
        assert!((shares[0].share_pct.unwrap() - 75.0).abs() < 1e-9);
        assert!((shares[1].share_pct.unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_share_of_zero_total_is_absent() {
        let (entities, set) = fixture();
        let range = DateRange::new(None, Some(date(2023, 3, 31))).unwrap();
        let shares = share_breakdown(&entities[1..], &set, MetricField::Revenue, &range);
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].share_pct, None);
    }

    #[test]
    fn test_heatmap_order_and_gaps() {
        let (entities, set) = fixture();
        let cells = margin_heatmap(&entities, &set, &DateRange::all());

        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].entity, EntityId::from("a"));
        assert_eq!(cells[0].period_end_date, date(2023, 3, 31));
        assert_eq!(cells[1].entity, EntityId::from("b"));
        assert_eq!(cells[1].margins.gross, None);
        assert_eq!(cells[2].period_end_date, date(2023, 6, 30));
        assert!((cells[2].margins.net.unwrap() + 10.0).abs() < 1e-9);
        assert!((cells[3].margins.operating.unwrap() - 25.0).abs() < 1e-9);
    }
}
