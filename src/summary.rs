use crate::metrics::{growth_between, margin};
use crate::range::filter_range;
use crate::rolling::{trailing_aggregate, DEFAULT_TRAILING_WINDOW};
use crate::schema::{DateRange, EntityId, MetricField, RecordSet, SummaryRow};
use crate::utils::sorted_descending;
use log::debug;

/// Latest-period KPI rows, one per entity with in-range data, in the order the
/// entities were requested. The trailing aggregate is trailing-twelve-month
/// net income.
pub fn compose_summary(
    entities: &[EntityId],
    records: &RecordSet,
    field: MetricField,
    range: &DateRange,
) -> Vec<SummaryRow> {
    compose_summary_with_window(entities, records, field, range, DEFAULT_TRAILING_WINDOW)
}

pub fn compose_summary_with_window(
    entities: &[EntityId],
    records: &RecordSet,
    field: MetricField,
    range: &DateRange,
    window: usize,
) -> Vec<SummaryRow> {
    entities
        .iter()
        .filter_map(|entity| {
            let history = records.get(entity).map(Vec::as_slice).unwrap_or(&[]);
            let ordered = sorted_descending(filter_range(history, range));

            let Some(&latest) = ordered.first() else {
                debug!("No records in range for {}, omitting from summary", entity);
                return None;
            };
            let previous = ordered.get(1).copied();

            Some(SummaryRow {
                entity: entity.clone(),
                period_end_date: latest.period_end_date,
                headline_value: latest.get(field),
                gross_margin_pct: margin(latest.gross_profit, latest.revenue),
                net_margin_pct: margin(latest.net_income, latest.revenue),
                trailing_aggregate: trailing_aggregate(
                    ordered.iter().copied(),
                    latest.period_end_date,
                    window,
                    MetricField::NetIncome,
                ),
                delta_pct: growth_between(latest, previous, field),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FinancialRecord;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(d: NaiveDate, revenue: f64, gross_profit: f64, net_income: f64) -> FinancialRecord {
        FinancialRecord {
            period_end_date: d,
            revenue,
            gross_profit,
            operating_income: 0.0,
            operating_expenses: 0.0,
            net_income,
        }
    }

    fn fixture() -> RecordSet {
        let mut set = RecordSet::new();
        set.insert(
            EntityId::from("a"),
            vec![
                record(date(2023, 12, 31), 130.0, 52.0, 13.0),
                record(date(2023, 3, 31), 100.0, 30.0, 10.0),
                record(date(2023, 9, 30), 120.0, 48.0, 12.0),
                record(date(2023, 6, 30), 110.0, 44.0, 11.0),
                record(date(2022, 12, 31), 90.0, 27.0, 9.0),
            ],
        );
        set.insert(
            EntityId::from("b"),
            vec![record(date(2023, 6, 30), 0.0, 5.0, -20.0)],
        );
        set
    }

    #[test]
    fn test_latest_row_values() {
        let set = fixture();
        let rows = compose_summary(
            &[EntityId::from("a")],
            &set,
            MetricField::Revenue,
            &DateRange::all(),
        );

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.period_end_date, date(2023, 12, 31));
        assert_eq!(row.headline_value, 130.0);
        assert!((row.gross_margin_pct.unwrap() - 40.0).abs() < 1e-9);
        assert!((row.net_margin_pct.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(row.trailing_aggregate, 13.0 + 12.0 + 11.0 + 10.0);
        assert!((row.delta_pct.unwrap() - (130.0 - 120.0) / 120.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_record_has_no_delta_and_zero_revenue_no_margin() {
        let set = fixture();
        let rows = compose_summary(
            &[EntityId::from("b")],
            &set,
            MetricField::NetIncome,
            &DateRange::all(),
        );

        let row = &rows[0];
        assert_eq!(row.headline_value, -20.0);
        assert_eq!(row.delta_pct, None);
        assert_eq!(row.gross_margin_pct, None);
        assert_eq!(row.net_margin_pct, None);
        assert_eq!(row.trailing_aggregate, -20.0);
    }

    #[test]
    fn test_entity_without_data_in_range_is_omitted() {
        let set = fixture();
        let range = DateRange::new(Some(date(2023, 7, 1)), None).unwrap();
        let rows = compose_summary(
            &[EntityId::from("b"), EntityId::from("a"), EntityId::from("missing")],
            &set,
            MetricField::Revenue,
            &range,
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entity, EntityId::from("a"));
        // window is confined to the filtered range
        assert_eq!(rows[0].trailing_aggregate, 13.0 + 12.0);
    }

    #[test]
    fn test_output_follows_requested_entity_order() {
        let set = fixture();
        let rows = compose_summary(
            &[EntityId::from("b"), EntityId::from("a")],
            &set,
            MetricField::Revenue,
            &DateRange::all(),
        );
        let order: Vec<&str> = rows.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn test_custom_window() {
        let set = fixture();
        let rows = compose_summary_with_window(
            &[EntityId::from("a")],
            &set,
            MetricField::Revenue,
            &DateRange::all(),
            2,
        );
        assert_eq!(rows[0].trailing_aggregate, 25.0);
    }
}
