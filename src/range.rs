use crate::schema::{DateRange, FinancialRecord};

/// Keeps records with `from <= period_end_date <= to` in their original order.
pub fn filter_range<'a, I>(records: I, range: &DateRange) -> Vec<&'a FinancialRecord>
where
    I: IntoIterator<Item = &'a FinancialRecord>,
{
    records
        .into_iter()
        .filter(|record| range.contains(record.period_end_date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(d: NaiveDate, revenue: f64) -> FinancialRecord {
        FinancialRecord {
            period_end_date: d,
            revenue,
            gross_profit: 0.0,
            operating_income: 0.0,
            operating_expenses: 0.0,
            net_income: 0.0,
        }
    }

    fn sample() -> Vec<FinancialRecord> {
        vec![
            record(date(2023, 9, 30), 3.0),
            record(date(2023, 3, 31), 1.0),
            record(date(2023, 12, 31), 4.0),
            record(date(2023, 6, 30), 2.0),
        ]
    }

    #[test]
    fn test_unbounded_keeps_everything_in_order() {
        let records = sample();
        let filtered = filter_range(&records, &DateRange::all());
        let revenues: Vec<f64> = filtered.iter().map(|r| r.revenue).collect();
        assert_eq!(revenues, vec![3.0, 1.0, 4.0, 2.0]);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let records = sample();
        let range = DateRange::new(Some(date(2023, 6, 30)), Some(date(2023, 9, 30))).unwrap();
        let filtered = filter_range(&records, &range);
        let revenues: Vec<f64> = filtered.iter().map(|r| r.revenue).collect();
        assert_eq!(revenues, vec![3.0, 2.0]);
    }

    #[test]
    fn test_open_ends() {
        let records = sample();

        let from_only = DateRange::new(Some(date(2023, 7, 1)), None).unwrap();
        assert_eq!(filter_range(&records, &from_only).len(), 2);

        let to_only = DateRange::new(None, Some(date(2023, 3, 31))).unwrap();
        let filtered = filter_range(&records, &to_only);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].revenue, 1.0);
    }

    #[test]
    fn test_narrow_then_wide_equals_narrow() {
        let records = sample();
        let narrow = DateRange::new(Some(date(2023, 6, 1)), Some(date(2023, 10, 1))).unwrap();
        let wide = DateRange::new(Some(date(2023, 1, 1)), Some(date(2024, 1, 1))).unwrap();

        let once = filter_range(&records, &narrow);
        let twice = filter_range(once.iter().copied(), &wide);
        assert_eq!(once, twice);
    }
}
