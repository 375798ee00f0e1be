//! Ratio and period-over-period growth metrics.
//!
//! Undefined arithmetic (zero or non-finite denominators) is reported as
//! `None`, never as an error or an infinite value.

use crate::range::filter_range;
use crate::schema::{DateRange, FinancialRecord, MarginKind, MetricField};
use crate::utils::sorted_ascending;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// `numerator / denominator * 100`, or `None` when the denominator is zero.
///
/// Negative denominators keep their algebraic sign.
pub fn margin(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return None;
    }
    finite(numerator / denominator * 100.0)
}

/// `(current - previous) / |previous| * 100`, or `None` when `previous` is zero.
///
/// Dividing by the magnitude keeps the direction of change intact when the
/// prior value is negative: going from -100 to 110 is +210%.
pub fn period_over_period_growth(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return None;
    }
    finite((current - previous) / previous.abs() * 100.0)
}

/// Growth of `field` between two records; `None` without a prior record.
pub fn growth_between(
    current: &FinancialRecord,
    previous: Option<&FinancialRecord>,
    field: MetricField,
) -> Option<f64> {
    previous.and_then(|prev| period_over_period_growth(current.get(field), prev.get(field)))
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordMargins {
    pub gross: Option<f64>,
    pub operating: Option<f64>,
    pub net: Option<f64>,
}

pub fn margin_of(record: &FinancialRecord, kind: MarginKind) -> Option<f64> {
    margin(record.get(kind.numerator()), record.revenue)
}

pub fn record_margins(record: &FinancialRecord) -> RecordMargins {
    RecordMargins {
        gross: margin_of(record, MarginKind::Gross),
        operating: margin_of(record, MarginKind::Operating),
        net: margin_of(record, MarginKind::Net),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub period_end_date: NaiveDate,
    pub value: f64,
    pub growth_pct: Option<f64>,
}

/// Chronological QoQ growth of one entity's `field` inside `range`.
///
/// Each point is compared with the immediately preceding in-range record; the
/// oldest point has no growth.
pub fn growth_series(
    records: &[FinancialRecord],
    field: MetricField,
    range: &DateRange,
) -> Vec<GrowthPoint> {
    let ordered = sorted_ascending(filter_range(records, range));

    ordered
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let previous = idx.checked_sub(1).map(|p| ordered[p]);
            GrowthPoint {
                period_end_date: record.period_end_date,
                value: record.get(field),
                growth_pct: growth_between(record, previous, field),
            }
        })
        .collect()
}
