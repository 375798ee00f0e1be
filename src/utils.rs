use crate::error::{MetricsError, Result};
use crate::schema::{EntityId, FinancialRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a reporting period end date, keeping only the calendar day.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `DD.MM.YYYY`, RFC 3339 timestamps and
/// naive `YYYY-MM-DDTHH:MM:SS` timestamps, so that the same day written two
/// ways compares equal.
pub fn parse_period_end_date(raw: &str) -> Result<NaiveDate> {
    let value = raw.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(timestamp.date());
        }
    }

    Err(MetricsError::DateError(format!(
        "Invalid period end date '{}'. Expected YYYY-MM-DD",
        raw
    )))
}

pub(crate) fn deserialize_period_end_date<'de, D>(
    deserializer: D,
) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_period_end_date(&raw).map_err(serde::de::Error::custom)
}

/// Oldest first. Input is left untouched.
pub fn sorted_ascending<'a, I>(records: I) -> Vec<&'a FinancialRecord>
where
    I: IntoIterator<Item = &'a FinancialRecord>,
{
    let mut sorted: Vec<&FinancialRecord> = records.into_iter().collect();
    sorted.sort_by_key(|r| r.period_end_date);
    sorted
}

/// Newest first. Input is left untouched.
pub fn sorted_descending<'a, I>(records: I) -> Vec<&'a FinancialRecord>
where
    I: IntoIterator<Item = &'a FinancialRecord>,
{
    let mut sorted: Vec<&FinancialRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| b.period_end_date.cmp(&a.period_end_date));
    sorted
}

pub fn ensure_unique_periods(entity: &EntityId, records: &[FinancialRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.period_end_date) {
            return Err(MetricsError::DuplicatePeriod {
                entity: entity.to_string(),
                date: record.period_end_date.to_string(),
            });
        }
    }
    Ok(())
}
