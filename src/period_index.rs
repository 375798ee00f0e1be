use crate::schema::FinancialRecord;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Builds the shared alignment axis: every distinct period end date seen in
/// any of the given collections, ascending.
pub fn build_period_index<'a, C>(collections: C) -> Vec<NaiveDate>
where
    C: IntoIterator,
    C::Item: IntoIterator<Item = &'a FinancialRecord>,
{
    collections
        .into_iter()
        .flatten()
        .map(|record| record.period_end_date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
