//! # Quarterly Metrics
//!
//! Derives comparable, date-aligned series from per-company quarterly P&L
//! records: margins, period-over-period growth, trailing sums and the
//! latest-period KPI summary behind each dashboard card.
//!
//! ## Core Concepts
//!
//! - **Record**: one company's reported figures for one quarter, keyed by its period end date
//! - **Period Index**: the sorted union of period end dates across the selected companies
//! - **Aligned Row**: one period of the index with every company's value, or an explicit gap
//! - **Absent values**: margins and growth over a zero denominator are `None`, never infinite
//! - **Trailing aggregate**: the sum of the last N quarters (N = 4 gives TTM)
//!
//! All computation is pure. Records are fetched once per company through a
//! [`RecordStore`]; every change of selection, range or metric recomputes from
//! those raw records.
//!
//! ## Example
//!
//! ```rust,ignore
//! use quarterly_metrics::*;
//! use chrono::NaiveDate;
//!
//! let mut records = RecordSet::new();
//! records.insert(
//!     EntityId::from("dipped-products"),
//!     vec![FinancialRecord {
//!         period_end_date: NaiveDate::from_ymd_opt(2023, 3, 31).unwrap(),
//!         revenue: 100.0,
//!         gross_profit: 40.0,
//!         operating_income: 20.0,
//!         operating_expenses: 20.0,
//!         net_income: 10.0,
//!     }],
//! );
//!
//! let entities = vec![EntityId::from("dipped-products"), EntityId::from("richard-pieris")];
//! let rows = align_series(&entities, &records, MetricField::Revenue, &DateRange::all());
//! let summary = compose_summary(&entities, &records, MetricField::Revenue, &DateRange::all());
//! ```

pub mod aligner;
pub mod breakdown;
pub mod chat;
pub mod dashboard;
pub mod error;
pub mod metrics;
pub mod period_index;
pub mod range;
pub mod rolling;
pub mod schema;
pub mod store;
pub mod summary;
pub mod utils;

#[cfg(all(test, feature = "remote"))]
mod test_support;

pub use aligner::{align_growth_series, align_margin_series, align_series, align_with, AlignedCell};
pub use breakdown::{
    latest_values, margin_heatmap, share_breakdown, HeatmapCell, LatestValue, ShareSlice,
};
pub use chat::{ChatMessage, ChatRequest, ChatResponse, ChatRole, ChatSession};
pub use dashboard::{Dashboard, DashboardQuery, DashboardView};
pub use error::{MetricsError, Result};
pub use metrics::{
    growth_between, growth_series, margin, margin_of, period_over_period_growth, record_margins,
    GrowthPoint, RecordMargins,
};
pub use period_index::build_period_index;
pub use range::filter_range;
pub use rolling::{
    trailing_aggregate, trailing_series, trailing_sum, TrailingWindow, DEFAULT_TRAILING_WINDOW,
};
pub use schema::*;
pub use store::{fetch_all, FetchOutcome, InMemoryRecordStore, JsonDirRecordStore, RecordStore};
pub use summary::{compose_summary, compose_summary_with_window};
pub use utils::{parse_period_end_date, sorted_ascending, sorted_descending};

#[cfg(feature = "remote")]
pub use chat::ChatClient;
#[cfg(feature = "remote")]
pub use store::HttpRecordStore;
