use crate::aligner::{align_growth_series, align_margin_series, align_series};
use crate::breakdown::{latest_values, margin_heatmap, share_breakdown, HeatmapCell, LatestValue, ShareSlice};
use crate::error::{MetricsError, Result};
use crate::rolling::trailing_series;
use crate::schema::{
    AlignedRow, DashboardConfig, DateRange, EntityId, MarginKind, MetricField, RecordSet,
    SummaryRow,
};
use crate::store::{fetch_all, FetchOutcome, RecordStore};
use crate::summary::compose_summary_with_window;
use log::debug;
use serde::{Deserialize, Serialize};

/// Everything one render depends on: which entities, which dates, which metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub entities: Vec<EntityId>,
    #[serde(default)]
    pub range: DateRange,
    pub metric: MetricField,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub summary: Vec<SummaryRow>,
    pub metric_series: Vec<AlignedRow>,
    pub growth_series: Vec<AlignedRow>,
    pub gross_margin_series: Vec<AlignedRow>,
    pub net_margin_series: Vec<AlignedRow>,
    pub trailing_net_income: Vec<AlignedRow>,
    pub comparison: Vec<LatestValue>,
    pub operating_expenses: Vec<LatestValue>,
    pub share: Vec<ShareSlice>,
    pub heatmap: Vec<HeatmapCell>,
}

pub struct Dashboard {
    config: DashboardConfig,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// All configured entities, the whole history, revenue.
    pub fn default_query(&self) -> DashboardQuery {
        DashboardQuery {
            entities: self.config.entity_ids(),
            range: DateRange::all(),
            metric: MetricField::Revenue,
        }
    }

    /// Fetches every configured entity once.
    pub async fn load<S>(&self, store: &S) -> FetchOutcome
    where
        S: RecordStore + ?Sized,
    {
        fetch_all(store, &self.config.entity_ids()).await
    }

    pub fn compose(&self, query: &DashboardQuery, records: &RecordSet) -> Result<DashboardView> {
        if let Some(unknown) = query
            .entities
            .iter()
            .find(|id| self.config.entity(id).is_none())
        {
            return Err(MetricsError::UnknownEntity(unknown.to_string()));
        }

        // fields are public, so a range may have been assembled without `new`
        let range = &DateRange::new(query.range.from, query.range.to)?;
        let entities = &query.entities;
        let window = self.config.trailing_window;

        debug!(
            "Composing dashboard for {:?} metric={} range={:?}..{:?}",
            entities, query.metric, range.from, range.to
        );

        Ok(DashboardView {
            summary: compose_summary_with_window(entities, records, query.metric, range, window),
            metric_series: align_series(entities, records, query.metric, range),
            growth_series: align_growth_series(entities, records, query.metric, range),
            gross_margin_series: align_margin_series(entities, records, MarginKind::Gross, range),
            net_margin_series: align_margin_series(entities, records, MarginKind::Net, range),
            trailing_net_income: trailing_series(
                entities,
                records,
                MetricField::NetIncome,
                window,
                range,
            ),
            comparison: latest_values(entities, records, query.metric, range),
            operating_expenses: latest_values(
                entities,
                records,
                MetricField::OperatingExpenses,
                range,
            ),
            share: share_breakdown(entities, records, query.metric, range),
            heatmap: margin_heatmap(entities, records, range),
        })
    }
}
