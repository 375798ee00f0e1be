use crate::error::{MetricsError, Result};
use crate::utils::deserialize_period_end_date;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Stable key identifying one reporting entity (e.g. `"dipped-products"`).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One entity's reported P&L figures for one fiscal quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinancialRecord {
    #[serde(deserialize_with = "deserialize_period_end_date")]
    #[schemars(
        with = "NaiveDate",
        description = "Closing date of the quarter. Accepts YYYY-MM-DD, YYYY/MM/DD, DD.MM.YYYY or an RFC 3339 timestamp; only the calendar day is kept."
    )]
    pub period_end_date: NaiveDate,

    #[schemars(description = "Revenue for the quarter in whole currency units")]
    pub revenue: f64,

    #[schemars(description = "Revenue less cost of sales")]
    pub gross_profit: f64,

    #[serde(default)]
    #[schemars(description = "Profit from operations. Defaults to 0 when not reported.")]
    pub operating_income: f64,

    #[serde(default)]
    #[schemars(description = "Total operating expenses. Defaults to 0 when not reported.")]
    pub operating_expenses: f64,

    #[schemars(description = "Profit after tax attributable to the quarter. Can be negative.")]
    pub net_income: f64,
}

impl FinancialRecord {
    pub fn get(&self, field: MetricField) -> f64 {
        match field {
            MetricField::Revenue => self.revenue,
            MetricField::GrossProfit => self.gross_profit,
            MetricField::OperatingIncome => self.operating_income,
            MetricField::OperatingExpenses => self.operating_expenses,
            MetricField::NetIncome => self.net_income,
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(FinancialRecord)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Selectable numeric field of a [`FinancialRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Revenue,
    GrossProfit,
    OperatingIncome,
    OperatingExpenses,
    NetIncome,
}

impl MetricField {
    pub const ALL: [MetricField; 5] = [
        MetricField::Revenue,
        MetricField::GrossProfit,
        MetricField::OperatingIncome,
        MetricField::OperatingExpenses,
        MetricField::NetIncome,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::Revenue => "revenue",
            MetricField::GrossProfit => "gross_profit",
            MetricField::OperatingIncome => "operating_income",
            MetricField::OperatingExpenses => "operating_expenses",
            MetricField::NetIncome => "net_income",
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricField {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        MetricField::ALL
            .into_iter()
            .find(|field| field.as_str() == s.trim())
            .ok_or_else(|| MetricsError::UnknownField(s.to_string()))
    }
}

/// Which profit line a margin is taken over revenue for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MarginKind {
    Gross,
    Operating,
    Net,
}

impl MarginKind {
    pub fn numerator(&self) -> MetricField {
        match self {
            MarginKind::Gross => MetricField::GrossProfit,
            MarginKind::Operating => MetricField::OperatingIncome,
            MarginKind::Net => MetricField::NetIncome,
        }
    }
}

/// Inclusive date interval; a `None` bound is open on that side.
///
/// Deserialization goes through [`DateRange::new`], so an inverted range read
/// from JSON is rejected the same way as one built in code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct RawDateRange {
    #[serde(default)]
    from: Option<NaiveDate>,
    #[serde(default)]
    to: Option<NaiveDate>,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = MetricsError;

    fn try_from(raw: RawDateRange) -> Result<Self> {
        DateRange::new(raw.from, raw.to)
    }
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(MetricsError::InvalidDateRange {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        }
        Ok(Self { from, to })
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| from <= date) && self.to.map_or(true, |to| date <= to)
    }
}

/// Raw, per-entity records as returned by a [`crate::store::RecordStore`].
pub type RecordSet = BTreeMap<EntityId, Vec<FinancialRecord>>;

/// One synthesized time point of a multi-entity series.
///
/// Every requested entity has a key; `None` marks that the entity had no
/// observation (or an undefined value) for this exact date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    pub period_end_date: NaiveDate,
    pub values: BTreeMap<EntityId, Option<f64>>,
}

impl AlignedRow {
    pub fn value(&self, entity: &EntityId) -> Option<f64> {
        self.values.get(entity).copied().flatten()
    }

    pub fn has_entity(&self, entity: &EntityId) -> bool {
        self.values.contains_key(entity)
    }
}

/// Latest-period KPI card contents for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub entity: EntityId,
    pub period_end_date: NaiveDate,
    pub headline_value: f64,
    pub gross_margin_pct: Option<f64>,
    pub net_margin_pct: Option<f64>,
    pub trailing_aggregate: f64,
    pub delta_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntityConfig {
    #[schemars(description = "URL-friendly slug, also the data directory name")]
    pub id: EntityId,

    #[serde(default)]
    #[schemars(description = "Human readable company name for cards and legends")]
    pub display_name: Option<String>,
}

impl EntityConfig {
    pub fn label(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.id.as_str().replace('-', " "))
    }
}

fn default_trailing_window() -> usize {
    4
}

/// Fixed set of selectable entities plus where their data lives.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DashboardConfig {
    pub entities: Vec<EntityConfig>,

    #[serde(default)]
    #[schemars(description = "Base URL the per-entity `data/<slug>/all.json` files are served from")]
    pub data_base_url: Option<String>,

    #[serde(default)]
    #[schemars(description = "Endpoint accepting chat questions, e.g. http://localhost:8000/api/chat")]
    pub chat_url: Option<String>,

    #[serde(default = "default_trailing_window")]
    #[schemars(description = "Number of quarters summed for trailing aggregates (4 = TTM)")]
    pub trailing_window: usize,
}

impl DashboardConfig {
    pub fn new(entities: Vec<EntityConfig>) -> Self {
        Self {
            entities,
            data_base_url: None,
            chat_url: None,
            trailing_window: default_trailing_window(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DashboardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trailing_window == 0 {
            return Err(MetricsError::InvalidConfig(
                "trailing_window must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entity in &self.entities {
            if entity.id.as_str().trim().is_empty() {
                return Err(MetricsError::InvalidConfig(
                    "entity id must not be empty".to_string(),
                ));
            }
            if !seen.insert(entity.id.clone()) {
                return Err(MetricsError::InvalidConfig(format!(
                    "entity id '{}' is listed more than once",
                    entity.id
                )));
            }
        }

        Ok(())
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|e| e.id.clone()).collect()
    }

    pub fn entity(&self, id: &EntityId) -> Option<&EntityConfig> {
        self.entities.iter().find(|e| &e.id == id)
    }
}
