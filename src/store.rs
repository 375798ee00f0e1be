//! Record Store Adapter: where raw per-entity records come from.
//!
//! Stores only retrieve and validate the wire format; every derived number is
//! computed by the pure modules after all fetches have resolved.

use crate::error::{MetricsError, Result};
use crate::schema::{EntityId, FinancialRecord, RecordSet};
use crate::utils::ensure_unique_periods;
use async_trait::async_trait;
use futures::future::join_all;
use log::{info, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;

/// File every entity's merged quarterly records are published under.
pub const RECORDS_FILE_NAME: &str = "all.json";

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    async fn fetch_records(&self, entity: &EntityId) -> Result<Vec<FinancialRecord>>;
}

/// Parses an `all.json` payload and rejects duplicate period end dates.
pub fn parse_records(entity: &EntityId, payload: &str) -> Result<Vec<FinancialRecord>> {
    let records: Vec<FinancialRecord> = serde_json::from_str(payload)?;
    ensure_unique_periods(entity, &records)?;
    Ok(records)
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordStore {
    records: BTreeMap<EntityId, Vec<FinancialRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: EntityId, records: Vec<FinancialRecord>) -> Result<()> {
        ensure_unique_periods(&entity, &records)?;
        self.records.insert(entity, records);
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_records(&self, entity: &EntityId) -> Result<Vec<FinancialRecord>> {
        self.records
            .get(entity)
            .cloned()
            .ok_or_else(|| MetricsError::retrieval(entity.as_str(), "no records loaded"))
    }
}

/// Reads `<root>/<entity>/all.json` from the local filesystem.
#[derive(Debug, Clone)]
pub struct JsonDirRecordStore {
    root: PathBuf,
}

impl JsonDirRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, entity: &EntityId) -> PathBuf {
        self.root.join(entity.as_str()).join(RECORDS_FILE_NAME)
    }
}

#[async_trait]
impl RecordStore for JsonDirRecordStore {
    fn name(&self) -> &'static str {
        "json-dir"
    }

    async fn fetch_records(&self, entity: &EntityId) -> Result<Vec<FinancialRecord>> {
        let path = self.path_for(entity);
        let payload = fs::read_to_string(&path).await.map_err(|e| {
            MetricsError::retrieval(entity.as_str(), format!("{}: {}", path.display(), e))
        })?;
        parse_records(entity, &payload)
    }
}

#[cfg(feature = "remote")]
pub use remote::HttpRecordStore;

#[cfg(feature = "remote")]
mod remote {
    use super::*;
    use reqwest::Client;
    use std::time::Duration;

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Fetches `<base_url>/data/<entity>/all.json`.
    #[derive(Clone)]
    pub struct HttpRecordStore {
        client: Client,
        base_url: String,
    }

    impl HttpRecordStore {
        pub fn new(base_url: impl Into<String>) -> Result<Self> {
            let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
            Ok(Self {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
            })
        }

        pub fn url_for(&self, entity: &EntityId) -> String {
            format!("{}/data/{}/{}", self.base_url, entity, RECORDS_FILE_NAME)
        }
    }

    #[async_trait]
    impl RecordStore for HttpRecordStore {
        fn name(&self) -> &'static str {
            "http"
        }

        async fn fetch_records(&self, entity: &EntityId) -> Result<Vec<FinancialRecord>> {
            let url = self.url_for(entity);
            let res = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| MetricsError::retrieval(entity.as_str(), e.to_string()))?;

            let status = res.status();
            if !status.is_success() {
                return Err(MetricsError::retrieval(
                    entity.as_str(),
                    format!("HTTP {} from {}", status, url),
                ));
            }

            let payload = res
                .text()
                .await
                .map_err(|e| MetricsError::retrieval(entity.as_str(), e.to_string()))?;
            parse_records(entity, &payload)
        }
    }

}

/// Records that were retrieved plus the entities that failed.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub records: RecordSet,
    pub failures: Vec<(EntityId, MetricsError)>,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turns any failure into an error for callers that cannot render a
    /// partial view.
    pub fn into_complete(self) -> Result<RecordSet> {
        match self.failures.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(self.records),
        }
    }
}

/// Fetches every entity concurrently. Failures are collected, not retried.
pub async fn fetch_all<S>(store: &S, entities: &[EntityId]) -> FetchOutcome
where
    S: RecordStore + ?Sized,
{
    info!(
        "Fetching records for {} entities from {} store",
        entities.len(),
        store.name()
    );

    let results = join_all(entities.iter().map(|entity| store.fetch_records(entity))).await;

    let mut outcome = FetchOutcome::default();
    for (entity, result) in entities.iter().zip(results) {
        match result {
            Ok(records) => {
                info!("Loaded {} records for {}", records.len(), entity);
                outcome.records.insert(entity.clone(), records);
            }
            Err(err) => {
                warn!("Failed to load records for {}: {}", entity, err);
                outcome.failures.push((entity.clone(), err));
            }
        }
    }

    outcome
}
