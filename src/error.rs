use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Failed to retrieve records for {entity}: {details}")]
    Retrieval { entity: String, details: String },

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Unknown metric field '{0}': expected one of revenue, gross_profit, operating_income, operating_expenses, net_income")]
    UnknownField(String),

    #[error("Invalid date range: from {from} is after to {to}")]
    InvalidDateRange { from: String, to: String },

    #[error("Duplicate period end date {date} in records for {entity}")]
    DuplicatePeriod { entity: String, date: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "remote")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl MetricsError {
    pub fn retrieval(entity: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Retrieval {
            entity: entity.into(),
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetricsError>;
