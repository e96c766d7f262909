//! Error types for the transformation core

use std::fmt;
use thiserror::Error;

/// The two input datasets of the job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// Campaign definitions with their nested task arrays
    CampaignInfo,
    /// Per-user campaign progress with nested progress details
    UserCampaign,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CampaignInfo => "campaign_info",
            Self::UserCampaign => "user_campaign",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the pure transformation stages.
///
/// Every variant is fatal to a run unless the caller opted into skipping
/// malformed rows (see [`crate::MalformedRowPolicy`]).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// An input record lacks an expected field or carries an unusable value
    #[error("Schema mismatch in {dataset} record {record}: {detail}")]
    SchemaMismatch {
        dataset: Dataset,
        /// 1-based position of the record in its source
        record: usize,
        detail: String,
    },

    /// `createdAt` is shorter than 10 characters or not `YYYY-MM-DD` prefixed
    #[error("Malformed date in '{field}': {value:?} is not an ISO-8601 date-prefixed string")]
    MalformedDate { field: &'static str, value: String },

    /// A join key field is not a string on one side of the join
    #[error("Join key type mismatch in {dataset} record {record}: '{field}' is {found}, expected string")]
    JoinKeyTypeMismatch {
        dataset: Dataset,
        record: usize,
        field: String,
        found: &'static str,
    },

    /// Arrow or Parquet encoding failed
    #[error("Failed to encode output: {0}")]
    Encode(String),
}

impl From<arrow::error::ArrowError> for TransformError {
    fn from(e: arrow::error::ArrowError) -> Self {
        Self::Encode(e.to_string())
    }
}

impl From<::parquet::errors::ParquetError> for TransformError {
    fn from(e: ::parquet::errors::ParquetError) -> Self {
        Self::Encode(e.to_string())
    }
}
