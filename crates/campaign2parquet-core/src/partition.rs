//! Partition key projection.
//!
//! The partition key is the `YYYY-MM-DD` prefix of `createdAt`. Projection adds
//! it as `createdat_date` and drops `createdAt` from the record. A value that
//! is shorter than 10 characters or whose prefix is not a calendar date is a
//! `MalformedDate` error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TransformError;
use crate::types::{EnrichedProgressRecord, EnrichedProgressRow};

/// Partition column name, used for the Hive-style directory segment
pub const PARTITION_COLUMN: &str = "createdat_date";

/// Number of leading characters of `createdAt` forming the partition key
pub const PARTITION_KEY_LEN: usize = 10;

const SOURCE_FIELD: &str = "createdAt";

/// What to do with rows whose `createdAt` cannot be projected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRowPolicy {
    /// Abort the run on the first malformed row
    #[default]
    Fail,
    /// Drop malformed rows and report how many were dropped
    Skip,
}

impl std::fmt::Display for MalformedRowPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedRowPolicy::Fail => write!(f, "fail"),
            MalformedRowPolicy::Skip => write!(f, "skip"),
        }
    }
}

impl std::str::FromStr for MalformedRowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(MalformedRowPolicy::Fail),
            "skip" => Ok(MalformedRowPolicy::Skip),
            _ => Err(format!(
                "Unsupported malformed row policy: {}. Supported: fail, skip",
                s
            )),
        }
    }
}

/// Derive the partition key from an ISO-8601 date-prefixed string.
///
/// `"2024-05-01T12:00:00Z"` → `"2024-05-01"`.
pub fn partition_key(created_at: &str) -> Result<&str, TransformError> {
    let malformed = || TransformError::MalformedDate {
        field: SOURCE_FIELD,
        value: created_at.to_string(),
    };

    let prefix = created_at.get(..PARTITION_KEY_LEN).ok_or_else(malformed)?;

    // Shape check first: chrono accepts unpadded months and days
    let shaped = prefix.bytes().enumerate().all(|(i, b)| match i {
        4 | 7 => b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shaped {
        return Err(malformed());
    }

    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").map_err(|_| malformed())?;
    Ok(prefix)
}

/// Output of projecting a set of rows
#[derive(Debug, Clone, PartialEq)]
pub struct Projected {
    pub records: Vec<EnrichedProgressRecord>,
    /// Rows dropped under [`MalformedRowPolicy::Skip`]
    pub skipped: usize,
}

/// Replaces `createdAt` with the `createdat_date` partition key
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionKeyProjector {
    policy: MalformedRowPolicy,
}

impl PartitionKeyProjector {
    pub fn new(policy: MalformedRowPolicy) -> Self {
        Self { policy }
    }

    /// Project a single row.
    pub fn project(
        &self,
        row: EnrichedProgressRow,
    ) -> Result<EnrichedProgressRecord, TransformError> {
        let EnrichedProgressRow {
            progress,
            task_deadline,
        } = row;
        let createdat_date = partition_key(&progress.created_at)?.to_string();

        Ok(EnrichedProgressRecord {
            user_id: progress.user_id,
            campaign_id: progress.campaign_id,
            total_task_rewards_earned: progress.total_task_rewards_earned,
            updated_at: progress.updated_at,
            user_campaign_progress_state: progress.user_campaign_progress_state,
            user_campaign_task_progress_state: progress.user_campaign_task_progress_state,
            reward_earned: progress.reward_earned,
            task_id: progress.task_id,
            validated_at: progress.validated_at,
            validation_failure_reason: progress.validation_failure_reason,
            task_deadline,
            createdat_date,
        })
    }

    /// Project every row, failing or skipping malformed ones per policy.
    pub fn project_all(
        &self,
        rows: impl IntoIterator<Item = EnrichedProgressRow>,
    ) -> Result<Projected, TransformError> {
        let mut records = Vec::new();
        let mut skipped = 0;

        for row in rows {
            match self.project(row) {
                Ok(record) => records.push(record),
                Err(e @ TransformError::MalformedDate { .. })
                    if self.policy == MalformedRowPolicy::Skip =>
                {
                    tracing::debug!(error = %e, "Skipping row with malformed partition date");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Projected { records, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProgressRow;

    fn row(created_at: &str) -> EnrichedProgressRow {
        EnrichedProgressRow {
            progress: ProgressRow {
                user_id: "u1".to_string(),
                campaign_id: "c1".to_string(),
                created_at: created_at.to_string(),
                total_task_rewards_earned: None,
                updated_at: None,
                user_campaign_progress_state: None,
                user_campaign_task_progress_state: None,
                reward_earned: Some(5.0),
                task_id: Some("t1".to_string()),
                validated_at: None,
                validation_failure_reason: None,
            },
            task_deadline: Some("2024-06-01".to_string()),
        }
    }

    #[test]
    fn takes_date_prefix() {
        assert_eq!(partition_key("2024-05-01T12:00:00Z").unwrap(), "2024-05-01");
        assert_eq!(partition_key("2024-05-01").unwrap(), "2024-05-01");
    }

    #[test]
    fn rejects_malformed_dates() {
        for bad in [
            "short",
            "",
            "2024-05-0",
            "2024/05/01T00",
            "2024-13-01",
            "2024-5-1T00:00",
            "20240501T0000",
        ] {
            assert!(
                matches!(partition_key(bad), Err(TransformError::MalformedDate { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_non_char_boundary_without_panicking() {
        assert!(partition_key("2024-05-0é").is_err());
    }

    #[test]
    fn project_drops_created_at() {
        let record = PartitionKeyProjector::default()
            .project(row("2024-05-01T00:00:00Z"))
            .unwrap();
        assert_eq!(record.createdat_date, "2024-05-01");
        assert_eq!(record.task_deadline.as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn fail_policy_aborts() {
        let err = PartitionKeyProjector::new(MalformedRowPolicy::Fail)
            .project_all(vec![row("2024-05-01T00:00:00Z"), row("short")])
            .unwrap_err();
        assert!(matches!(err, TransformError::MalformedDate { .. }));
    }

    #[test]
    fn skip_policy_counts_dropped_rows() {
        let projected = PartitionKeyProjector::new(MalformedRowPolicy::Skip)
            .project_all(vec![
                row("2024-05-01T00:00:00Z"),
                row("short"),
                row("2024-05-02T00:00:00Z"),
            ])
            .unwrap();
        assert_eq!(projected.records.len(), 2);
        assert_eq!(projected.skipped, 1);
    }
}
