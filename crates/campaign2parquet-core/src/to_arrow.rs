// Enriched progress records → Arrow RecordBatch

use arrow::array::{ArrayRef, Float64Builder, RecordBatch, StringBuilder};
use std::sync::Arc;

use crate::error::TransformError;
use crate::schema::enriched_progress_schema_arc;
use crate::types::EnrichedProgressRecord;

/// Build a RecordBatch (file schema, without the partition column) from records.
pub fn records_to_batch(
    records: &[EnrichedProgressRecord],
) -> Result<RecordBatch, TransformError> {
    let n = records.len();
    let mut user_id = StringBuilder::with_capacity(n, n * 16);
    let mut campaign_id = StringBuilder::with_capacity(n, n * 16);
    let mut total_rewards = Float64Builder::with_capacity(n);
    let mut updated_at = StringBuilder::with_capacity(n, n * 24);
    let mut campaign_state = StringBuilder::with_capacity(n, n * 12);
    let mut task_state = StringBuilder::with_capacity(n, n * 12);
    let mut reward_earned = Float64Builder::with_capacity(n);
    let mut task_id = StringBuilder::with_capacity(n, n * 16);
    let mut validated_at = StringBuilder::with_capacity(n, n * 24);
    let mut failure_reason = StringBuilder::new();
    let mut task_deadline = StringBuilder::with_capacity(n, n * 24);

    for r in records {
        user_id.append_value(&r.user_id);
        campaign_id.append_value(&r.campaign_id);
        total_rewards.append_option(r.total_task_rewards_earned);
        updated_at.append_option(r.updated_at.as_deref());
        campaign_state.append_option(r.user_campaign_progress_state.as_deref());
        task_state.append_option(r.user_campaign_task_progress_state.as_deref());
        reward_earned.append_option(r.reward_earned);
        task_id.append_option(r.task_id.as_deref());
        validated_at.append_option(r.validated_at.as_deref());
        failure_reason.append_option(r.validation_failure_reason.as_deref());
        task_deadline.append_option(r.task_deadline.as_deref());
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(user_id.finish()),
        Arc::new(campaign_id.finish()),
        Arc::new(total_rewards.finish()),
        Arc::new(updated_at.finish()),
        Arc::new(campaign_state.finish()),
        Arc::new(task_state.finish()),
        Arc::new(reward_earned.finish()),
        Arc::new(task_id.finish()),
        Arc::new(validated_at.finish()),
        Arc::new(failure_reason.finish()),
        Arc::new(task_deadline.finish()),
    ];

    Ok(RecordBatch::try_new(enriched_progress_schema_arc(), columns)?)
}
