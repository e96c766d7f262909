// Arrow schema for enriched progress records
//
// Column names follow the catalog spelling of the source tables: top-level
// UserCampaign columns are lower-cased, fields lifted out of the nested
// progress/task structs keep their camelCase. The partition column is not part
// of the file schema; it is encoded in the `createdat_date=<date>` directory.

use arrow::datatypes::{DataType, Field, Schema};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Output column names
pub mod field {
    pub const USER_ID: &str = "userid";
    pub const CAMPAIGN_ID: &str = "campaignid";
    pub const TOTAL_TASK_REWARDS_EARNED: &str = "totaltaskrewardsearned";
    pub const UPDATED_AT: &str = "updatedat";
    pub const USER_CAMPAIGN_PROGRESS_STATE: &str = "usercampaignprogressstate";
    pub const USER_CAMPAIGN_TASK_PROGRESS_STATE: &str = "userCampaignTaskProgressState";
    pub const REWARD_EARNED: &str = "rewardEarned";
    pub const TASK_ID: &str = "taskID";
    pub const VALIDATED_AT: &str = "validatedAt";
    pub const VALIDATION_FAILURE_REASON: &str = "validationFailureReason";
    pub const TASK_DEADLINE: &str = "taskDeadline";
}

/// Helper to create a Field with PARQUET:field_id metadata
fn field_with_id(name: &str, data_type: DataType, nullable: bool, id: i32) -> Field {
    let metadata = HashMap::from([("PARQUET:field_id".to_string(), id.to_string())]);
    Field::new(name, data_type, nullable).with_metadata(metadata)
}

/// Returns the Arrow schema of the Parquet files written per partition
pub fn enriched_progress_schema() -> Schema {
    enriched_progress_schema_arc().as_ref().clone()
}

/// Returns a cached `Arc<Schema>` for the enriched progress schema.
pub fn enriched_progress_schema_arc() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| Arc::new(build_schema())))
}

fn build_schema() -> Schema {
    Schema::new(vec![
        // UserCampaign scalars
        field_with_id(field::USER_ID, DataType::Utf8, false, 1),
        field_with_id(field::CAMPAIGN_ID, DataType::Utf8, false, 2),
        field_with_id(field::TOTAL_TASK_REWARDS_EARNED, DataType::Float64, true, 3),
        field_with_id(field::UPDATED_AT, DataType::Utf8, true, 4),
        field_with_id(field::USER_CAMPAIGN_PROGRESS_STATE, DataType::Utf8, true, 5),
        // ProgressDetail fields
        field_with_id(field::USER_CAMPAIGN_TASK_PROGRESS_STATE, DataType::Utf8, true, 6),
        field_with_id(field::REWARD_EARNED, DataType::Float64, true, 7),
        // Nullable: outer flatten rows carry no task
        field_with_id(field::TASK_ID, DataType::Utf8, true, 8),
        field_with_id(field::VALIDATED_AT, DataType::Utf8, true, 9),
        field_with_id(field::VALIDATION_FAILURE_REASON, DataType::Utf8, true, 10),
        // From the joined CampaignTask
        field_with_id(field::TASK_DEADLINE, DataType::Utf8, true, 11),
    ])
}
