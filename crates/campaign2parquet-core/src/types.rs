//! Statically typed records for both input datasets and the output.
//!
//! Input structs accept both the camelCase names and the lower-cased spellings
//! a catalog registers for top-level columns (`campaignid`, `createdat`, ...).
//! Nested struct fields keep their camelCase names in the catalog as well.

use serde::{Deserialize, Deserializer, Serialize};

/// Element of a campaign's task array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignTask {
    #[serde(rename = "taskID", alias = "taskid", alias = "taskId")]
    pub task_id: String,
    #[serde(rename = "rewardAmount", alias = "rewardamount", default)]
    pub reward_amount: Option<f64>,
    #[serde(rename = "taskDeadline", alias = "taskdeadline", default)]
    pub task_deadline: Option<String>,
}

/// A campaign definition with its ordered task list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignInfo {
    #[serde(rename = "campaignID", alias = "campaignid", alias = "campaignId")]
    pub campaign_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(
        rename = "rewardClaimDeadline",
        alias = "rewardclaimdeadline",
        default
    )]
    pub reward_claim_deadline: Option<String>,
    #[serde(rename = "endsAtTimestamp", alias = "endsattimestamp", default)]
    pub ends_at_timestamp: Option<String>,
    #[serde(rename = "createdAt", alias = "createdat", default)]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", alias = "updatedat", default)]
    pub updated_at: Option<String>,
    #[serde(
        alias = "campaigntasks",
        alias = "campaignTasks",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub tasks: Vec<CampaignTask>,
}

/// Element of a user campaign's progress array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressDetail {
    #[serde(rename = "taskID", alias = "taskid", alias = "taskId")]
    pub task_id: String,
    #[serde(
        rename = "userCampaignTaskProgressState",
        alias = "usercampaigntaskprogressstate",
        default
    )]
    pub user_campaign_task_progress_state: Option<String>,
    #[serde(rename = "rewardEarned", alias = "rewardearned", default)]
    pub reward_earned: Option<f64>,
    #[serde(rename = "validatedAt", alias = "validatedat", default)]
    pub validated_at: Option<String>,
    #[serde(
        rename = "validationFailureReason",
        alias = "validationfailurereason",
        default
    )]
    pub validation_failure_reason: Option<String>,
}

/// A user's progress through one campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCampaign {
    #[serde(rename = "userID", alias = "userid", alias = "userId")]
    pub user_id: String,
    #[serde(rename = "campaignID", alias = "campaignid", alias = "campaignId")]
    pub campaign_id: String,
    #[serde(rename = "createdAt", alias = "createdat")]
    pub created_at: String,
    #[serde(
        rename = "totalTaskRewardsEarned",
        alias = "totaltaskrewardsearned",
        default
    )]
    pub total_task_rewards_earned: Option<f64>,
    #[serde(rename = "updatedAt", alias = "updatedat", default)]
    pub updated_at: Option<String>,
    #[serde(
        rename = "userCampaignProgressState",
        alias = "usercampaignprogressstate",
        default
    )]
    pub user_campaign_progress_state: Option<String>,
    #[serde(
        rename = "progressDetails",
        alias = "progressdetails",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub progress_details: Vec<ProgressDetail>,
}

/// Treat an explicit `null` array like an absent one
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// CampaignInfo × CampaignTask. Element fields are `None` only for rows
/// produced by an outer flatten of an empty task array.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignTaskRow {
    pub campaign_id: String,
    pub title: Option<String>,
    pub reward_claim_deadline: Option<String>,
    pub ends_at_timestamp: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub task_id: Option<String>,
    pub reward_amount: Option<f64>,
    pub task_deadline: Option<String>,
}

/// UserCampaign × ProgressDetail
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRow {
    pub user_id: String,
    pub campaign_id: String,
    pub created_at: String,
    pub total_task_rewards_earned: Option<f64>,
    pub updated_at: Option<String>,
    pub user_campaign_progress_state: Option<String>,
    pub user_campaign_task_progress_state: Option<String>,
    pub reward_earned: Option<f64>,
    pub task_id: Option<String>,
    pub validated_at: Option<String>,
    pub validation_failure_reason: Option<String>,
}

/// A progress row after the left join, before partition-key projection
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedProgressRow {
    pub progress: ProgressRow,
    pub task_deadline: Option<String>,
}

/// Final output record: `createdAt` replaced by the `createdat_date` partition key
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedProgressRecord {
    pub user_id: String,
    pub campaign_id: String,
    pub total_task_rewards_earned: Option<f64>,
    pub updated_at: Option<String>,
    pub user_campaign_progress_state: Option<String>,
    pub user_campaign_task_progress_state: Option<String>,
    pub reward_earned: Option<f64>,
    pub task_id: Option<String>,
    pub validated_at: Option<String>,
    pub validation_failure_reason: Option<String>,
    pub task_deadline: Option<String>,
    pub createdat_date: String,
}
