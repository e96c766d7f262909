//! Array flattening (explode).
//!
//! A parent record with an array field becomes one flat row per element; the
//! parent's scalar fields are copied onto every row and the element fields are
//! renamed into the flat row type. Which array is walked and how its fields are
//! renamed is fixed per parent type by its [`Explode`] impl.
//!
//! In [`FlattenMode::Inner`] an empty or absent array yields no rows at all, so
//! the parent disappears from the output. [`FlattenMode::Outer`] keeps such a
//! parent as a single row with null element fields.

use serde::{Deserialize, Serialize};

use crate::types::{
    CampaignInfo, CampaignTask, CampaignTaskRow, ProgressDetail, ProgressRow, UserCampaign,
};

/// How parents with an empty array are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlattenMode {
    /// Drop parents whose array is empty or absent
    #[default]
    Inner,
    /// Keep such parents as one row with null element fields
    Outer,
}

impl std::fmt::Display for FlattenMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlattenMode::Inner => write!(f, "inner"),
            FlattenMode::Outer => write!(f, "outer"),
        }
    }
}

impl std::str::FromStr for FlattenMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inner" => Ok(FlattenMode::Inner),
            "outer" => Ok(FlattenMode::Outer),
            _ => Err(format!(
                "Unsupported flatten mode: {}. Supported: inner, outer",
                s
            )),
        }
    }
}

/// A parent record that can be exploded on one nested array field
pub trait Explode {
    type Element;
    type Row;

    /// The nested array to explode
    fn elements(&self) -> &[Self::Element];

    /// Combine the parent's scalar fields with one element (or none, for the
    /// outer row of an empty array)
    fn row(&self, element: Option<&Self::Element>) -> Self::Row;
}

/// Flatten a single parent into its rows.
///
/// The returned iterator borrows `parent` and is consumed once.
pub fn flatten<P: Explode>(parent: &P, mode: FlattenMode) -> impl Iterator<Item = P::Row> + '_ {
    let elements = parent.elements();
    let outer = (elements.is_empty() && mode == FlattenMode::Outer).then(|| parent.row(None));

    elements
        .iter()
        .map(move |element| parent.row(Some(element)))
        .chain(outer)
}

/// Flatten a shard of parents.
pub fn flatten_all<P: Explode>(parents: &[P], mode: FlattenMode) -> Vec<P::Row> {
    parents.iter().flat_map(|p| flatten(p, mode)).collect()
}

impl Explode for CampaignInfo {
    type Element = CampaignTask;
    type Row = CampaignTaskRow;

    fn elements(&self) -> &[CampaignTask] {
        &self.tasks
    }

    fn row(&self, task: Option<&CampaignTask>) -> CampaignTaskRow {
        CampaignTaskRow {
            campaign_id: self.campaign_id.clone(),
            title: self.title.clone(),
            reward_claim_deadline: self.reward_claim_deadline.clone(),
            ends_at_timestamp: self.ends_at_timestamp.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
            task_id: task.map(|t| t.task_id.clone()),
            reward_amount: task.and_then(|t| t.reward_amount),
            task_deadline: task.and_then(|t| t.task_deadline.clone()),
        }
    }
}

impl Explode for UserCampaign {
    type Element = ProgressDetail;
    type Row = ProgressRow;

    fn elements(&self) -> &[ProgressDetail] {
        &self.progress_details
    }

    fn row(&self, detail: Option<&ProgressDetail>) -> ProgressRow {
        ProgressRow {
            user_id: self.user_id.clone(),
            campaign_id: self.campaign_id.clone(),
            created_at: self.created_at.clone(),
            total_task_rewards_earned: self.total_task_rewards_earned,
            updated_at: self.updated_at.clone(),
            user_campaign_progress_state: self.user_campaign_progress_state.clone(),
            user_campaign_task_progress_state: detail
                .and_then(|d| d.user_campaign_task_progress_state.clone()),
            reward_earned: detail.and_then(|d| d.reward_earned),
            task_id: detail.map(|d| d.task_id.clone()),
            validated_at: detail.and_then(|d| d.validated_at.clone()),
            validation_failure_reason: detail.and_then(|d| d.validation_failure_reason.clone()),
        }
    }
}
