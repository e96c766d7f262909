//! Left outer hash join on the composite (campaignID, taskID) key.
//!
//! Build phase indexes the right side by key; probe phase walks the left side
//! once. Every left row is emitted at least once. When several right rows share
//! a key, the left row fans out into one output row per match instead of
//! silently keeping the first one; those extra rows are counted as `widened`.
//! A key with a null component never matches.

use std::collections::HashMap;

use crate::types::{CampaignTaskRow, EnrichedProgressRow, ProgressRow};

/// Borrowed composite join key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JoinKey<'a> {
    pub campaign_id: &'a str,
    pub task_id: &'a str,
}

/// Rows that can take part in the (campaignID, taskID) join
pub trait JoinKeyed {
    /// `None` when a key component is null
    fn join_key(&self) -> Option<JoinKey<'_>>;
}

impl JoinKeyed for ProgressRow {
    fn join_key(&self) -> Option<JoinKey<'_>> {
        Some(JoinKey {
            campaign_id: &self.campaign_id,
            task_id: self.task_id.as_deref()?,
        })
    }
}

impl JoinKeyed for CampaignTaskRow {
    fn join_key(&self) -> Option<JoinKey<'_>> {
        Some(JoinKey {
            campaign_id: &self.campaign_id,
            task_id: self.task_id.as_deref()?,
        })
    }
}

/// Counters describing one join
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub left_rows: usize,
    pub right_rows: usize,
    /// Left rows with at least one match
    pub matched: usize,
    /// Left rows emitted with null right fields
    pub unmatched: usize,
    /// Right rows whose key was already indexed
    pub duplicate_right_keys: usize,
    /// Output rows beyond one per left row, caused by duplicate right keys
    pub widened: usize,
}

impl JoinStats {
    pub fn output_rows(&self) -> usize {
        self.left_rows + self.widened
    }
}

/// Result of a left join: each left row paired with its projected match
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutput<L, P> {
    pub rows: Vec<(L, Option<P>)>,
    pub stats: JoinStats,
}

/// Left outer join `left` with `right`, keeping `project(right_row)` for matches.
pub fn left_join<L, R, P, F>(
    left: impl IntoIterator<Item = L>,
    right: impl IntoIterator<Item = R>,
    project: F,
) -> JoinOutput<L, P>
where
    L: JoinKeyed + Clone,
    R: JoinKeyed,
    P: Clone,
    F: Fn(&R) -> P,
{
    let mut stats = JoinStats::default();

    // campaign -> task -> projected matches; nested so probing needs no allocation
    let mut index: HashMap<String, HashMap<String, Vec<P>>> = HashMap::new();
    for row in right {
        stats.right_rows += 1;
        let Some(key) = row.join_key() else {
            continue;
        };
        let matches = index
            .entry(key.campaign_id.to_owned())
            .or_default()
            .entry(key.task_id.to_owned())
            .or_default();
        if !matches.is_empty() {
            stats.duplicate_right_keys += 1;
        }
        matches.push(project(&row));
    }

    let mut rows = Vec::new();
    for row in left {
        stats.left_rows += 1;
        let matches = row
            .join_key()
            .and_then(|key| index.get(key.campaign_id)?.get(key.task_id))
            .filter(|m| !m.is_empty());

        match matches {
            Some(matches) => {
                stats.matched += 1;
                stats.widened += matches.len() - 1;
                rows.extend(
                    matches
                        .iter()
                        .map(|projected| (row.clone(), Some(projected.clone()))),
                );
            }
            None => {
                stats.unmatched += 1;
                rows.push((row, None));
            }
        }
    }

    JoinOutput { rows, stats }
}

/// Enrich flattened progress rows with the matching task's deadline.
pub fn enrich_progress(
    progress: Vec<ProgressRow>,
    tasks: Vec<CampaignTaskRow>,
) -> (Vec<EnrichedProgressRow>, JoinStats) {
    let joined = left_join(progress, tasks, |task: &CampaignTaskRow| {
        task.task_deadline.clone()
    });

    let rows = joined
        .rows
        .into_iter()
        .map(|(progress, deadline)| EnrichedProgressRow {
            progress,
            task_deadline: deadline.flatten(),
        })
        .collect();

    (rows, joined.stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(campaign: &str, task: Option<&str>) -> ProgressRow {
        ProgressRow {
            user_id: "u1".to_string(),
            campaign_id: campaign.to_string(),
            created_at: "2024-05-01T00:00:00Z".to_string(),
            total_task_rewards_earned: None,
            updated_at: None,
            user_campaign_progress_state: None,
            user_campaign_task_progress_state: None,
            reward_earned: Some(5.0),
            task_id: task.map(str::to_string),
            validated_at: None,
            validation_failure_reason: None,
        }
    }

    fn task(campaign: &str, task: &str, deadline: Option<&str>) -> CampaignTaskRow {
        CampaignTaskRow {
            campaign_id: campaign.to_string(),
            title: None,
            reward_claim_deadline: None,
            ends_at_timestamp: None,
            created_at: None,
            updated_at: None,
            task_id: Some(task.to_string()),
            reward_amount: None,
            task_deadline: deadline.map(str::to_string),
        }
    }

    #[test]
    fn matches_on_both_key_components() {
        let (rows, stats) = enrich_progress(
            vec![progress("c1", Some("t1")), progress("c2", Some("t1"))],
            vec![
                task("c1", "t1", Some("2024-06-01")),
                task("c1", "t2", Some("2024-07-01")),
            ],
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].task_deadline.as_deref(), Some("2024-06-01"));
        // Same task id under another campaign must not match
        assert_eq!(rows[1].task_deadline, None);
        assert_eq!(stats.matched, 1);
        assert_eq!(stats.unmatched, 1);
        assert_eq!(stats.output_rows(), 2);
    }

    #[test]
    fn preserves_every_left_row_without_right_side() {
        let left: Vec<_> = (0..4)
            .map(|i| progress("c1", Some(&format!("t{i}"))))
            .collect();
        let (rows, stats) = enrich_progress(left.clone(), Vec::new());

        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.task_deadline.is_none()));
        let kept: Vec<_> = rows.into_iter().map(|r| r.progress).collect();
        assert_eq!(kept, left);
        assert_eq!(stats.unmatched, 4);
    }

    #[test]
    fn duplicate_right_keys_fan_out() {
        let (rows, stats) = enrich_progress(
            vec![progress("c1", Some("t1"))],
            vec![
                task("c1", "t1", Some("2024-06-01")),
                task("c1", "t1", Some("2024-06-15")),
            ],
        );

        let mut deadlines: Vec<_> = rows
            .iter()
            .map(|r| r.task_deadline.clone().unwrap())
            .collect();
        deadlines.sort();
        assert_eq!(deadlines, vec!["2024-06-01", "2024-06-15"]);
        assert_eq!(stats.duplicate_right_keys, 1);
        assert_eq!(stats.widened, 1);
        assert_eq!(stats.output_rows(), 2);
    }

    #[test]
    fn null_task_id_never_matches() {
        let (rows, stats) = enrich_progress(
            vec![progress("c1", None)],
            vec![task("c1", "t1", Some("2024-06-01"))],
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].task_deadline, None);
        assert_eq!(stats.unmatched, 1);
    }

    #[test]
    fn matched_task_with_null_deadline_stays_null() {
        let (rows, stats) = enrich_progress(
            vec![progress("c1", Some("t1"))],
            vec![task("c1", "t1", None)],
        );
        assert_eq!(rows[0].task_deadline, None);
        assert_eq!(stats.matched, 1);
    }
}
