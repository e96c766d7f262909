// Batch pipeline
//
// Init → ReadInputs → FlattenBoth → Join → ProjectPartitionKey →
// WritePartitions → Committed, with Failed reachable from every stage.
// Stages run strictly in order; only the two reads and the two flattens
// run concurrently with each other.

use campaign2parquet_config::{RuntimeConfig, TransformConfig};
use campaign2parquet_core::{
    enrich_progress, flatten_all, CampaignInfo, CampaignTaskRow, FlattenMode, JoinStats,
    PartitionKeyProjector, ProgressRow, UserCampaign,
};
use campaign2parquet_writer::{PartitionedWriter, WriteSummary};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::source::DatasetSource;

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ReadInputs,
    FlattenBoth,
    Join,
    ProjectPartitionKey,
    WritePartitions,
    Committed,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::ReadInputs => "read_inputs",
            Stage::FlattenBoth => "flatten_both",
            Stage::Join => "join",
            Stage::ProjectPartitionKey => "project_partition_key",
            Stage::WritePartitions => "write_partitions",
            Stage::Committed => "committed",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A failed run: the error and the stage it was raised in
#[derive(Debug, Error)]
#[error("Run {run_id} failed during {stage}: {source}")]
pub struct RunFailure {
    pub run_id: String,
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

impl RunFailure {
    pub fn exit_code(&self) -> u8 {
        self.source.exit_code()
    }
}

/// Counters for a committed run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub run_id: String,
    pub campaign_infos: usize,
    pub user_campaigns: usize,
    pub campaign_task_rows: usize,
    pub progress_rows: usize,
    pub join: JoinStats,
    /// Rows dropped for a malformed `createdAt` under the skip policy
    pub skipped_malformed: usize,
    pub write: WriteSummary,
}

/// One run of the fixed flatten → join → project → write topology
pub struct Pipeline<S> {
    source: S,
    writer: PartitionedWriter,
    transform: TransformConfig,
    run_id: String,
}

impl<S: DatasetSource> Pipeline<S> {
    pub fn new(source: S, writer: PartitionedWriter, transform: TransformConfig) -> Self {
        Self {
            source,
            writer,
            transform,
            run_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn from_config(source: S, writer: PartitionedWriter, config: &RuntimeConfig) -> Self {
        Self::new(source, writer, config.transform)
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Execute every stage; nothing is committed unless all stages succeed.
    pub async fn run(&self) -> Result<PipelineReport, RunFailure> {
        let mut stage = Stage::Init;
        tracing::info!(
            run_id = %self.run_id,
            stage = %stage,
            flatten_mode = %self.transform.flatten_mode,
            malformed_rows = %self.transform.malformed_rows,
            "Starting run"
        );

        match self.execute(&mut stage).await {
            Ok(report) => {
                self.transition(&mut stage, Stage::Committed);
                log_report(&report);
                Ok(report)
            }
            Err(source) => {
                let failed_in = stage;
                self.transition(&mut stage, Stage::Failed);
                tracing::error!(
                    run_id = %self.run_id,
                    stage = %failed_in,
                    code = source.code(),
                    kind = %source.kind(),
                    error = %source,
                    "Run failed"
                );
                Err(RunFailure {
                    run_id: self.run_id.clone(),
                    stage: failed_in,
                    source,
                })
            }
        }
    }

    async fn execute(&self, stage: &mut Stage) -> Result<PipelineReport, PipelineError> {
        self.transition(stage, Stage::ReadInputs);
        let (campaign_infos, user_campaigns) = tokio::try_join!(
            self.source.read_campaign_infos(),
            self.source.read_user_campaigns()
        )?;
        let campaign_info_count = campaign_infos.len();
        let user_campaign_count = user_campaigns.len();

        self.transition(stage, Stage::FlattenBoth);
        let mode = self.transform.flatten_mode;
        let (task_rows, progress_rows) =
            flatten_concurrently(campaign_infos, user_campaigns, mode).await?;
        tracing::debug!(
            run_id = %self.run_id,
            campaign_task_rows = task_rows.len(),
            progress_rows = progress_rows.len(),
            "Flattened inputs"
        );
        let campaign_task_rows = task_rows.len();
        let progress_row_count = progress_rows.len();

        self.transition(stage, Stage::Join);
        let (enriched, join) = enrich_progress(progress_rows, task_rows);
        if join.widened > 0 {
            tracing::warn!(
                run_id = %self.run_id,
                duplicate_right_keys = join.duplicate_right_keys,
                widened = join.widened,
                "Duplicate (campaignID, taskID) keys in campaign tasks widened the join"
            );
        }

        self.transition(stage, Stage::ProjectPartitionKey);
        let projected =
            PartitionKeyProjector::new(self.transform.malformed_rows).project_all(enriched)?;
        if projected.skipped > 0 {
            tracing::warn!(
                run_id = %self.run_id,
                skipped = projected.skipped,
                "Dropped rows with a malformed createdAt"
            );
        }

        self.transition(stage, Stage::WritePartitions);
        let write = self.writer.write(&self.run_id, projected.records).await?;

        Ok(PipelineReport {
            run_id: self.run_id.clone(),
            campaign_infos: campaign_info_count,
            user_campaigns: user_campaign_count,
            campaign_task_rows,
            progress_rows: progress_row_count,
            join,
            skipped_malformed: projected.skipped,
            write,
        })
    }

    fn transition(&self, stage: &mut Stage, next: Stage) {
        tracing::info!(run_id = %self.run_id, from = %stage, to = %next, "Stage transition");
        *stage = next;
    }
}

/// Flatten both inputs on blocking worker threads.
async fn flatten_concurrently(
    campaign_infos: Vec<CampaignInfo>,
    user_campaigns: Vec<UserCampaign>,
    mode: FlattenMode,
) -> Result<(Vec<CampaignTaskRow>, Vec<ProgressRow>), PipelineError> {
    let tasks = tokio::task::spawn_blocking(move || flatten_all(&campaign_infos, mode));
    let progress = tokio::task::spawn_blocking(move || flatten_all(&user_campaigns, mode));
    let (tasks, progress) = tokio::try_join!(tasks, progress)?;
    Ok((tasks, progress))
}

fn log_report(report: &PipelineReport) {
    tracing::info!(
        run_id = %report.run_id,
        campaign_infos = report.campaign_infos,
        user_campaigns = report.user_campaigns,
        campaign_task_rows = report.campaign_task_rows,
        progress_rows = report.progress_rows,
        matched = report.join.matched,
        unmatched = report.join.unmatched,
        widened = report.join.widened,
        skipped_malformed = report.skipped_malformed,
        partitions = report.write.partitions.len(),
        rows = report.write.total_rows,
        bytes = report.write.total_bytes(),
        "Run committed"
    );
}
