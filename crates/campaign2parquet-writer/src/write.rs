//! Partitioned Parquet writes with staging, publish and rollback.
//!
//! A run never writes into the committed tree directly. Partitions are encoded
//! and written under `_staging/<run_id>/` first; only when every partition is
//! staged is the committed tree moved aside to `_backup/<run_id>/` and the
//! staged tree moved into its place. A failure while publishing restores the
//! backup. Staging, backup and the run lock are removed on every exit path.

use campaign2parquet_config::RuntimeConfig;
use campaign2parquet_core::parquet::{encode_with_hash, writer_properties};
use campaign2parquet_core::{records_to_batch, EnrichedProgressRecord};
use opendal::Operator;
use std::collections::BTreeMap;

use crate::error::{Result, WriterError};
use crate::layout::Layout;
use crate::lock::RunLock;
use crate::tree;

/// One published partition file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSummary {
    /// Partition key value (`YYYY-MM-DD`)
    pub value: String,
    /// Committed path of the Parquet file
    pub path: String,
    pub rows: usize,
    pub bytes: usize,
}

/// Outcome of a committed write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Published partitions, ordered by value
    pub partitions: Vec<PartitionSummary>,
    pub total_rows: usize,
}

impl WriteSummary {
    pub fn total_bytes(&self) -> usize {
        self.partitions.iter().map(|p| p.bytes).sum()
    }
}

/// Writes enriched progress records as one Parquet file per `createdat_date`
/// value, replacing everything previously committed under the base path.
#[derive(Debug, Clone)]
pub struct PartitionedWriter {
    op: Operator,
    layout: Layout,
    row_group_size: usize,
}

impl PartitionedWriter {
    pub fn new(op: Operator, base_path: &str) -> Result<Self> {
        if base_path.trim_matches('/').is_empty() {
            return Err(WriterError::invalid_config(
                "output base path must not be empty or the storage root".to_string(),
            ));
        }

        Ok(Self {
            op,
            layout: Layout::new(base_path),
            row_group_size: 0,
        })
    }

    pub fn from_config(op: Operator, config: &RuntimeConfig) -> Result<Self> {
        Ok(Self::new(op, &config.output.base_path)?
            .with_row_group_size(config.storage.parquet_row_group_size))
    }

    /// Maximum rows per Parquet row group (0 selects the default)
    pub fn with_row_group_size(mut self, row_group_size: usize) -> Self {
        self.row_group_size = row_group_size;
        self
    }

    /// Stage, publish and commit `records` under the run lock.
    pub async fn write(
        &self,
        run_id: &str,
        records: Vec<EnrichedProgressRecord>,
    ) -> Result<WriteSummary> {
        let lock = RunLock::acquire(&self.op, self.layout.lock_path(), run_id).await?;

        let result = self.stage_and_publish(run_id, records).await;

        self.cleanup(run_id).await;
        lock.release(&self.op).await;
        result
    }

    async fn stage_and_publish(
        &self,
        run_id: &str,
        records: Vec<EnrichedProgressRecord>,
    ) -> Result<WriteSummary> {
        let partitions = self.stage(run_id, records).await?;
        self.publish(run_id).await?;

        let total_rows: usize = partitions.iter().map(|p| p.rows).sum();
        tracing::info!(
            run_id,
            partitions = partitions.len(),
            rows = total_rows,
            "Committed partitioned output to '{}'",
            self.layout.committed_dir()
        );

        Ok(WriteSummary {
            partitions,
            total_rows,
        })
    }

    /// Encode every partition group and write it below the staging directory.
    async fn stage(
        &self,
        run_id: &str,
        records: Vec<EnrichedProgressRecord>,
    ) -> Result<Vec<PartitionSummary>> {
        let staging = self.layout.staging_dir(run_id);
        let committed = self.layout.committed_dir();
        let props = writer_properties(self.row_group_size);

        let mut groups: BTreeMap<String, Vec<EnrichedProgressRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.createdat_date.clone())
                .or_default()
                .push(record);
        }

        let mut partitions = Vec::with_capacity(groups.len());
        for (value, group) in groups {
            let batch = records_to_batch(&group)?;
            let (bytes, hash) = encode_with_hash(&batch, &props)?;
            let relative = Layout::partition_file(&value, &hash.to_hex());
            let staged_path = format!("{}{}", staging, relative);
            let size = bytes.len();

            self.op.write(&staged_path, bytes).await.map_err(|e| {
                WriterError::write_failure(format!(
                    "Failed to stage partition '{}' at '{}': {}",
                    value, staged_path, e
                ))
            })?;

            tracing::debug!(
                run_id,
                partition = %value,
                rows = group.len(),
                bytes = size,
                "Staged partition"
            );

            partitions.push(PartitionSummary {
                path: format!("{}{}", committed, relative),
                rows: group.len(),
                bytes: size,
                value,
            });
        }

        Ok(partitions)
    }

    /// Swap the staged tree in for the committed one.
    async fn publish(&self, run_id: &str) -> Result<()> {
        let committed = self.layout.committed_dir();
        let backup = self.layout.backup_dir(run_id);
        let staging = self.layout.staging_dir(run_id);

        // Backup copies complete before any committed file is deleted, so
        // copying the backup over the committed tree always restores it
        if let Err(e) = tree::move_tree(&self.op, &committed, &backup).await {
            self.restore_backup(run_id, false).await;
            return Err(e);
        }

        let published = async {
            tree::move_tree(&self.op, &staging, &committed).await?;
            self.op
                .write(&self.layout.success_marker(), Vec::<u8>::new())
                .await
                .map_err(|e| {
                    WriterError::write_failure(format!("Failed to write _SUCCESS marker: {}", e))
                })?;
            Ok::<(), WriterError>(())
        }
        .await;

        if let Err(e) = published {
            tracing::error!(run_id, error = %e, "Publish failed, rolling back");
            self.restore_backup(run_id, true).await;
            return Err(e);
        }

        if let Err(e) = tree::remove_tree(&self.op, &backup).await {
            tracing::warn!(run_id, error = %e, "Failed to remove backup of previous output");
        }

        Ok(())
    }

    /// Put the previous committed tree back, optionally discarding whatever
    /// was partially published first.
    async fn restore_backup(&self, run_id: &str, discard_committed: bool) {
        let committed = self.layout.committed_dir();
        let backup = self.layout.backup_dir(run_id);

        if discard_committed {
            if let Err(e) = tree::remove_tree(&self.op, &committed).await {
                tracing::error!(run_id, error = %e, "Failed to remove partially published output");
            }
        }

        match tree::move_tree(&self.op, &backup, &committed).await {
            Ok(restored) => {
                tracing::warn!(run_id, files = restored.len(), "Restored previous output")
            }
            Err(e) => tracing::error!(
                run_id,
                backup = %backup,
                error = %e,
                "Failed to restore previous output; it remains under the backup path"
            ),
        }
    }

    async fn cleanup(&self, run_id: &str) {
        if let Err(e) = tree::remove_tree(&self.op, &self.layout.staging_dir(run_id)).await {
            tracing::warn!(run_id, error = %e, "Failed to remove staging directory");
        }

        for dir in [self.layout.staging_root(), self.layout.backup_root()] {
            if let Err(e) = tree::delete_file(&self.op, &dir).await {
                tracing::debug!(run_id, dir = %dir, error = %e, "Leaving directory in place");
            }
        }
    }
}
