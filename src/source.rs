// Input boundary
//
// A DatasetSource yields the two typed input datasets. The shipped source
// resolves catalog tables to `<prefix>/<database>/<table>/` on the storage
// backend and reads newline-delimited JSON objects from every data file there.

use async_trait::async_trait;
use campaign2parquet_config::RuntimeConfig;
use campaign2parquet_core::decode::{decode_campaign_info, decode_user_campaign};
use campaign2parquet_core::{CampaignInfo, Dataset, TransformError, UserCampaign};
use opendal::{EntryMode, ErrorKind, Operator};
use serde_json::Value;

use crate::error::PipelineError;

/// Object suffixes treated as table data; everything else (markers,
/// checksums, manifests) is ignored
const DATA_SUFFIXES: &[&str] = &[".json", ".jsonl", ".ndjson"];

/// Supplies both input datasets, validated and typed
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn read_campaign_infos(&self) -> Result<Vec<CampaignInfo>, PipelineError>;

    async fn read_user_campaigns(&self) -> Result<Vec<UserCampaign>, PipelineError>;
}

/// Reads catalog tables stored as JSON Lines on an opendal operator
#[derive(Debug, Clone)]
pub struct CatalogJsonSource {
    op: Operator,
    campaign_info_dir: String,
    user_campaign_dir: String,
}

impl CatalogJsonSource {
    pub fn new(
        op: Operator,
        prefix: &str,
        database: &str,
        campaign_info_table: &str,
        user_campaign_table: &str,
    ) -> Self {
        Self {
            op,
            campaign_info_dir: table_dir(prefix, database, campaign_info_table),
            user_campaign_dir: table_dir(prefix, database, user_campaign_table),
        }
    }

    pub fn from_config(op: Operator, config: &RuntimeConfig) -> Self {
        Self::new(
            op,
            &config.input.prefix,
            &config.job.database,
            &config.job.campaign_info_table,
            &config.job.user_campaign_table,
        )
    }

    async fn read_table<T>(
        &self,
        dataset: Dataset,
        dir: &str,
        decode: fn(Value, usize) -> Result<T, TransformError>,
    ) -> Result<Vec<T>, PipelineError> {
        let files = self.data_files(dataset, dir).await?;
        tracing::debug!(%dataset, dir, files = files.len(), "Reading table");

        let mut records = Vec::new();
        for path in &files {
            let data = self
                .op
                .read(path)
                .await
                .map_err(|e| PipelineError::read(dataset, format!("'{}': {}", path, e)))?;
            let bytes = data.to_vec();
            let text = std::str::from_utf8(&bytes).map_err(|e| {
                PipelineError::read(dataset, format!("'{}' is not UTF-8: {}", path, e))
            })?;

            for (line_no, line) in text.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let value: Value = serde_json::from_str(line).map_err(|e| {
                    PipelineError::read(dataset, format!("'{}' line {}: {}", path, line_no + 1, e))
                })?;
                records.push(decode(value, records.len() + 1)?);
            }
        }

        tracing::info!(%dataset, records = records.len(), "Read input table");
        Ok(records)
    }

    async fn data_files(&self, dataset: Dataset, dir: &str) -> Result<Vec<String>, PipelineError> {
        let entries = match self.op.list_with(dir).recursive(true).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(PipelineError::read(
                    dataset,
                    format!("failed to list '{}': {}", dir, e),
                ))
            }
        };

        let mut files: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.metadata().mode() == EntryMode::FILE)
            .map(|entry| entry.path().to_string())
            .filter(|path| is_data_file(path))
            .collect();
        files.sort();

        if files.is_empty() {
            tracing::warn!(%dataset, dir, "No data files found for table");
        }
        Ok(files)
    }
}

#[async_trait]
impl DatasetSource for CatalogJsonSource {
    async fn read_campaign_infos(&self) -> Result<Vec<CampaignInfo>, PipelineError> {
        self.read_table::<CampaignInfo>(
            Dataset::CampaignInfo,
            &self.campaign_info_dir,
            decode_campaign_info,
        )
        .await
    }

    async fn read_user_campaigns(&self) -> Result<Vec<UserCampaign>, PipelineError> {
        self.read_table::<UserCampaign>(
            Dataset::UserCampaign,
            &self.user_campaign_dir,
            decode_user_campaign,
        )
        .await
    }
}

fn table_dir(prefix: &str, database: &str, table: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}/{}/", database, table)
    } else {
        format!("{}/{}/{}/", prefix, database, table)
    }
}

fn is_data_file(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    !name.starts_with('_')
        && !name.starts_with('.')
        && DATA_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}
