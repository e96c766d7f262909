// campaign2parquet - flatten, join and date-partition campaign progress data
//
// Reads the CampaignInfo and UserCampaign tables, flattens their nested
// arrays, enriches every progress row with its task deadline and writes the
// result as `createdat_date=<YYYY-MM-DD>` Parquet partitions.
//
// The pure transformation lives in campaign2parquet-core, configuration in
// campaign2parquet-config and the staged writer in campaign2parquet-writer.

pub mod error;
mod init;
pub mod pipeline;
pub mod source;

pub use error::{ErrorKind, PipelineError};
pub use init::{init_storage, init_tracing};
pub use pipeline::{Pipeline, PipelineReport, RunFailure, Stage};
pub use source::{CatalogJsonSource, DatasetSource};

pub use campaign2parquet_config::RuntimeConfig;
pub use campaign2parquet_writer::{PartitionSummary, PartitionedWriter, WriteSummary};

/// Run the job once with a resolved configuration.
pub async fn run_with_config(config: &RuntimeConfig) -> anyhow::Result<PipelineReport> {
    let op = init_storage(config)?;
    let source = CatalogJsonSource::from_config(op.clone(), config);
    let writer = PartitionedWriter::from_config(op, config)?;
    let report = Pipeline::from_config(source, writer, config).run().await?;
    Ok(report)
}
