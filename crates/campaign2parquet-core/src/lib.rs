// campaign2parquet-core - Platform-agnostic core logic
//
// This crate contains the PURE processing logic for turning nested campaign
// datasets into date-partitioned progress records. No I/O, no async, no
// runtime dependencies.
//
// Topology is fixed: flatten CampaignInfo, flatten UserCampaign, left join on
// (campaignID, taskID), project the partition key, encode per partition.
// Storage, catalogs and scheduling live in the outer crates.

pub mod decode;
pub mod error;
pub mod flatten;
pub mod join;
pub mod parquet;
pub mod partition;
pub mod schema;
pub mod to_arrow;
pub mod types;

pub use error::{Dataset, TransformError};
pub use flatten::{flatten, flatten_all, Explode, FlattenMode};
pub use join::{enrich_progress, left_join, JoinKey, JoinKeyed, JoinOutput, JoinStats};
pub use partition::{
    partition_key, MalformedRowPolicy, PartitionKeyProjector, Projected, PARTITION_COLUMN,
};
pub use schema::{enriched_progress_schema, enriched_progress_schema_arc};
pub use to_arrow::records_to_batch;
pub use types::{
    CampaignInfo, CampaignTask, CampaignTaskRow, EnrichedProgressRecord, EnrichedProgressRow,
    ProgressDetail, ProgressRow, UserCampaign,
};

/// Result type alias for TransformError
pub type Result<T> = std::result::Result<T, TransformError>;
