//! Partitioned Parquet writer.
//!
//! Persists enriched progress records as `createdat_date=<date>` partitions
//! through OpenDAL, replacing the committed output of the previous run via
//! staging, publish and rollback under a single-writer run lock.

mod error;
mod layout;
mod lock;
mod storage;
mod tree;
mod write;

pub use error::{ErrorCode, Result, WriterError};
pub use storage::build_operator;
pub use write::{PartitionSummary, PartitionedWriter, WriteSummary};
