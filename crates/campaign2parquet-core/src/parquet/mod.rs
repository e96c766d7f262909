// Parquet file writing
//
// This module handles encoding Arrow RecordBatches to Parquet bytes.

pub mod writer;

pub use writer::{encode_with_hash, writer_properties, Blake3Hash, DEFAULT_ROW_GROUP_SIZE};
