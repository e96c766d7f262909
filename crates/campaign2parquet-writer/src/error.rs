//! Error types for partitioned Parquet writing.

use campaign2parquet_core::TransformError;
use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E004: Configuration missing or invalid
    E004InvalidConfig,
    /// E005: Write operation failed
    E005WriteFailure,
    /// E006: Another run holds the output lock
    E006ConcurrentRun,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E004InvalidConfig => "E004",
            Self::E005WriteFailure => "E005",
            Self::E006ConcurrentRun => "E006",
        }
    }
}

/// Errors that can occur while staging and publishing partitions
#[derive(Debug, Error)]
pub enum WriterError {
    /// Invalid configuration provided
    #[error("[{code}] Invalid configuration: {message}")]
    InvalidConfig { code: &'static str, message: String },

    /// Write operation failed
    #[error("[{code}] Write operation failed: {message}")]
    WriteFailure { code: &'static str, message: String },

    /// The run lock is already held
    #[error("[{code}] Output is locked by run '{holder}' ({lock_path}); remove the lock file if that run is gone")]
    ConcurrentRun {
        code: &'static str,
        lock_path: String,
        holder: String,
    },
}

impl WriterError {
    /// Create an invalid config error with error code
    pub fn invalid_config(message: String) -> Self {
        Self::InvalidConfig {
            code: ErrorCode::E004InvalidConfig.as_str(),
            message,
        }
    }

    /// Create a write failure error with error code
    pub fn write_failure(message: String) -> Self {
        Self::WriteFailure {
            code: ErrorCode::E005WriteFailure.as_str(),
            message,
        }
    }

    /// Create a concurrent run error with error code
    pub fn concurrent_run(lock_path: String, holder: String) -> Self {
        Self::ConcurrentRun {
            code: ErrorCode::E006ConcurrentRun.as_str(),
            lock_path,
            holder,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfig { .. } => ErrorCode::E004InvalidConfig,
            Self::WriteFailure { .. } => ErrorCode::E005WriteFailure,
            Self::ConcurrentRun { .. } => ErrorCode::E006ConcurrentRun,
        }
    }
}

impl From<TransformError> for WriterError {
    fn from(e: TransformError) -> Self {
        Self::write_failure(format!("Failed to encode partition: {}", e))
    }
}

/// Result type alias for WriterError
pub type Result<T> = std::result::Result<T, WriterError>;
