//! Run-level error taxonomy.
//!
//! Every failure of a run maps to one [`ErrorKind`] with a stable code and a
//! process exit code, whichever crate raised it.

use campaign2parquet_core::{Dataset, TransformError};
use campaign2parquet_writer::{ErrorCode, WriterError};
use std::fmt;
use thiserror::Error;

/// Stable classification of run failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SchemaMismatch,
    MalformedDate,
    JoinKeyTypeMismatch,
    InvalidConfig,
    WriteError,
    ConcurrentRun,
    ReadError,
    /// Anything without a dedicated code (panicked worker tasks, etc.)
    Internal,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::SchemaMismatch => "E001",
            Self::MalformedDate => "E002",
            Self::JoinKeyTypeMismatch => "E003",
            Self::InvalidConfig => "E004",
            Self::WriteError => "E005",
            Self::ConcurrentRun => "E006",
            Self::ReadError => "E007",
            Self::Internal => "E000",
        }
    }

    /// Process exit code: 2 for E001 up to 8 for E007, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::SchemaMismatch => 2,
            Self::MalformedDate => 3,
            Self::JoinKeyTypeMismatch => 4,
            Self::InvalidConfig => 5,
            Self::WriteError => 6,
            Self::ConcurrentRun => 7,
            Self::ReadError => 8,
            Self::Internal => 1,
        }
    }
}

impl From<ErrorCode> for ErrorKind {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::E004InvalidConfig => Self::InvalidConfig,
            ErrorCode::E005WriteFailure => Self::WriteError,
            ErrorCode::E006ConcurrentRun => Self::ConcurrentRun,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SchemaMismatch => "SchemaMismatch",
            Self::MalformedDate => "MalformedDate",
            Self::JoinKeyTypeMismatch => "JoinKeyTypeMismatch",
            Self::InvalidConfig => "InvalidConfig",
            Self::WriteError => "WriteError",
            Self::ConcurrentRun => "ConcurrentRun",
            Self::ReadError => "ReadError",
            Self::Internal => "Internal",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Writer(#[from] WriterError),

    /// Listing or reading input objects failed, or a line was not JSON
    #[error("Failed to read {dataset} input: {message}")]
    Read { dataset: Dataset, message: String },

    /// A blocking worker task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Task(String),
}

impl PipelineError {
    pub fn read(dataset: Dataset, message: impl Into<String>) -> Self {
        Self::Read {
            dataset,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transform(e) => match e {
                TransformError::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
                TransformError::MalformedDate { .. } => ErrorKind::MalformedDate,
                TransformError::JoinKeyTypeMismatch { .. } => ErrorKind::JoinKeyTypeMismatch,
                TransformError::Encode(_) => ErrorKind::WriteError,
            },
            Self::Writer(e) => e.code().into(),
            Self::Read { .. } => ErrorKind::ReadError,
            Self::Task(_) => ErrorKind::Internal,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}
