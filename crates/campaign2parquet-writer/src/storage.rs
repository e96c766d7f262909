//! Storage operator construction.

use campaign2parquet_config::{StorageBackend, StorageConfig};
use opendal::Operator;

use crate::error::{Result, WriterError};

/// Build an opendal operator for the configured backend.
///
/// The operator is owned by the caller and handed to the source and writer;
/// nothing is cached process-wide.
pub fn build_operator(config: &StorageConfig) -> Result<Operator> {
    let operator = match config.backend {
        StorageBackend::Fs => {
            let fs = config.fs.as_ref().ok_or_else(|| {
                WriterError::invalid_config("fs config required for filesystem backend".to_string())
            })?;

            let fs_builder = opendal::services::Fs::default().root(&fs.path);
            Operator::new(fs_builder)
                .map_err(|e| {
                    WriterError::invalid_config(format!(
                        "Failed to create filesystem operator: {}",
                        e
                    ))
                })?
                .finish()
        }
        StorageBackend::S3 => {
            let s3 = config.s3.as_ref().ok_or_else(|| {
                WriterError::invalid_config("s3 config required for S3 backend".to_string())
            })?;

            let mut s3_builder = opendal::services::S3::default()
                .bucket(&s3.bucket)
                .region(&s3.region);

            if let Some(endpoint) = &s3.endpoint {
                s3_builder = s3_builder.endpoint(endpoint);
            }

            Operator::new(s3_builder)
                .map_err(|e| {
                    WriterError::invalid_config(format!("Failed to create S3 operator: {}", e))
                })?
                .finish()
        }
    };

    tracing::debug!(backend = %config.backend, "Storage operator initialized");
    Ok(operator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign2parquet_config::FsConfig;

    #[test]
    fn builds_fs_operator() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            fs: Some(FsConfig {
                path: dir.path().to_string_lossy().to_string(),
            }),
            ..StorageConfig::default()
        };
        assert!(build_operator(&config).is_ok());
    }

    #[test]
    fn missing_backend_section_is_invalid_config() {
        let config = StorageConfig {
            backend: StorageBackend::S3,
            s3: None,
            ..StorageConfig::default()
        };
        let err = build_operator(&config).unwrap_err();
        assert!(matches!(err, WriterError::InvalidConfig { .. }));

    }
}
