// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_job_config(&config.job)?;
    validate_output_config(&config.output)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

fn validate_job_config(config: &JobConfig) -> Result<()> {
    for (name, value) in [
        ("job.database", &config.database),
        ("job.user_campaign_table", &config.user_campaign_table),
        ("job.campaign_info_table", &config.campaign_info_table),
    ] {
        if value.trim().is_empty() {
            bail!(
                "{} must not be empty\n\n\
                How to fix:\n\
                  • TOML: [job] section\n\
                  • Environment: export {}{}=...",
                name,
                ENV_PREFIX,
                name.trim_start_matches("job.").to_uppercase()
            );
        }
        if value.contains('/') {
            bail!("{} must be a plain name, found '{}'", name, value);
        }
    }

    if config.user_campaign_table == config.campaign_info_table {
        bail!(
            "job.user_campaign_table and job.campaign_info_table must differ (both '{}')",
            config.user_campaign_table
        );
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<()> {
    let trimmed = config.base_path.trim_matches('/');
    if trimmed.is_empty() {
        bail!(
            "output.base_path must not be empty or the storage root\n\n\
            How to fix:\n\
              • Environment: export {}OUTPUT_PATH=data\n\
              • TOML: [output]\n              base_path = \"data\"",
            ENV_PREFIX
        );
    }

    if trimmed.split('/').any(|segment| segment == "..") {
        bail!("output.base_path must not contain '..' segments");
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    if config.parquet_row_group_size == 0 {
        bail!("storage.parquet_row_group_size must be greater than 0");
    }

    if config.parquet_row_group_size > 10_000_000 {
        warn!(
            parquet_row_group_size = config.parquet_row_group_size,
            "storage.parquet_row_group_size is very large; may cause memory issues"
        );
    }

    match config.backend {
        StorageBackend::Fs => {
            let fs = config
                .fs
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("fs storage backend requires 'fs' configuration"))?;

            if fs.path.is_empty() {
                bail!(
                    "Filesystem path is required\n\n\
                    How to fix:\n\
                      • Environment: export {}STORAGE_PATH=/data/campaigns\n\
                      • TOML: [storage.fs]\n              path = \"/data/campaigns\"",
                    ENV_PREFIX
                );
            }
        }
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("s3 storage backend requires 's3' configuration"))?;

            if s3.bucket.is_empty() {
                bail!(
                    "S3 bucket name is required\n\n\
                    How to fix:\n\
                      • Environment: export {}S3_BUCKET=my-bucket\n\
                      • TOML: [storage.s3]\n              bucket = \"my-bucket\"",
                    ENV_PREFIX
                );
            }

            if s3.region.is_empty() {
                bail!(
                    "S3 region is required\n\n\
                    How to fix:\n\
                      • Environment: export {}S3_REGION=us-west-2\n\
                      • TOML: [storage.s3]\n              region = \"us-west-2\"",
                    ENV_PREFIX
                );
            }
        }
    }

    Ok(())
}
