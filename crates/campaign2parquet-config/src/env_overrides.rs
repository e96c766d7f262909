use super::{FsConfig, LogFormat, RuntimeConfig, S3Config, StorageBackend};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "CAMPAIGN2PARQUET_";

/// Abstraction over environment-variable lookups so tests (and embedders)
/// can supply their own source of overrides.
pub trait EnvSource {
    /// Get a variable by its name without the CAMPAIGN2PARQUET_ prefix
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Job: catalog database and tables
    if let Some(database) = get_env_string(env, "DATABASE") {
        config.job.database = database;
    }
    if let Some(table) = get_env_string(env, "USER_CAMPAIGN_TABLE") {
        config.job.user_campaign_table = table;
    }
    if let Some(table) = get_env_string(env, "CAMPAIGN_INFO_TABLE") {
        config.job.campaign_info_table = table;
    }

    if let Some(prefix) = get_env_string(env, "INPUT_PREFIX") {
        config.input.prefix = prefix;
    }
    if let Some(path) = get_env_string(env, "OUTPUT_PATH") {
        config.output.base_path = path;
    }

    // Transform choices
    if let Some(mode) = get_env_string(env, "FLATTEN_MODE") {
        config.transform.flatten_mode = mode
            .parse()
            .map_err(|e: String| anyhow!(e))
            .context("Invalid CAMPAIGN2PARQUET_FLATTEN_MODE value")?;
    }
    if let Some(policy) = get_env_string(env, "MALFORMED_ROWS") {
        config.transform.malformed_rows = policy
            .parse()
            .map_err(|e: String| anyhow!(e))
            .context("Invalid CAMPAIGN2PARQUET_MALFORMED_ROWS value")?;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.log.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.log.format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
    }

    // Storage backend
    if let Some(backend) = get_env_string(env, "STORAGE_BACKEND") {
        config.storage.backend = backend
            .parse::<StorageBackend>()
            .context("Invalid CAMPAIGN2PARQUET_STORAGE_BACKEND value")?;
    }
    if let Some(val) = get_env_usize(env, "PARQUET_ROW_GROUP_SIZE")? {
        config.storage.parquet_row_group_size = val;
    }

    // Filesystem storage
    if let Some(path) = get_env_string(env, "STORAGE_PATH") {
        config.storage.fs.get_or_insert_with(FsConfig::default).path = path;
    }

    // S3 storage
    if let Some(bucket) = get_env_string(env, "S3_BUCKET") {
        ensure_s3(config).bucket = bucket;
    }
    if let Some(region) = get_env_string(env, "S3_REGION") {
        ensure_s3(config).region = region;
    }
    if let Some(endpoint) = get_env_string(env, "S3_ENDPOINT") {
        ensure_s3(config).endpoint = Some(endpoint);
    }

    Ok(())
}

fn ensure_s3(config: &mut RuntimeConfig) -> &mut S3Config {
    config.storage.s3.get_or_insert_with(|| S3Config {
        bucket: String::new(),
        region: String::new(),
        endpoint: None,
    })
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key)
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val
                .parse::<usize>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}
