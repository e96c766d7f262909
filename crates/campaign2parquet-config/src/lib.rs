// campaign2parquet-config - Configuration for the batch job
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from CAMPAIGN2PARQUET_CONFIG env var (or --config)
// 3. Config file contents from CAMPAIGN2PARQUET_CONFIG_CONTENT env var
// 4. Default config file locations (./config.toml, ./.campaign2parquet.toml)
// 5. Built-in defaults (lowest priority)
//
// The resolved config is passed explicitly into every stage and never
// changes during a run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use campaign2parquet_core::{FlattenMode, MalformedRowPolicy};

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};

/// Main runtime configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub job: JobConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub transform: TransformConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Which catalog tables to read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub database: String,
    pub user_campaign_table: String,
    pub campaign_info_table: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            database: "kgendata".to_string(),
            user_campaign_table: "user_campaign".to_string(),
            campaign_info_table: "campaigninfo".to_string(),
        }
    }
}

/// Where table data lives on the storage backend
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// Prefix under which `<database>/<table>/` directories are resolved
    #[serde(default)]
    pub prefix: String,
}

/// Output location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Base path; partitions land under `<base_path>/partitioned/`
    pub base_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_path: "data".to_string(),
        }
    }
}

/// Transformation choices that change the output row set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub flatten_mode: FlattenMode,
    #[serde(default)]
    pub malformed_rows: MalformedRowPolicy,
}

/// Storage backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_parquet_row_group_size")]
    pub parquet_row_group_size: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            parquet_row_group_size: default_parquet_row_group_size(),
            fs: Some(FsConfig::default()),
            s3: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Fs,
    S3,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Fs => write!(f, "fs"),
            StorageBackend::S3 => write!(f, "s3"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fs" | "filesystem" => Ok(StorageBackend::Fs),
            "s3" | "aws" => Ok(StorageBackend::S3),
            _ => anyhow::bail!("Unsupported storage backend: {}. Supported: fs, s3", s),
        }
    }
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Fs
}

fn default_parquet_row_group_size() -> usize {
    32 * 1024
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsConfig {
    pub path: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            path: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl RuntimeConfig {
    /// Load configuration from a specific file path (for CLI usage).
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Load configuration from all sources with priority, using defaults when
    /// no config file exists. Named or inline config that fails to load is an
    /// error.
    pub fn load_or_default() -> Result<Self> {
        sources::load_or_default()
    }

    /// Parse a TOML document on top of the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config = RuntimeConfig::default();
        let file_config: RuntimeConfig =
            toml::from_str(content).context("Failed to parse config content")?;
        config.merge(file_config);
        Ok(config)
    }

    /// Merge another config into this one (used for TOML layering).
    pub fn merge(&mut self, other: RuntimeConfig) {
        self.job = other.job;
        self.input = other.input;
        self.output = other.output;
        self.transform = other.transform;
        self.storage = other.storage;
        self.log = other.log;
    }

    /// Apply environment overrides from a custom source.
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// Render the resolved configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config as TOML")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}
