// Configuration source loading.
//
// Priority order:
// 1. Environment variables (CAMPAIGN2PARQUET_* prefix)
// 2. Config file path from CAMPAIGN2PARQUET_CONFIG
// 3. Inline config content from CAMPAIGN2PARQUET_CONFIG_CONTENT
// 4. Default config files (./config.toml, ./.campaign2parquet.toml)
// 5. Built-in defaults

use crate::env_overrides::{EnvSource, ENV_PREFIX};
use crate::*;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

fn read_toml(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Find the config file layer. Only a missing default-location file is
/// optional; an explicitly named file or inline content must load.
fn load_from_file<E: EnvSource>(env: &E) -> Result<Option<RuntimeConfig>> {
    if let Some(path) = env.get("CONFIG") {
        return read_toml(Path::new(&path))
            .with_context(|| format!("Invalid {}CONFIG", ENV_PREFIX))
            .map(Some);
    }

    if let Some(content) = env.get("CONFIG_CONTENT") {
        let config: RuntimeConfig = toml::from_str(&content)
            .context("Failed to parse inline config from CAMPAIGN2PARQUET_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in &["./config.toml", "./.campaign2parquet.toml"] {
        let path = Path::new(path);
        if path.exists() {
            return read_toml(path).map(Some);
        }
    }

    Ok(None)
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let file_config = read_toml(path.as_ref())?;

    let mut config = RuntimeConfig::default();
    config.merge(file_config);

    config.apply_env_overrides_from(&StdEnvSource)?;

    config.validate()?;
    Ok(config)
}

/// Load configuration from the environment, falling back to defaults when no
/// config file exists at the default locations.
pub fn load_or_default() -> Result<RuntimeConfig> {
    resolve(&StdEnvSource)
}

fn resolve<E: EnvSource>(env: &E) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::default();

    if let Some(file_config) = load_from_file(env)? {
        config.merge(file_config);
    }

    config.apply_env_overrides_from(env)?;

    config.validate()?;
    Ok(config)
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}
