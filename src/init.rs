// Initialization utilities
//
// Storage operator and logging/tracing setup

use anyhow::{Context, Result};
use campaign2parquet_config::{LogFormat, RuntimeConfig, StorageBackend};
use opendal::Operator;
use tracing::{info, Subscriber};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Build the storage operator from RuntimeConfig
pub fn init_storage(config: &RuntimeConfig) -> Result<Operator> {
    info!(
        "Initializing storage with backend: {}",
        config.storage.backend
    );

    match config.storage.backend {
        StorageBackend::Fs => {
            if let Some(fs) = config.storage.fs.as_ref() {
                info!("Using filesystem storage at: {}", fs.path);
            }
        }
        StorageBackend::S3 => {
            if let Some(s3) = config.storage.s3.as_ref() {
                info!(
                    "Using S3 storage: bucket={}, region={}",
                    s3.bucket, s3.region
                );
            }
        }
    }

    campaign2parquet_writer::build_operator(&config.storage)
        .context("Failed to initialize storage")
}

/// Initialize tracing/logging from RuntimeConfig
pub fn init_tracing(config: &RuntimeConfig) {
    use tracing_subscriber::{prelude::*, EnvFilter};

    // Parse log level from config
    let env_filter =
        EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs stay on stderr in both formats; stdout carries only the run summary.
    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(log_layer(config.log.format, std::io::stderr));

    // Try to set the global subscriber; ignore error if already set (idempotent)
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn log_layer<S, W>(format: LogFormat, writer: W) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
        LogFormat::Text => fmt::layer().with_writer(writer).boxed(),
    }
}
