use anyhow::{Context, Result};
use campaign2parquet::{ErrorKind, RunFailure, RuntimeConfig};
use campaign2parquet_config::{FlattenMode, MalformedRowPolicy};
use campaign2parquet_writer::WriterError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Flatten, join and date-partition campaign progress data into Parquet
#[derive(Parser)]
#[command(name = "campaign2parquet")]
#[command(version)]
#[command(about = "Flatten, join and date-partition campaign progress data into Parquet", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Catalog database holding both input tables (overrides config file)
    #[arg(short, long, value_name = "NAME", global = true)]
    database: Option<String>,

    /// Output base path; partitions land under <PATH>/partitioned/
    #[arg(short, long, value_name = "PATH", global = true)]
    output: Option<String>,

    /// Array flattening: inner drops parents with empty arrays, outer keeps them
    #[arg(long, value_name = "MODE", global = true)]
    flatten_mode: Option<FlattenMode>,

    /// Rows with a malformed createdAt: fail the run or skip them
    #[arg(long, value_name = "POLICY", global = true)]
    malformed_rows: Option<MalformedRowPolicy>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the batch job once (default if no subcommand given)
    Run,
    /// Print the resolved configuration as TOML
    ShowConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: [{}] {:#}", ErrorKind::InvalidConfig.code(), e);
            return ExitCode::from(ErrorKind::InvalidConfig.exit_code());
        }
    };

    let result = match cli.command {
        Some(Commands::ShowConfig) => show_config(&config),
        Some(Commands::Run) | None => run_job(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn load_config(cli: &Cli) -> Result<RuntimeConfig> {
    // Step 1: Load base configuration
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        RuntimeConfig::load_or_default().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, cli);

    // Step 3: Validate the final result
    config.validate()?;
    Ok(config)
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) {
    if let Some(database) = &cli.database {
        config.job.database = database.clone();
    }
    if let Some(output) = &cli.output {
        config.output.base_path = output.clone();
    }
    if let Some(mode) = cli.flatten_mode {
        config.transform.flatten_mode = mode;
    }
    if let Some(policy) = cli.malformed_rows {
        config.transform.malformed_rows = policy;
    }
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
}

fn show_config(config: &RuntimeConfig) -> Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn run_job(config: RuntimeConfig) -> Result<()> {
    campaign2parquet::init_tracing(&config);
    display_startup_info(&config);

    let report = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(campaign2parquet::run_with_config(&config))?;

    println!(
        "Committed run {}: {} rows in {} partitions under {}/partitioned/",
        report.run_id,
        report.write.total_rows,
        report.write.partitions.len(),
        config.output.base_path.trim_end_matches('/')
    );
    Ok(())
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    if let Some(failure) = err.downcast_ref::<RunFailure>() {
        return failure.exit_code();
    }
    if let Some(writer) = err.downcast_ref::<WriterError>() {
        return ErrorKind::from(writer.code()).exit_code();
    }
    ErrorKind::Internal.exit_code()
}

fn display_startup_info(config: &RuntimeConfig) {
    use campaign2parquet_config::StorageBackend;
    use tracing::info;

    info!("╭─────────────────────────────────────────────────");
    info!("│ campaign2parquet v{}", env!("CARGO_PKG_VERSION"));
    info!("├─────────────────────────────────────────────────");
    info!("│ Database: {}", config.job.database);
    info!(
        "│ Tables: {} ⋈ {}",
        config.job.user_campaign_table, config.job.campaign_info_table
    );
    info!("│ Output: {}/partitioned/", config.output.base_path);
    info!("│ Storage backend: {}", config.storage.backend);

    match config.storage.backend {
        StorageBackend::Fs => {
            if let Some(fs) = &config.storage.fs {
                info!("│ Storage root: {}", fs.path);
            }
        }
        StorageBackend::S3 => {
            if let Some(s3) = &config.storage.s3 {
                info!("│ S3 bucket: {}", s3.bucket);
                info!("│ S3 region: {}", s3.region);
            }
        }
    }

    info!("│ Flatten mode: {}", config.transform.flatten_mode);
    info!("│ Malformed rows: {}", config.transform.malformed_rows);
    info!("│ Log level: {}", config.log.level);
    info!("╰─────────────────────────────────────────────────");
}
