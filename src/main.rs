use anyhow::{Context, Result};
use clap::Parser;
use sales2parquet_config::ConfigOverrides;
use std::path::PathBuf;

/// Batch job turning catalogued raw sales records into date-partitioned Parquet
#[derive(Parser)]
#[command(name = "sales2parquet")]
#[command(version)]
#[command(about = "Batch job turning catalogued raw sales records into date-partitioned Parquet", long_about = None)]
struct Cli {
    /// Job name used in logs and the run summary
    #[arg(long = "JOB_NAME", value_name = "NAME")]
    job_name: Option<String>,

    /// Bucket receiving the Parquet output
    #[arg(long = "output_s3_bucket_name", value_name = "BUCKET")]
    output_bucket: Option<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let overrides = ConfigOverrides {
        job_name: cli.job_name,
        output_bucket: cli.output_bucket,
        log_level: cli.log_level,
    };

    let config = sales2parquet::load_config(cli.config.as_deref(), &overrides)
        .context("Failed to load configuration")?;

    sales2parquet::init_tracing(&config.logging);

    let summary = sales2parquet::run_with_config(config).await?;
    tracing::info!(
        job = %summary.job_name,
        run_id = %summary.run_id,
        rows_read = summary.rows_read,
        rows_dropped = summary.rows_dropped,
        invalid_timestamps = summary.invalid_timestamps,
        rows_written = summary.rows_written,
        partitions = ?summary.partitions,
        "Run summary"
    );
    for file in &summary.files {
        tracing::debug!(path = %file.path, rows = file.rows, bytes = file.bytes, "output file");
    }

    Ok(())
}
